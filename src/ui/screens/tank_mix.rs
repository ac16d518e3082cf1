use crate::models::TankMix;
use crate::ui::{truncate, Theme};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Widget},
};

pub struct TankMixScreen<'a> {
    pub tank_mix: &'a TankMix,
    pub unassigned: Vec<&'a str>,
    pub selected_index: usize,
    pub status_message: Option<&'a str>,
}

impl<'a> TankMixScreen<'a> {
    pub fn new(tank_mix: &'a TankMix) -> Self {
        Self {
            tank_mix,
            unassigned: Vec::new(),
            selected_index: 0,
            status_message: None,
        }
    }

    /// Selected products not yet placed in any step.
    pub fn with_unassigned(mut self, products: Vec<&'a str>) -> Self {
        self.unassigned = products;
        self
    }

    pub fn with_selection(mut self, index: usize) -> Self {
        self.selected_index = index;
        self
    }

    pub fn with_status(mut self, message: Option<&'a str>) -> Self {
        self.status_message = message;
        self
    }
}

impl Widget for TankMixScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(6),    // Steps
                Constraint::Length(3), // Unassigned
                Constraint::Length(1), // Status
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("Tank Mixing Sequence", Theme::title()),
            Span::styled(format!(" ({} steps)", self.tank_mix.len()), Theme::dim()),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        self.render_table(chunks[1], buf);

        let unassigned = if self.unassigned.is_empty() {
            Span::styled("All selected products are in the mix", Theme::dim())
        } else {
            Span::styled(self.unassigned.join(", "), Theme::warning())
        };
        Paragraph::new(unassigned)
            .block(
                Block::default()
                    .title("Not yet mixed")
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .render(chunks[2], buf);

        if let Some(message) = self.status_message {
            Paragraph::new(Span::styled(message, Theme::warning())).render(chunks[3], buf);
        }

        let nav = Line::from(vec![
            Span::styled("[a]", Theme::nav_key()),
            Span::styled("Add ", Theme::nav_label()),
            Span::styled("[d]", Theme::nav_key()),
            Span::styled("Delete ", Theme::nav_label()),
            Span::styled("[Enter]", Theme::nav_key()),
            Span::styled("Form ", Theme::nav_label()),
            Span::styled("[p]", Theme::nav_key()),
            Span::styled("Add Product ", Theme::nav_label()),
            Span::styled("[K/J]", Theme::nav_key()),
            Span::styled("Move ", Theme::nav_label()),
            Span::styled("[↑↓]", Theme::nav_key()),
            Span::styled("Navigate ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Back", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[4], buf);
    }
}

impl TankMixScreen<'_> {
    fn render_table(&self, area: Rect, buf: &mut Buffer) {
        let header = Row::new(
            ["#", "Product Form", "Products", "Notes"]
                .iter()
                .map(|h| Cell::from(*h).style(Theme::header())),
        );

        let rows: Vec<Row> = self
            .tank_mix
            .items()
            .iter()
            .map(|item| {
                let products = if item.products.is_empty() {
                    Cell::from("-").style(Theme::dim())
                } else {
                    Cell::from(truncate(&item.products.join(", "), 40))
                };
                Row::new(vec![
                    Cell::from(item.sequence.to_string()),
                    Cell::from(item.product_description.as_str()),
                    products,
                    Cell::from(truncate(&item.notes, 50)).style(Theme::dim()),
                ])
                .style(Theme::normal())
            })
            .collect();

        let widths = [
            Constraint::Length(3),
            Constraint::Length(26),
            Constraint::Percentage(35),
            Constraint::Min(20),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .row_highlight_style(Theme::selected());

        let mut state = TableState::default();
        if !self.tank_mix.is_empty() {
            state.select(Some(self.selected_index));
        }
        ratatui::widgets::StatefulWidget::render(table, area, buf, &mut state);
    }
}
