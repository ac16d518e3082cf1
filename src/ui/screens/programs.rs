use crate::models::{ProgramKind, Programs};
use crate::ui::{truncate, Theme};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Widget},
};

/// Product being composed before it is added.
pub struct ProgramDraft<'a> {
    pub product: Option<&'a str>,
    pub rate: f64,
    pub unit: &'a str,
}

pub struct ProgramsScreen<'a> {
    pub programs: &'a Programs,
    pub kind: ProgramKind,
    pub draft: ProgramDraft<'a>,
    pub selected_index: usize,
    pub status_message: Option<&'a str>,
}

impl<'a> ProgramsScreen<'a> {
    pub fn new(programs: &'a Programs, kind: ProgramKind, draft: ProgramDraft<'a>) -> Self {
        Self {
            programs,
            kind,
            draft,
            selected_index: 0,
            status_message: None,
        }
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

impl Widget for ProgramsScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Tabs
                Constraint::Min(6),    // Items
                Constraint::Length(3), // Draft
                Constraint::Length(1), // Status
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let mut tabs = Vec::new();
        for kind in ProgramKind::ALL {
            let style = if kind == self.kind {
                Theme::title()
            } else {
                Theme::dim()
            };
            let count = self.programs.get(kind).len();
            tabs.push(Span::styled(format!(" {} ({}) ", kind.title(), count), style));
        }
        Paragraph::new(Line::from(tabs)).render(chunks[0], buf);

        self.render_table(chunks[1], buf);

        let draft = match self.draft.product {
            Some(product) => Line::from(vec![
                Span::styled(truncate(product, 40), Theme::normal()),
                Span::styled(
                    format!("  {} {}", self.draft.rate, self.draft.unit),
                    Theme::highlight(),
                ),
            ]),
            None => Line::from(Span::styled("No products in the catalog", Theme::dim())),
        };
        Paragraph::new(draft)
            .block(
                Block::default()
                    .title("New product")
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .render(chunks[2], buf);

        if let Some(message) = self.status_message {
            Paragraph::new(Span::styled(message, Theme::warning())).render(chunks[3], buf);
        }

        let nav = Line::from(vec![
            Span::styled("[Tab]", Theme::nav_key()),
            Span::styled("Program ", Theme::nav_label()),
            Span::styled("[←→]", Theme::nav_key()),
            Span::styled("Product ", Theme::nav_label()),
            Span::styled("[+/-]", Theme::nav_key()),
            Span::styled("Rate ", Theme::nav_label()),
            Span::styled("[u]", Theme::nav_key()),
            Span::styled("Unit ", Theme::nav_label()),
            Span::styled("[Enter]", Theme::nav_key()),
            Span::styled("Add ", Theme::nav_label()),
            Span::styled("[d]", Theme::nav_key()),
            Span::styled("Delete ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Back", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[4], buf);
    }
}

impl ProgramsScreen<'_> {
    fn render_table(&self, area: Rect, buf: &mut Buffer) {
        let header = Row::new(
            ["Product", "Rate", "Nutrients"]
                .iter()
                .map(|h| Cell::from(*h).style(Theme::header())),
        );

        let program = self.programs.get(self.kind);
        let rows: Vec<Row> = program
            .items()
            .iter()
            .map(|item| {
                let nutrients = item
                    .nutrient_content
                    .iter()
                    .map(|(element, percent)| format!("{}: {}%", element.abbrev(), percent))
                    .collect::<Vec<_>>()
                    .join(", ");
                Row::new(vec![
                    Cell::from(truncate(&item.product, 40)),
                    Cell::from(format!("{} {}", item.rate, item.unit)),
                    Cell::from(truncate(&nutrients, 50)).style(Theme::dim()),
                ])
                .style(Theme::normal())
            })
            .collect();

        let widths = [
            Constraint::Percentage(40),
            Constraint::Length(22),
            Constraint::Min(20),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .title(self.kind.title())
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .row_highlight_style(Theme::selected());

        let mut state = TableState::default();
        if !program.is_empty() {
            state.select(Some(self.selected_index));
        }
        ratatui::widgets::StatefulWidget::render(table, area, buf, &mut state);
    }
}
