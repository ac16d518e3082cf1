use crate::app::PaddockReport;
use crate::logic::ratios::RatioReading;
use crate::ui::{truncate, Theme};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, TableState, Widget},
};

pub struct NutrientsScreen<'a> {
    pub paddock: Option<&'a PaddockReport>,
    pub ratios: &'a [RatioReading],
    pub position: (usize, usize),
    pub selected_index: usize,
    pub status_message: Option<&'a str>,
    pub pdf_input: Option<&'a str>,
}

impl<'a> NutrientsScreen<'a> {
    pub fn new(paddock: Option<&'a PaddockReport>, ratios: &'a [RatioReading]) -> Self {
        Self {
            paddock,
            ratios,
            position: (0, 0),
            selected_index: 0,
            status_message: None,
            pdf_input: None,
        }
    }

    /// Current paddock index and paddock count.
    pub fn with_position(mut self, current: usize, total: usize) -> Self {
        self.position = (current, total);
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

    pub fn with_pdf_input(mut self, input: Option<&'a str>) -> Self {
        self.pdf_input = input;
        self
    }
}

impl Widget for NutrientsScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(10),   // Content
                Constraint::Length(1), // Status
                Constraint::Length(1), // Nav
            ])
            .split(area);

        self.render_header(chunks[0], buf);

        match self.paddock {
            Some(paddock) => {
                let content = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
                    .split(chunks[1]);
                self.render_table(paddock, content[0], buf);
                self.render_ratios(content[1], buf);
            }
            None => {
                let lines = vec![
                    Line::from(Span::styled("No report loaded", Theme::header())),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Press o to upload a soil or leaf test PDF, or open a saved",
                        Theme::dim(),
                    )),
                    Line::from(Span::styled(
                        "extraction with `soilcorrect tui report.json`.",
                        Theme::dim(),
                    )),
                ];
                Paragraph::new(lines)
                    .block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(Theme::border()),
                    )
                    .render(chunks[1], buf);
            }
        }

        if let Some(input) = self.pdf_input {
            let prompt = Line::from(vec![
                Span::styled("PDF path: ", Theme::highlight()),
                Span::styled(format!("{}_", input), Theme::normal()),
            ]);
            Paragraph::new(prompt).render(chunks[2], buf);
        } else if let Some(message) = self.status_message {
            Paragraph::new(Span::styled(message, Theme::warning())).render(chunks[2], buf);
        }

        let nav = Line::from(vec![
            Span::styled("[o]", Theme::nav_key()),
            Span::styled("Open PDF ", Theme::nav_label()),
            Span::styled("[↑↓]", Theme::nav_key()),
            Span::styled("Navigate ", Theme::nav_label()),
            Span::styled("[[ ]]", Theme::nav_key()),
            Span::styled("Paddock ", Theme::nav_label()),
            Span::styled("[1-6]", Theme::nav_key()),
            Span::styled("Screens ", Theme::nav_label()),
            Span::styled("[q]", Theme::nav_key()),
            Span::styled("Quit", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl NutrientsScreen<'_> {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(Span::styled("Nutrients", Theme::title()))
            .borders(Borders::BOTTOM)
            .border_style(Theme::border());

        let mut spans = Vec::new();
        if let Some(paddock) = self.paddock {
            spans.push(Span::styled(paddock.display_name(), Theme::header()));
            if let Some(crop) = &paddock.info.crop {
                spans.push(Span::styled(format!("  Crop: {}", crop), Theme::dim()));
            }
            if let Some(date) = &paddock.info.sample_date {
                spans.push(Span::styled(format!("  Sampled: {}", date), Theme::dim()));
            }
            let (current, total) = self.position;
            if total > 1 {
                spans.push(Span::styled(
                    format!("  ({}/{})", current + 1, total),
                    Theme::dim(),
                ));
            }
        }

        Paragraph::new(Line::from(spans)).block(block).render(area, buf);
    }

    fn render_table(&self, paddock: &PaddockReport, area: Rect, buf: &mut Buffer) {
        let header_cells = ["Nutrient", "Current", "Ideal", "Unit", "Dev %", "Status"]
            .iter()
            .map(|h| Cell::from(*h).style(Theme::header()));
        let header = Row::new(header_cells).height(1);

        let rows: Vec<Row> = paddock
            .profile
            .nutrients
            .iter()
            .map(|n| {
                let status_style = Theme::status(n.status);
                let deviation = match n.deviation_percent() {
                    Some(d) => Cell::from(format!("{:+.0}", d))
                        .style(Style::default().fg(Theme::deviation_color(d))),
                    None => Cell::from("-").style(Theme::dim()),
                };
                Row::new(vec![
                    Cell::from(truncate(&n.name, 34)),
                    Cell::from(format!("{:.2}", n.current)),
                    Cell::from(
                        n.ideal
                            .map(|i| format!("{:.2}", i))
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    Cell::from(n.unit.as_str()).style(Theme::dim()),
                    deviation,
                    Cell::from(n.status.as_str()).style(status_style),
                ])
                .style(Theme::normal())
            })
            .collect();

        let widths = [
            Constraint::Min(20),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(10),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .title(format!("{} readings", paddock.profile.nutrients.len()))
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .row_highlight_style(Theme::selected());

        let mut state = TableState::default();
        state.select(Some(self.selected_index));
        ratatui::widgets::StatefulWidget::render(table, area, buf, &mut state);
    }

    fn render_ratios(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title("Ratios")
            .borders(Borders::ALL)
            .border_style(Theme::border());
        let inner = block.inner(area);
        block.render(area, buf);

        let items: Vec<ListItem> = self
            .ratios
            .iter()
            .map(|ratio| {
                let (value, style) = match (ratio.value, ratio.status()) {
                    (Some(v), Some(status)) => (format!("{:.2}", v), Theme::status(status)),
                    (Some(v), None) => (format!("{:.2}", v), Theme::normal()),
                    (None, _) => ("-".to_string(), Theme::dim()),
                };
                let ideal = ratio
                    .ideal
                    .map(|i| format!(" (ideal {:.2})", i))
                    .unwrap_or_default();
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{:<7}", ratio.label), Theme::header()),
                    Span::styled(value, style),
                    Span::styled(ideal, Theme::dim()),
                ]))
            })
            .collect();

        List::new(items).render(inner, buf);
    }
}
