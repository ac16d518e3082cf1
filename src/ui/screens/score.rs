use crate::logic::scoring::{HealthScore, LeafBand};
use crate::ui::components::score_gauge;
use crate::ui::{truncate, Theme};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Widget},
};

pub struct ScoreScreen<'a> {
    pub health: &'a HealthScore,
    pub paddock_name: &'a str,
}

impl<'a> ScoreScreen<'a> {
    pub fn new(health: &'a HealthScore, paddock_name: &'a str) -> Self {
        Self {
            health,
            paddock_name,
        }
    }
}

impl Widget for ScoreScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Length(4), // Overall
                Constraint::Min(6),    // Per nutrient
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("Plant Health Score", Theme::title()),
            Span::styled(format!(" {}", self.paddock_name), Theme::dim()),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        let overall = (!self.health.scores.is_empty()).then_some(self.health.overall);
        score_gauge("Overall", overall).render(top[0], buf);

        let stars = self.health.stars;
        let rating = vec![
            Line::from(Span::styled(
                stars.to_string(),
                Style::default().fg(stars.color()),
            )),
            Line::from(Span::styled(stars.label(), Theme::header())),
        ];
        Paragraph::new(rating)
            .block(
                Block::default()
                    .title("Rating")
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .render(top[1], buf);

        self.render_scores(chunks[2], buf);

        let nav = Line::from(vec![
            Span::styled("[1-6]", Theme::nav_key()),
            Span::styled("Screens ", Theme::nav_label()),
            Span::styled("[[ ]]", Theme::nav_key()),
            Span::styled("Paddock ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Back", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl ScoreScreen<'_> {
    fn render_scores(&self, area: Rect, buf: &mut Buffer) {
        let header = Row::new(
            ["Nutrient", "Deviation", "Band", "Score"]
                .iter()
                .map(|h| Cell::from(*h).style(Theme::header())),
        );

        let rows: Vec<Row> = self
            .health
            .scores
            .iter()
            .map(|s| {
                let band = LeafBand::classify(s.deviation_percent);
                Row::new(vec![
                    Cell::from(truncate(&s.name, 34)),
                    Cell::from(format!("{:+.1}%", s.deviation_percent))
                        .style(Style::default().fg(Theme::deviation_color(s.deviation_percent))),
                    Cell::from(band.as_str()).style(Style::default().fg(band.color())),
                    Cell::from(format!("{:.0}", s.score))
                        .style(Style::default().fg(Theme::score_color(s.score))),
                ])
            })
            .collect();

        let widths = [
            Constraint::Min(20),
            Constraint::Length(11),
            Constraint::Length(20),
            Constraint::Length(6),
        ];

        Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .title(format!("{} scored nutrients", self.health.scores.len()))
                    .borders(Borders::ALL)
                    .border_style(Theme::border()),
            )
            .render(area, buf);
    }
}
