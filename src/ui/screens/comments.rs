use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

pub struct CommentsScreen<'a> {
    pub comments: Option<&'a str>,
    pub scroll: u16,
    pub pending: bool,
    pub status_message: Option<&'a str>,
}

impl<'a> CommentsScreen<'a> {
    pub fn new(comments: Option<&'a str>) -> Self {
        Self {
            comments,
            scroll: 0,
            pending: false,
            status_message: None,
        }
    }

    pub fn with_scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn with_pending(mut self, pending: bool) -> Self {
        self.pending = pending;
        self
    }

    pub fn with_status(mut self, message: Option<&'a str>) -> Self {
        self.status_message = message;
        self
    }
}

impl Widget for CommentsScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(5),    // Text
                Constraint::Length(1), // Status
                Constraint::Length(1), // Nav
            ])
            .split(area);

        Paragraph::new(Span::styled("General Comments", Theme::title())).render(chunks[0], buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let body = match (self.comments, self.pending) {
            (_, true) => Paragraph::new(Span::styled("Generating comments...", Theme::dim())),
            (Some(text), false) => {
                let lines: Vec<Line> = text
                    .lines()
                    .map(|l| Line::from(Span::styled(l, Theme::normal())))
                    .collect();
                Paragraph::new(lines)
                    .wrap(Wrap { trim: false })
                    .scroll((self.scroll, 0))
            }
            (None, false) => Paragraph::new(Span::styled(
                "Press g to generate comments for this paddock",
                Theme::dim(),
            )),
        };
        body.block(block).render(chunks[1], buf);

        if let Some(message) = self.status_message {
            Paragraph::new(Span::styled(message, Theme::warning())).render(chunks[2], buf);
        }

        let nav = Line::from(vec![
            Span::styled("[g]", Theme::nav_key()),
            Span::styled("Generate ", Theme::nav_label()),
            Span::styled("[e]", Theme::nav_key()),
            Span::styled("Export ", Theme::nav_label()),
            Span::styled("[↑↓]", Theme::nav_key()),
            Span::styled("Scroll ", Theme::nav_label()),
            Span::styled("[Esc]", Theme::nav_key()),
            Span::styled("Back", Theme::nav_label()),
        ]);
        Paragraph::new(nav).render(chunks[3], buf);
    }
}
