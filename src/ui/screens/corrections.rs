use crate::app::CorrectionsFocus;
use crate::logic::corrections::{CorrectionPlan, CorrectionProgress};
use crate::logic::rates::OptionFilter;
use crate::models::{FertilizerOption, Nutrient, SelectionSet};
use crate::ui::components::level_gauge;
use crate::ui::{truncate, Theme};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget, Wrap},
};

pub struct CorrectionsScreen<'a> {
    pub plan: &'a CorrectionPlan<'a>,
    pub options: &'a [FertilizerOption],
    pub selections: &'a SelectionSet,
    pub progress: Option<&'a CorrectionProgress>,
    pub filter: &'a OptionFilter,
    pub max_excess_percent: f64,
    pub selected_correction: usize,
    pub selected_option: usize,
    pub focus: CorrectionsFocus,
    pub searching: bool,
    pub status_message: Option<&'a str>,
}

impl<'a> CorrectionsScreen<'a> {
    pub fn new(
        plan: &'a CorrectionPlan<'a>,
        options: &'a [FertilizerOption],
        selections: &'a SelectionSet,
        filter: &'a OptionFilter,
    ) -> Self {
        Self {
            plan,
            options,
            selections,
            progress: None,
            filter,
            max_excess_percent: 25.0,
            selected_correction: 0,
            selected_option: 0,
            focus: CorrectionsFocus::Deficiencies,
            searching: false,
            status_message: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<&'a CorrectionProgress>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_selection(mut self, correction: usize, option: usize) -> Self {
        self.selected_correction = correction;
        self.selected_option = option;
        self
    }

    pub fn with_focus(mut self, focus: CorrectionsFocus, searching: bool) -> Self {
        self.focus = focus;
        self.searching = searching;
        self
    }

    pub fn with_max_excess(mut self, percent: f64) -> Self {
        self.max_excess_percent = percent;
        self
    }

    pub fn with_status(mut self, message: Option<&'a str>) -> Self {
        self.status_message = message;
        self
    }

    fn target(&self) -> Option<&'a Nutrient> {
        self.plan.get(self.selected_correction)
    }

    fn panel(&self, title: String, focused: bool) -> Block<'static> {
        let border = if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        };
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border)
    }
}

impl Widget for CorrectionsScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title
                Constraint::Min(12),   // Content
                Constraint::Length(1), // Status
                Constraint::Length(1), // Nav
            ])
            .split(area);

        let title = Line::from(vec![
            Span::styled("Corrections", Theme::title()),
            Span::styled(
                format!(
                    " ({} needed, max excess {:.0}%)",
                    self.plan.len(),
                    self.max_excess_percent
                ),
                Theme::dim(),
            ),
        ]);
        Paragraph::new(title).render(chunks[0], buf);

        let content = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
            .split(chunks[1]);
        self.render_deficiencies(content[0], buf);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Progress
                Constraint::Length(5), // Selected products
                Constraint::Min(5),    // Options
                Constraint::Length(8), // Details
            ])
            .split(content[1]);
        self.render_progress(right[0], buf);
        self.render_selections(right[1], buf);
        self.render_options(right[2], buf);
        self.render_details(right[3], buf);

        if let Some(message) = self.status_message {
            Paragraph::new(Span::styled(message, Theme::warning())).render(chunks[2], buf);
        }

        let nav = if self.searching {
            Line::from(vec![
                Span::styled("[Enter/Esc]", Theme::nav_key()),
                Span::styled("Done ", Theme::nav_label()),
            ])
        } else {
            Line::from(vec![
                Span::styled("[↑↓]", Theme::nav_key()),
                Span::styled("Navigate ", Theme::nav_label()),
                Span::styled("[Tab]", Theme::nav_key()),
                Span::styled("Focus ", Theme::nav_label()),
                Span::styled("[Enter]", Theme::nav_key()),
                Span::styled("Add ", Theme::nav_label()),
                Span::styled("[+/-]", Theme::nav_key()),
                Span::styled("Rate ", Theme::nav_label()),
                Span::styled("[d]", Theme::nav_key()),
                Span::styled("Remove ", Theme::nav_label()),
                Span::styled("[f]", Theme::nav_key()),
                Span::styled("Release ", Theme::nav_label()),
                Span::styled("[/]", Theme::nav_key()),
                Span::styled("Search ", Theme::nav_label()),
                Span::styled("[Esc]", Theme::nav_key()),
                Span::styled("Back", Theme::nav_label()),
            ])
        };
        Paragraph::new(nav).render(chunks[3], buf);
    }
}

impl CorrectionsScreen<'_> {
    fn render_deficiencies(&self, area: Rect, buf: &mut Buffer) {
        let block = self.panel(
            "Deficiencies".to_string(),
            self.focus == CorrectionsFocus::Deficiencies,
        );
        let inner = block.inner(area);
        block.render(area, buf);

        if self.plan.is_empty() {
            Paragraph::new(Span::styled("No deficiencies to correct", Theme::success()))
                .render(inner, buf);
            return;
        }

        let mut items = Vec::new();
        for (i, nutrient) in self.plan.all().enumerate() {
            if i == self.plan.main.len() {
                items.push(ListItem::new(Span::styled("Secondary", Theme::dim())));
            }
            let style = if i == self.selected_correction {
                Theme::selected()
            } else {
                Style::default()
            };
            let picked = self.selections.slot_count(&nutrient.name);
            let mut spans = vec![
                Span::styled("▼ ", Theme::status(nutrient.status)),
                Span::styled(truncate(&nutrient.name, 24), Theme::normal()),
            ];
            if picked > 0 {
                spans.push(Span::styled(format!(" ({})", picked), Theme::success()));
            }
            items.push(ListItem::new(Line::from(spans)).style(style));
        }

        List::new(items).render(inner, buf);
    }

    fn render_progress(&self, area: Rect, buf: &mut Buffer) {
        let (Some(progress), Some(target)) = (self.progress, self.target()) else {
            Paragraph::new(Span::styled("No ideal level to correct towards", Theme::dim()))
                .block(self.panel("Progress".to_string(), false))
                .render(area, buf);
            return;
        };

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area);

        let scale = progress.scale();
        let unit = target.unit.as_str();
        let new_color = if progress.within_band {
            Theme::OPTIMAL
        } else {
            Theme::deviation_color(progress.deviation_percent)
        };

        level_gauge("Original", progress.current, scale, progress.target, unit)
            .color(target.status.color())
            .render(cols[0], buf);
        level_gauge("New Level", progress.new_level, scale, progress.target, unit)
            .color(new_color)
            .render(cols[1], buf);
        level_gauge("Requirement", progress.requirement, scale, progress.target, unit)
            .color(Theme::WARNING)
            .render(cols[2], buf);
        level_gauge("Target", progress.target, scale, progress.target, unit)
            .color(Theme::TARGET)
            .render(cols[3], buf);
    }

    fn render_selections(&self, area: Rect, buf: &mut Buffer) {
        let block = self.panel("Selected Products".to_string(), false);
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(target) = self.target() else {
            return;
        };
        let items: Vec<ListItem> = self
            .selections
            .for_nutrient(&target.name)
            .map(|(_, selection)| {
                ListItem::new(Line::from(vec![
                    Span::styled(truncate(&selection.fert_label, 40), Theme::normal()),
                    Span::styled(format!("  {:.1} kg/ha", selection.rate), Theme::highlight()),
                ]))
            })
            .collect();

        if items.is_empty() {
            Paragraph::new(Span::styled(
                "Press Enter on an option to add it",
                Theme::dim(),
            ))
            .render(inner, buf);
            return;
        }
        List::new(items).render(inner, buf);
    }

    fn render_options(&self, area: Rect, buf: &mut Buffer) {
        let mut title = format!(
            "Options [{}]",
            self.filter.release.map(|r| r.as_str()).unwrap_or("All")
        );
        if self.searching || !self.filter.search.is_empty() {
            let cursor = if self.searching { "_" } else { "" };
            title.push_str(&format!(" search: {}{}", self.filter.search, cursor));
        }
        let block = self.panel(title, self.focus == CorrectionsFocus::Options);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.options.is_empty() {
            Paragraph::new(Span::styled("No matching products", Theme::dim())).render(inner, buf);
            return;
        }

        // Keep the highlighted option on screen
        let visible = inner.height as usize;
        let skip = (self.selected_option + 1).saturating_sub(visible);

        let items: Vec<ListItem> = self
            .options
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, option)| {
                let style = if i == self.selected_option && self.focus == CorrectionsFocus::Options
                {
                    Theme::selected()
                } else {
                    Style::default()
                };
                let priority_style = Style::default().fg(option.priority.color());
                let rate = if option.rate() > 0.0 {
                    format!("{:>8.1} kg/ha", option.rate())
                } else {
                    "   no safe rate".to_string()
                };
                let mut spans = vec![
                    Span::styled(format!("{} ", option.priority.symbol()), priority_style),
                    Span::styled(format!("{:<38}", truncate(&option.label, 38)), Theme::normal()),
                    Span::styled(rate, Theme::highlight()),
                ];
                if option.capped.is_capped() {
                    spans.push(Span::styled(" capped", Theme::warning()));
                }
                ListItem::new(Line::from(spans)).style(style)
            })
            .collect();

        List::new(items).render(inner, buf);
    }

    fn render_details(&self, area: Rect, buf: &mut Buffer) {
        let block = self.panel("Details".to_string(), false);
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(option) = self.options.get(self.selected_option) else {
            return;
        };

        let mut lines = vec![Line::from(vec![
            Span::styled(&option.label, Theme::header()),
            Span::styled(
                format!("  {}", option.priority),
                Style::default().fg(option.priority.color()),
            ),
        ])];
        lines.push(Line::from(Span::styled(&option.explanation, Theme::normal())));
        for point in &option.data_points {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}: ", point.label), Theme::dim()),
                Span::styled(&point.value, Theme::highlight()),
            ]));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .render(inner, buf);
    }
}
