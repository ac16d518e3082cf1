use crate::ui::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

pub struct GaugeWidget<'a> {
    title: &'a str,
    value: Option<f64>,
    unit: &'a str,
    min: f64,
    max: f64,
    thresholds: Vec<(f64, Color)>,
    color: Option<Color>,
    marker: Option<f64>,
    precision: usize,
}

impl<'a> GaugeWidget<'a> {
    pub fn new(title: &'a str, value: Option<f64>, unit: &'a str) -> Self {
        Self {
            title,
            value,
            unit,
            min: 0.0,
            max: 100.0,
            thresholds: Vec::new(),
            color: None,
            marker: None,
            precision: 1,
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn thresholds(mut self, thresholds: Vec<(f64, Color)>) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Fixed bar color, overriding thresholds.
    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    /// Draw a marker at `value` on the bar.
    pub fn marker(mut self, value: f64) -> Self {
        self.marker = Some(value);
        self
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    fn get_color(&self, value: f64) -> Color {
        if let Some(color) = self.color {
            return color;
        }
        for (threshold, color) in self.thresholds.iter().rev() {
            if value >= *threshold {
                return *color;
            }
        }
        Theme::FG
    }

    fn ratio(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }
}

impl Widget for GaugeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 3 || area.width < 10 {
            return;
        }

        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Theme::border());

        let inner = block.inner(area);
        block.render(area, buf);

        let Some(value) = self.value else {
            Paragraph::new(Line::from(Span::styled("N/A", Theme::dim()))).render(inner, buf);
            return;
        };

        let color = self.get_color(value);
        let value_str = format!("{:.prec$} {}", value, self.unit, prec = self.precision);
        Paragraph::new(Line::from(Span::styled(value_str, Style::default().fg(color))))
            .render(inner, buf);

        if inner.height < 2 {
            return;
        }
        let y = inner.y + 1;
        let filled = (inner.width as f64 * self.ratio(value)) as u16;
        for x in inner.x..inner.x + inner.width {
            let ch = if x < inner.x + filled { '█' } else { '░' };
            buf[(x, y)].set_char(ch).set_fg(color);
        }

        if let Some(marker) = self.marker {
            let offset = (inner.width.saturating_sub(1) as f64 * self.ratio(marker)) as u16;
            buf[(inner.x + offset, y)]
                .set_char('│')
                .set_fg(Theme::TARGET);
        }
    }
}

/// Nutrient level against a fixed scale, with the target marked.
pub fn level_gauge<'a>(
    title: &'a str,
    value: f64,
    scale: f64,
    target: f64,
    unit: &'a str,
) -> GaugeWidget<'a> {
    GaugeWidget::new(title, Some(value), unit)
        .range(0.0, scale)
        .marker(target)
        .precision(2)
}

/// 0-100 score, red through green.
pub fn score_gauge(title: &str, value: Option<f64>) -> GaugeWidget<'_> {
    GaugeWidget::new(title, value, "/ 100")
        .range(0.0, 100.0)
        .precision(0)
        .thresholds(vec![
            (0.0, Theme::ERROR),
            (40.0, Theme::WARNING),
            (80.0, Theme::SUCCESS),
        ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_pick_highest_reached() {
        let gauge = score_gauge("Score", Some(55.0));
        assert_eq!(gauge.get_color(10.0), Theme::ERROR);
        assert_eq!(gauge.get_color(55.0), Theme::WARNING);
        assert_eq!(gauge.get_color(95.0), Theme::SUCCESS);
    }

    #[test]
    fn ratio_is_clamped_and_safe_on_empty_range() {
        let gauge = level_gauge("Calcium", 900.0, 2000.0, 1520.0, "ppm");
        assert_eq!(gauge.ratio(1000.0), 0.5);
        assert_eq!(gauge.ratio(5000.0), 1.0);
        assert_eq!(GaugeWidget::new("x", None, "").range(1.0, 1.0).ratio(3.0), 0.0);
    }

    #[test]
    fn renders_bar_and_marker() {
        let area = Rect::new(0, 0, 22, 4);
        let mut buf = Buffer::empty(area);
        level_gauge("Ca", 10.0, 20.0, 20.0, "ppm")
            .color(Theme::OPTIMAL)
            .render(area, &mut buf);
        // 20 inner columns, half filled, marker at the far end
        assert_eq!(buf[(1, 2)].symbol(), "█");
        assert_eq!(buf[(15, 2)].symbol(), "░");
        assert_eq!(buf[(20, 2)].symbol(), "│");
    }
}
