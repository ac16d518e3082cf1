use crate::models::NutrientStatus;
use ratatui::style::{Color, Modifier, Style};

pub struct Theme;

impl Theme {
    // Base colors
    pub const FG: Color = Color::White;
    pub const DIM: Color = Color::DarkGray;
    pub const ACCENT: Color = Color::Green;
    pub const HIGHLIGHT: Color = Color::Cyan;

    // Status colors
    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    // Nutrient colors
    pub const DEFICIENT: Color = Color::LightRed;
    pub const OPTIMAL: Color = Color::Green;
    pub const EXCESSIVE: Color = Color::LightBlue;
    pub const TARGET: Color = Color::Magenta;

    // Styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header() -> Style {
        Style::default().fg(Self::FG).add_modifier(Modifier::BOLD)
    }

    pub fn normal() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn dim() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn selected() -> Style {
        Style::default()
            .bg(Color::DarkGray)
            .fg(Self::FG)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    pub fn error() -> Style {
        Style::default().fg(Self::ERROR)
    }

    pub fn status(status: NutrientStatus) -> Style {
        Style::default().fg(status.color())
    }

    /// Signed deviation from ideal, in percent.
    pub fn deviation_color(deviation_percent: f64) -> Color {
        if deviation_percent < -25.0 {
            Self::DEFICIENT
        } else if deviation_percent > 25.0 {
            Self::EXCESSIVE
        } else {
            Self::OPTIMAL
        }
    }

    pub fn score_color(score: f64) -> Color {
        if score >= 80.0 {
            Self::SUCCESS
        } else if score >= 40.0 {
            Self::WARNING
        } else {
            Self::ERROR
        }
    }

    pub fn nav_key() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn nav_label() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::ACCENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deviation_bands() {
        assert_eq!(Theme::deviation_color(-40.0), Theme::DEFICIENT);
        assert_eq!(Theme::deviation_color(0.0), Theme::OPTIMAL);
        assert_eq!(Theme::deviation_color(25.0), Theme::OPTIMAL);
        assert_eq!(Theme::deviation_color(60.0), Theme::EXCESSIVE);
    }
}
