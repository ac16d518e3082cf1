use crate::models::nutrient::Element;
use serde::{Deserialize, Serialize};

/// Display ordering for catalog products offered against a deficiency.
/// Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionPriority {
    PhCompatible = 0,
    PhIncompatible = 1,
    Safe = 2,
    NoSafeRate = 3,
}

impl OptionPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionPriority::PhCompatible => "pH compatible",
            OptionPriority::PhIncompatible => "pH incompatible",
            OptionPriority::Safe => "Safe",
            OptionPriority::NoSafeRate => "No safe rate",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            OptionPriority::PhCompatible => Color::Green,
            OptionPriority::PhIncompatible => Color::Yellow,
            OptionPriority::Safe => Color::Cyan,
            OptionPriority::NoSafeRate => Color::Red,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            OptionPriority::PhCompatible => "✓",
            OptionPriority::PhIncompatible => "⚠",
            OptionPriority::Safe => "→",
            OptionPriority::NoSafeRate => "✗",
        }
    }
}

impl std::fmt::Display for OptionPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The constraint that bound a capped rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimitingConstraint {
    pub element: Element,
    pub current: f64,
    pub max_level: f64,
    /// Product rate at which `element` reaches `max_level`; may be negative.
    pub max_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CappedRate {
    pub uncapped: f64,
    pub rate: f64,
    pub limiting: Option<LimitingConstraint>,
}

impl CappedRate {
    pub fn uncapped(rate: f64) -> Self {
        Self {
            uncapped: rate,
            rate,
            limiting: None,
        }
    }

    pub fn is_capped(&self) -> bool {
        self.limiting.is_some()
    }

    pub fn is_safe(&self) -> bool {
        self.rate > 0.0
    }

    pub fn reason(&self) -> Option<String> {
        let limit = self.limiting?;
        if limit.current >= limit.max_level {
            Some(format!(
                "{} is already above its allowed maximum ({:.1} vs {:.1} ppm)",
                limit.element.labelled(),
                limit.current,
                limit.max_level
            ))
        } else {
            Some(format!(
                "Capped at {:.1} kg/ha to keep {} under {:.1} ppm",
                self.rate,
                limit.element.labelled(),
                limit.max_level
            ))
        }
    }
}

/// First element pushed over its allowed maximum by a candidate rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exceedance {
    pub element: Element,
    pub resulting_level: f64,
    pub max_level: f64,
    pub deviation_percent: f64,
}

impl std::fmt::Display for Exceedance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} would reach {:.1} ppm ({:+.0}% of ideal)",
            self.element.labelled(),
            self.resulting_level,
            self.deviation_percent
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: String,
}

impl DataPoint {
    pub fn new(label: &str, value: impl std::fmt::Display) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
        }
    }
}

/// A catalog product evaluated against one deficient nutrient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FertilizerOption {
    pub label: String,
    pub target: Element,
    pub priority: OptionPriority,
    pub ph_compatible: Option<bool>,
    pub capped: CappedRate,
    pub explanation: String,
    pub data_points: Vec<DataPoint>,
}

impl FertilizerOption {
    pub fn new(
        label: impl Into<String>,
        target: Element,
        priority: OptionPriority,
        capped: CappedRate,
    ) -> Self {
        Self {
            label: label.into(),
            target,
            priority,
            ph_compatible: None,
            capped,
            explanation: String::new(),
            data_points: Vec::new(),
        }
    }

    pub fn with_ph(mut self, ph_compatible: Option<bool>) -> Self {
        self.ph_compatible = ph_compatible;
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_data_point(mut self, label: &str, value: impl std::fmt::Display) -> Self {
        self.data_points.push(DataPoint::new(label, value));
        self
    }

    pub fn rate(&self) -> f64 {
        self.capped.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering() {
        let mut p = vec![
            OptionPriority::NoSafeRate,
            OptionPriority::Safe,
            OptionPriority::PhCompatible,
            OptionPriority::PhIncompatible,
        ];
        p.sort();
        assert_eq!(p[0], OptionPriority::PhCompatible);
        assert_eq!(p[3], OptionPriority::NoSafeRate);
        assert_eq!(OptionPriority::Safe as u8, 2);
    }

    #[test]
    fn capped_reason_mentions_limiting_element() {
        let capped = CappedRate {
            uncapped: 800.0,
            rate: 0.0,
            limiting: Some(LimitingConstraint {
                element: Element::Magnesium,
                current: 326.0,
                max_level: 268.125,
                max_rate: -1200.0,
            }),
        };
        let reason = capped.reason().unwrap();
        assert!(reason.contains("Magnesium (Mg)"));
        assert!(reason.contains("already above"));
        assert!(!capped.is_safe());
        assert!(CappedRate::uncapped(10.0).reason().is_none());
    }

    #[test]
    fn option_builder() {
        let option = FertilizerOption::new(
            "Calcium Nitrate",
            Element::Calcium,
            OptionPriority::PhCompatible,
            CappedRate::uncapped(8068.2),
        )
        .with_ph(Some(true))
        .with_explanation("Supplies calcium and nitrate")
        .with_data_point("Calcium", "17%");
        assert_eq!(option.data_points.len(), 1);
        assert!((option.rate() - 8068.2).abs() < 1e-9);
    }
}
