use crate::models::nutrient::Nutrient;
use serde::{Deserialize, Serialize};

/// Logistic-style falloff: 100 at zero deviation, 50 at `d` percent,
/// 0 at or beyond `cutoff` percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreCurve {
    pub d: f64,
    pub n: f64,
    pub cutoff: f64,
}

impl ScoreCurve {
    pub const DEFAULT: ScoreCurve = ScoreCurve {
        d: 50.0,
        n: 2.0,
        cutoff: 250.0,
    };

    pub fn score(&self, deviation_fraction: f64) -> f64 {
        let x = deviation_fraction.abs() * 100.0;
        if !x.is_finite() || x >= self.cutoff {
            return 0.0;
        }
        (100.0 / (1.0 + (x / self.d).powf(self.n))).clamp(0.0, 100.0)
    }
}

impl Default for ScoreCurve {
    fn default() -> Self {
        Self::DEFAULT
    }
}

pub fn smooth_score(deviation_fraction: f64) -> f64 {
    ScoreCurve::DEFAULT.score(deviation_fraction)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StarRating(u8);

impl StarRating {
    pub fn from_score(score: f64) -> Self {
        let stars = if score >= 80.0 {
            5
        } else if score >= 60.0 {
            4
        } else if score >= 40.0 {
            3
        } else if score >= 20.0 {
            2
        } else {
            1
        };
        StarRating(stars)
    }

    pub fn stars(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        match self.0 {
            5 => "Excellent",
            4 => "Good",
            3 => "Fair",
            2 => "Poor",
            _ => "Critical",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self.0 {
            5 => Color::Green,
            4 => Color::LightGreen,
            3 => Color::Yellow,
            2 => Color::LightRed,
            _ => Color::Red,
        }
    }
}

impl std::fmt::Display for StarRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let filled = usize::from(self.0);
        write!(f, "{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientScore {
    pub name: String,
    pub deviation_percent: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScore {
    pub overall: f64,
    pub stars: StarRating,
    pub scores: Vec<NutrientScore>,
}

/// Mean smooth score over nutrients with a usable ideal; 0 when there are none.
pub fn overall_score<'a>(nutrients: impl IntoIterator<Item = &'a Nutrient>) -> HealthScore {
    let scores: Vec<NutrientScore> = nutrients
        .into_iter()
        .filter_map(|n| {
            let deviation = n.deviation_fraction()?;
            Some(NutrientScore {
                name: n.name.clone(),
                deviation_percent: deviation * 100.0,
                score: smooth_score(deviation),
            })
        })
        .collect();

    let overall = if scores.is_empty() {
        0.0
    } else {
        scores.iter().map(|s| s.score).sum::<f64>() / scores.len() as f64
    };

    HealthScore {
        overall,
        stars: StarRating::from_score(overall),
        scores,
    }
}

/// Leaf-test reading band by signed deviation percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeafBand {
    ExtremelyDeficient,
    Deficient,
    Good,
    Excessive,
    ExtremelyExcessive,
}

impl LeafBand {
    pub fn classify(deviation_percent: f64) -> Self {
        if deviation_percent <= -100.0 {
            LeafBand::ExtremelyDeficient
        } else if deviation_percent <= -25.0 {
            LeafBand::Deficient
        } else if deviation_percent < 25.0 {
            LeafBand::Good
        } else if deviation_percent <= 100.0 {
            LeafBand::Excessive
        } else {
            LeafBand::ExtremelyExcessive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeafBand::ExtremelyDeficient => "Extremely Deficient",
            LeafBand::Deficient => "Deficient",
            LeafBand::Good => "Good",
            LeafBand::Excessive => "Excessive",
            LeafBand::ExtremelyExcessive => "Extremely Excessive",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            LeafBand::ExtremelyDeficient => Color::Red,
            LeafBand::Deficient => Color::LightRed,
            LeafBand::Good => Color::Green,
            LeafBand::Excessive => Color::LightBlue,
            LeafBand::ExtremelyExcessive => Color::Blue,
        }
    }
}

impl std::fmt::Display for LeafBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
