use crate::models::nutrient::{Element, Nutrient, NutrientCategory, NutrientStatus, TestMethod};
use serde::{Deserialize, Serialize};

/// Identifying details of one analysis (paddock) on a report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddockInfo {
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub paddock: Option<String>,
    #[serde(default, alias = "date")]
    pub sample_date: Option<String>,
    #[serde(default)]
    pub lab_number: Option<String>,
}

impl PaddockInfo {
    pub fn display_name(&self, fallback: &str) -> String {
        self.paddock
            .clone()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// The full set of readings for one soil or leaf analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoilProfile {
    pub nutrients: Vec<Nutrient>,
}

fn category_rank(category: NutrientCategory) -> u8 {
    match category {
        NutrientCategory::Soil => 0,
        NutrientCategory::LamotteReams => 1,
        NutrientCategory::Tae => 2,
        NutrientCategory::BaseSaturation => 3,
    }
}

// Unrecognised methods sort just ahead of LaMotte
fn method_rank(method: Option<TestMethod>) -> u8 {
    match method {
        Some(TestMethod::LaMotte) => 20,
        Some(TestMethod::Tae) => 21,
        Some(m) => m as u8,
        None => 19,
    }
}

impl SoilProfile {
    pub fn new(nutrients: Vec<Nutrient>) -> Self {
        Self { nutrients }
    }

    pub fn is_empty(&self) -> bool {
        self.nutrients.is_empty()
    }

    /// The reading used for capping and progress: base saturation entries are
    /// never authoritative, then soil before LaMotte/TAE, then method priority.
    /// Ties keep report order.
    pub fn authoritative(&self, element: Element) -> Option<&Nutrient> {
        self.nutrients
            .iter()
            .enumerate()
            .filter(|(_, n)| n.element == Some(element))
            .filter(|(_, n)| n.category != NutrientCategory::BaseSaturation)
            .min_by_key(|(idx, n)| (category_rank(n.category), method_rank(n.method()), *idx))
            .map(|(_, n)| n)
    }

    /// Every reading for an element, any category.
    pub fn readings(&self, element: Element) -> impl Iterator<Item = &Nutrient> {
        self.nutrients
            .iter()
            .filter(move |n| n.element == Some(element))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Nutrient> {
        self.nutrients
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
            .or_else(|| {
                Element::resolve(name).and_then(|element| self.authoritative(element))
            })
    }

    pub fn ph(&self) -> Option<f64> {
        self.nutrients
            .iter()
            .find(|n| n.is_ph())
            .map(|n| n.current)
            .filter(|v| *v > 0.0)
    }

    pub fn with_status(&self, status: NutrientStatus) -> impl Iterator<Item = &Nutrient> {
        self.nutrients.iter().filter(move |n| n.status == status)
    }
}
