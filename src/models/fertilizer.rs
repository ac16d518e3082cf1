use crate::models::nutrient::Element;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseType {
    Fast,
    Moderate,
    Slow,
    VerySlow,
    Controlled,
}

impl ReleaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Fast => "Fast Release",
            ReleaseType::Moderate => "Moderate Release",
            ReleaseType::Slow => "Slow Release",
            ReleaseType::VerySlow => "Very Slow Release",
            ReleaseType::Controlled => "Controlled Release",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "fast" => Some(ReleaseType::Fast),
            "moderate" => Some(ReleaseType::Moderate),
            "slow" => Some(ReleaseType::Slow),
            "very slow" => Some(ReleaseType::VerySlow),
            "controlled" => Some(ReleaseType::Controlled),
            _ => None,
        }
    }

    pub fn all() -> &'static [ReleaseType] {
        &[
            ReleaseType::Fast,
            ReleaseType::Moderate,
            ReleaseType::Slow,
            ReleaseType::VerySlow,
            ReleaseType::Controlled,
        ]
    }

    /// Filter cycle used by the corrections screen: all types, then each one.
    pub fn next_filter(current: Option<ReleaseType>) -> Option<ReleaseType> {
        let all = Self::all();
        match current {
            None => all.first().copied(),
            Some(r) => all
                .iter()
                .position(|x| *x == r)
                .and_then(|idx| all.get(idx + 1))
                .copied(),
        }
    }
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Soil pH range a product is suited to. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhWindow {
    pub min_ph: Option<f64>,
    pub max_ph: Option<f64>,
}

impl PhWindow {
    pub fn new(min_ph: Option<f64>, max_ph: Option<f64>) -> Self {
        Self { min_ph, max_ph }
    }

    pub fn is_open(&self) -> bool {
        self.min_ph.is_none() && self.max_ph.is_none()
    }

    pub fn contains(&self, ph: f64) -> bool {
        self.min_ph.is_none_or(|min| ph >= min) && self.max_ph.is_none_or(|max| ph <= max)
    }
}

impl std::fmt::Display for PhWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.min_ph, self.max_ph) {
            (Some(min), Some(max)) => write!(f, "pH {:.1}-{:.1}", min, max),
            (Some(min), None) => write!(f, "pH ≥ {:.1}", min),
            (None, Some(max)) => write!(f, "pH ≤ {:.1}", max),
            (None, None) => write!(f, "any pH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerDefinition {
    pub label: String,
    /// Percent by weight of each element supplied.
    pub nutrient_content: BTreeMap<Element, f64>,
    pub release_type: Option<ReleaseType>,
    pub ph_window: Option<PhWindow>,
    pub url: Option<String>,
    pub description: Option<String>,
}

impl FertilizerDefinition {
    pub fn new(label: impl Into<String>, content: &[(Element, f64)]) -> Self {
        Self {
            label: label.into(),
            nutrient_content: content.iter().copied().collect(),
            release_type: None,
            ph_window: None,
            url: None,
            description: None,
        }
    }

    pub fn with_release(mut self, release: ReleaseType) -> Self {
        self.release_type = Some(release);
        self
    }

    pub fn with_ph_window(mut self, min_ph: Option<f64>, max_ph: Option<f64>) -> Self {
        self.ph_window = Some(PhWindow::new(min_ph, max_ph));
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Percent of `element` supplied, 0 when absent.
    pub fn percent(&self, element: Element) -> f64 {
        self.nutrient_content.get(&element).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, element: Element) -> bool {
        self.percent(element) > 0.0
    }

    /// Elements with a positive content, in canonical order.
    pub fn elements(&self) -> impl Iterator<Item = (Element, f64)> + '_ {
        self.nutrient_content
            .iter()
            .filter(|(_, pct)| **pct > 0.0)
            .map(|(e, pct)| (*e, *pct))
    }

    /// `None` when the product has no usable window or the pH is unknown.
    pub fn ph_compatible(&self, soil_ph: Option<f64>) -> Option<bool> {
        let window = self.ph_window.filter(|w| !w.is_open())?;
        soil_ph.map(|ph| window.contains(ph))
    }

    /// "Calcium 17%, Nitrate 12%"
    pub fn content_summary(&self) -> String {
        self.elements()
            .map(|(e, pct)| format!("{} {}%", e.as_str(), pct))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calcium_nitrate() -> FertilizerDefinition {
        FertilizerDefinition::new(
            "Calcium Nitrate",
            &[(Element::Calcium, 17.0), (Element::Nitrate, 12.0)],
        )
        .with_ph_window(None, Some(7.5))
        .with_release(ReleaseType::Fast)
    }

    #[test]
    fn percent_lookup() {
        let f = calcium_nitrate();
        assert!((f.percent(Element::Calcium) - 17.0).abs() < 1e-9);
        assert_eq!(f.percent(Element::Zinc), 0.0);
        assert!(f.contains(Element::Nitrate));
        assert!(!f.contains(Element::Potassium));
        assert_eq!(f.content_summary(), "Nitrate 12%, Calcium 17%");
    }

    #[test]
    fn ph_compatibility() {
        let f = calcium_nitrate();
        assert_eq!(f.ph_compatible(Some(6.8)), Some(true));
        assert_eq!(f.ph_compatible(Some(7.8)), Some(false));
        assert_eq!(f.ph_compatible(None), None);

        let open = FertilizerDefinition::new("Borax", &[(Element::Boron, 14.0)])
            .with_ph_window(None, None);
        assert_eq!(open.ph_compatible(Some(9.0)), None);
    }

    #[test]
    fn release_type_parsing() {
        assert_eq!(ReleaseType::from_str("very slow"), Some(ReleaseType::VerySlow));
        assert_eq!(ReleaseType::from_str("Very_Slow"), Some(ReleaseType::VerySlow));
        assert_eq!(ReleaseType::from_str("FAST"), Some(ReleaseType::Fast));
        assert_eq!(ReleaseType::from_str("instant"), None);
    }

    #[test]
    fn release_filter_cycles_back_to_all() {
        let mut filter = None;
        let mut seen = Vec::new();
        for _ in 0..6 {
            filter = ReleaseType::next_filter(filter);
            seen.push(filter);
        }
        assert_eq!(seen[0], Some(ReleaseType::Fast));
        assert_eq!(seen[4], Some(ReleaseType::Controlled));
        assert_eq!(seen[5], None);
    }
}
