use crate::logic::calculations::{deviation_percent, PROGRESS_BAND_PERCENT};
use crate::logic::rates::RateEngine;
use crate::models::nutrient::{Element, Nutrient, NutrientCategory, NutrientStatus};
use crate::models::profile::SoilProfile;
use crate::models::selection::SelectionSet;
use serde::Serialize;

/// Corrections shown first, in this order.
pub const MAIN_CORRECTIONS: [Element; 7] = [
    Element::Calcium,
    Element::Magnesium,
    Element::Potassium,
    Element::Phosphorus,
    Element::Sulphur,
    Element::Nitrate,
    Element::Ammonium,
];

const META_METRICS: &[&str] = &[
    "paramagnetism",
    "organic matter",
    "organic carbon",
    "conductivity",
    "ca mg ratio",
];

pub fn is_meta_metric(name: &str) -> bool {
    let normalized = name.to_lowercase().replace(['_', '/'], " ");
    META_METRICS.iter().any(|m| normalized.starts_with(m))
}

fn is_correctable(n: &Nutrient) -> bool {
    let lower = n.name.to_lowercase();
    n.status == NutrientStatus::Low
        && matches!(n.category, NutrientCategory::Soil)
        && !lower.contains("lamotte")
        && !lower.contains("tae")
        && !is_meta_metric(&n.name)
}

fn is_primary_reading(n: &Nutrient) -> bool {
    n.category == NutrientCategory::Soil && n.method().is_some_and(|m| m.is_primary())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionPlan<'a> {
    pub main: Vec<&'a Nutrient>,
    pub secondary: Vec<&'a Nutrient>,
}

impl<'a> CorrectionPlan<'a> {
    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.secondary.is_empty()
    }

    pub fn len(&self) -> usize {
        self.main.len() + self.secondary.len()
    }

    /// Main corrections then secondary ones.
    pub fn all(&self) -> impl Iterator<Item = &'a Nutrient> + '_ {
        self.main.iter().chain(self.secondary.iter()).copied()
    }

    pub fn get(&self, index: usize) -> Option<&'a Nutrient> {
        self.all().nth(index)
    }
}

/// Pick one deficient reading per element for a correction card. An element
/// is skipped entirely when any primary-method reading of it is not low.
pub fn plan(profile: &SoilProfile) -> CorrectionPlan<'_> {
    let mut groups: Vec<(Element, Vec<&Nutrient>)> = Vec::new();
    for nutrient in profile.nutrients.iter().filter(|n| is_correctable(n)) {
        let Some(element) = nutrient.element else {
            continue;
        };
        match groups.iter_mut().find(|(e, _)| *e == element) {
            Some((_, members)) => members.push(nutrient),
            None => groups.push((element, vec![nutrient])),
        }
    }

    let chosen: Vec<(Element, &Nutrient)> = groups
        .into_iter()
        .filter(|(element, _)| {
            !profile
                .readings(*element)
                .any(|n| is_primary_reading(n) && n.status != NutrientStatus::Low)
        })
        .filter_map(|(element, members)| {
            // Report order breaks ties; unknown methods rank after known ones
            members
                .into_iter()
                .enumerate()
                .min_by_key(|(idx, n)| (n.method().map_or(u8::MAX, |m| m as u8), *idx))
                .map(|(_, n)| (element, n))
        })
        .collect();

    let main = MAIN_CORRECTIONS
        .iter()
        .filter_map(|m| chosen.iter().find(|(e, _)| e == m).map(|(_, n)| *n))
        .collect();
    let secondary = chosen
        .iter()
        .filter(|(e, _)| !MAIN_CORRECTIONS.contains(e))
        .map(|(_, n)| *n)
        .collect();

    CorrectionPlan { main, secondary }
}

/// The four bars of a correction card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionProgress {
    pub current: f64,
    pub new_level: f64,
    pub requirement: f64,
    pub target: f64,
    pub deviation_percent: f64,
    pub within_band: bool,
}

impl CorrectionProgress {
    pub fn compute(engine: &RateEngine<'_>, selections: &SelectionSet, nutrient: &Nutrient) -> Option<Self> {
        Self::compute_with_band(engine, selections, nutrient, PROGRESS_BAND_PERCENT)
    }

    pub fn compute_with_band(
        engine: &RateEngine<'_>,
        selections: &SelectionSet,
        nutrient: &Nutrient,
        band_percent: f64,
    ) -> Option<Self> {
        let target = nutrient.target()?;
        let aggregate = engine.aggregate(selections, nutrient);
        let deviation = deviation_percent(aggregate.new_level, target);
        Some(Self {
            current: nutrient.current,
            new_level: aggregate.new_level,
            requirement: (target - aggregate.new_level).max(0.0),
            target,
            deviation_percent: deviation,
            within_band: deviation.abs() <= band_percent,
        })
    }

    /// Largest of the four values, for scaling bars.
    pub fn scale(&self) -> f64 {
        self.current
            .max(self.new_level)
            .max(self.requirement)
            .max(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::catalog::FertilizerCatalog;

    fn nutrients() -> SoilProfile {
        SoilProfile::new(vec![
            Nutrient::new("Zinc (DTPA)", 2.0, 6.0, "ppm"),
            Nutrient::new("Calcium (KCl)", 500.0, 1400.0, "ppm"),
            Nutrient::new("Calcium (Mehlich III)", 949.0, 1520.5, "ppm"),
            Nutrient::new("Potassium (Mehlich III)", 80.0, 200.0, "ppm"),
            Nutrient::new("LaMotte Potassium", 10.0, 100.0, "lbs/acre")
                .with_category(NutrientCategory::LamotteReams),
            Nutrient::new("Magnesium (Mehlich III)", 100.0, 214.5, "ppm"),
            Nutrient::new("Magnesium (KCl)", 220.0, 214.5, "ppm"),
            Nutrient::new("Base Saturation Sodium", 0.5, 1.0, "%")
                .with_category(NutrientCategory::BaseSaturation),
            Nutrient::new("Organic Carbon (LECO)", 1.0, 3.0, "%"),
            Nutrient::new("Boron (Hot CaCl2)", 0.5, 2.0, "ppm"),
        ])
    }

    #[test]
    fn plan_orders_main_then_secondary() {
        let profile = nutrients();
        let plan = plan(&profile);
        let main: Vec<&str> = plan.main.iter().map(|n| n.name.as_str()).collect();
        let secondary: Vec<&str> = plan.secondary.iter().map(|n| n.name.as_str()).collect();

        assert_eq!(main, vec!["Calcium (Mehlich III)", "Potassium (Mehlich III)"]);
        assert_eq!(secondary, vec!["Zinc (DTPA)", "Boron (Hot CaCl2)"]);
        assert_eq!(plan.len(), 4);
        assert_eq!(plan.get(2).unwrap().name, "Zinc (DTPA)");
    }

    #[test]
    fn plan_skips_element_with_non_low_primary_reading() {
        let profile = nutrients();
        let plan = plan(&profile);
        assert!(plan.all().all(|n| n.element != Some(Element::Magnesium)));
    }

    #[test]
    fn plan_ignores_excluded_categories_and_meta_metrics() {
        let profile = nutrients();
        let plan = plan(&profile);
        assert!(plan.all().all(|n| n.category == NutrientCategory::Soil));
        assert!(plan.all().all(|n| !n.name.contains("LECO")));
        assert!(plan.all().all(|n| n.element != Some(Element::Sodium)));
    }

    #[test]
    fn meta_metric_names() {
        assert!(is_meta_metric("Paramagnetism"));
        assert!(is_meta_metric("organic_matter_calc"));
        assert!(is_meta_metric("Ca_Mg_Ratio"));
        assert!(is_meta_metric("Conductivity (1:5 water)"));
        assert!(!is_meta_metric("Calcium (Mehlich III)"));
    }

    #[test]
    fn empty_plan_when_nothing_is_low() {
        let profile = SoilProfile::new(vec![Nutrient::new("Calcium (Mehlich III)", 1500.0, 1520.5, "ppm")]);
        assert!(plan(&profile).is_empty());
    }

    #[test]
    fn progress_tracks_selections() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let calcium = Nutrient::new("Calcium (Mehlich III)", 949.0, 1520.5, "ppm");

        let mut selections = SelectionSet::new();
        let before = CorrectionProgress::compute(&engine, &selections, &calcium).unwrap();
        assert!((before.requirement - 571.5).abs() < 1e-9);
        assert!(!before.within_band);

        // 1320 kg/ha of 40% lime adds 220 ppm
        selections.set(&calcium.name, 0, "Super Fine Ag Lime", 1320.0);
        let after = CorrectionProgress::compute(&engine, &selections, &calcium).unwrap();
        assert!((after.new_level - 1169.0).abs() < 1e-9);
        assert!((after.requirement - 351.5).abs() < 1e-9);
        assert!(after.within_band);
        assert!((after.scale() - 1520.5).abs() < 1e-9);
    }

    #[test]
    fn progress_needs_a_target() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let n = Nutrient::new("Paramagnetism", 100.0, 0.0, "µCGS");
        assert!(CorrectionProgress::compute(&engine, &SelectionSet::new(), &n).is_none());
    }
}
