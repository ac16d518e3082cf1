//! Fertilizer rate recommendation and capping.
//!
//! All rates are kg/ha of product, all levels are ppm. Nothing here rounds;
//! presentation formats to one decimal.

use crate::logic::calculations::{
    clamp_max_excess, deviation_percent, max_allowed_level, ppm_from_product_rate,
    product_rate_for_ppm, EXCESS_EPSILON, PPM_TO_KG_HA,
};
use crate::logic::catalog::FertilizerCatalog;
use crate::models::fertilizer::{FertilizerDefinition, ReleaseType};
use crate::models::nutrient::{Element, Nutrient};
use crate::models::profile::SoilProfile;
use crate::models::recommendation::{
    CappedRate, Exceedance, FertilizerOption, LimitingConstraint, OptionPriority,
};
use crate::models::selection::{
    AmendmentsSummary, FertilizerSelection, SelectionSet, SoilAmendmentEntry,
};

/// Product rate that lifts `target` to its ideal, given ppm already added by
/// earlier selections. Zero when no valid ideal or the product lacks the element.
pub fn uncapped_rate(target: &Nutrient, fertilizer: &FertilizerDefinition, already_added_ppm: f64) -> f64 {
    let (Some(element), Some(ideal)) = (target.element, target.target()) else {
        return 0.0;
    };
    let needed = (ideal - (target.current + already_added_ppm)).max(0.0);
    product_rate_for_ppm(needed, fertilizer.percent(element))
}

/// Limit `uncapped` so no other element in the product passes its allowed
/// maximum. Negative headroom is kept through the comparison; only the final
/// rate is floored at zero.
pub fn cap(
    fertilizer: &FertilizerDefinition,
    target: Element,
    uncapped: f64,
    profile: &SoilProfile,
    max_excess_percent: f64,
) -> CappedRate {
    let mut rate = uncapped;
    let mut limiting = None;

    for (element, percent) in fertilizer.elements() {
        if element == target {
            continue;
        }
        let Some(nutrient) = profile.authoritative(element) else {
            continue;
        };
        let Some(ideal) = nutrient.target() else {
            continue;
        };

        let max_level = max_allowed_level(ideal, max_excess_percent);
        let max_rate = (max_level - nutrient.current) * 100.0 * PPM_TO_KG_HA / percent;

        if max_rate < rate {
            rate = max_rate;
            limiting = Some(LimitingConstraint {
                element,
                current: nutrient.current,
                max_level,
                max_rate,
            });
        }
    }

    CappedRate {
        uncapped,
        rate: rate.max(0.0),
        limiting,
    }
}

/// ppm of `element` supplied by `rate` kg/ha of `fertilizer`.
pub fn contribution_ppm(fertilizer: &FertilizerDefinition, rate: f64, element: Element) -> f64 {
    ppm_from_product_rate(rate, fertilizer.percent(element))
}

/// First element of `fertilizer` that `candidate_rate` would push above its
/// allowed maximum, on top of `other_added_ppm` from every other selection.
pub fn would_exceed(
    fertilizer: &FertilizerDefinition,
    candidate_rate: f64,
    profile: &SoilProfile,
    other_added_ppm: impl Fn(Element) -> f64,
    max_excess_percent: f64,
) -> Option<Exceedance> {
    fertilizer.elements().find_map(|(element, percent)| {
        let nutrient = profile.authoritative(element)?;
        let ideal = nutrient.target()?;
        let max_level = max_allowed_level(ideal, max_excess_percent);
        let level =
            nutrient.current + other_added_ppm(element) + ppm_from_product_rate(candidate_rate, percent);
        (level > max_level + EXCESS_EPSILON).then(|| Exceedance {
            element,
            resulting_level: level,
            max_level,
            deviation_percent: deviation_percent(level, ideal),
        })
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    pub total_added_ppm: f64,
    pub new_level: f64,
}

/// Catalog filter applied to a deficiency's product list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionFilter {
    pub release: Option<ReleaseType>,
    pub search: String,
}

/// Rate engine bound to a catalog and an excess allowance. Every screen and
/// command goes through the same instance so aggregation has one definition.
pub struct RateEngine<'a> {
    catalog: &'a FertilizerCatalog,
    max_excess_percent: f64,
}

impl<'a> RateEngine<'a> {
    pub fn new(catalog: &'a FertilizerCatalog, max_excess_percent: f64) -> Self {
        Self {
            catalog,
            max_excess_percent: clamp_max_excess(max_excess_percent),
        }
    }

    pub fn catalog(&self) -> &FertilizerCatalog {
        self.catalog
    }

    pub fn max_excess_percent(&self) -> f64 {
        self.max_excess_percent
    }

    fn lookup(&self, label: &str) -> Option<&'a FertilizerDefinition> {
        let found = self.catalog.get(label);
        if found.is_none() {
            tracing::debug!("Fertilizer '{}' not in catalog, ignoring", label);
        }
        found
    }

    fn selection_ppm(&self, selection: &FertilizerSelection, element: Element) -> f64 {
        self.catalog
            .get(&selection.fert_label)
            .map(|f| contribution_ppm(f, selection.rate, element))
            .unwrap_or(0.0)
    }

    /// ppm of `element` added by every selection, whatever nutrient it was made under.
    pub fn added_ppm<'s>(
        &self,
        selections: impl IntoIterator<Item = &'s FertilizerSelection>,
        element: Element,
    ) -> f64 {
        selections
            .into_iter()
            .map(|s| self.selection_ppm(s, element))
            .sum()
    }

    pub fn aggregate(&self, selections: &SelectionSet, target: &Nutrient) -> Aggregate {
        let total_added_ppm = target
            .element
            .map(|element| self.added_ppm(selections.iter(), element))
            .unwrap_or(0.0);
        Aggregate {
            total_added_ppm,
            new_level: target.current + total_added_ppm,
        }
    }

    /// ppm of the target supplied by the selectors before `slot` under the same nutrient.
    pub fn already_added(&self, selections: &SelectionSet, target: &Nutrient, slot: usize) -> f64 {
        let Some(element) = target.element else {
            return 0.0;
        };
        self.added_ppm(
            selections
                .for_nutrient(&target.name)
                .filter(|(idx, _)| *idx < slot)
                .map(|(_, s)| s),
            element,
        )
    }

    /// Capped rate for `fert_label` in selector `slot` of `target`.
    /// `None` when the label is unknown.
    pub fn recommend(
        &self,
        target: &Nutrient,
        fert_label: &str,
        selections: &SelectionSet,
        slot: usize,
        profile: &SoilProfile,
    ) -> Option<CappedRate> {
        let fertilizer = self.lookup(fert_label)?;
        let element = target.element?;
        let already = self.already_added(selections, target, slot);
        let uncapped = uncapped_rate(target, fertilizer, already);
        Some(cap(fertilizer, element, uncapped, profile, self.max_excess_percent))
    }

    /// Evaluate a product for `target` from the untreated soil levels.
    pub fn evaluate_option(
        &self,
        target: &Nutrient,
        element: Element,
        fertilizer: &FertilizerDefinition,
        profile: &SoilProfile,
    ) -> FertilizerOption {
        let uncapped = uncapped_rate(target, fertilizer, 0.0);
        let capped = cap(fertilizer, element, uncapped, profile, self.max_excess_percent);
        let ph_compatible = fertilizer.ph_compatible(profile.ph());

        let priority = match ph_compatible {
            Some(true) => OptionPriority::PhCompatible,
            Some(false) => OptionPriority::PhIncompatible,
            None if capped.rate <= 0.0 => OptionPriority::NoSafeRate,
            None => OptionPriority::Safe,
        };

        let explanation = match ph_compatible {
            Some(true) => "Recommended for your soil pH.".to_string(),
            Some(false) => {
                "Not recommended: soil pH is not within the recommended range for this fertilizer."
                    .to_string()
            }
            None if capped.rate <= 0.0 => format!(
                "No safe rate: any application would push {} above the {:.0}% excess limit.",
                capped
                    .limiting
                    .map(|l| l.element.as_str())
                    .unwrap_or("a nutrient"),
                self.max_excess_percent
            ),
            None => capped.reason().unwrap_or_default(),
        };

        let mut option = FertilizerOption::new(&fertilizer.label, element, priority, capped)
            .with_ph(ph_compatible)
            .with_explanation(explanation)
            .with_data_point("Content", fertilizer.content_summary())
            .with_data_point("Rate", format!("{:.1} kg/ha", capped.rate));
        if capped.is_capped() {
            option = option.with_data_point("Uncapped", format!("{:.1} kg/ha", capped.uncapped));
        }
        if let Some(window) = fertilizer.ph_window.filter(|w| !w.is_open()) {
            option = option.with_data_point("pH", window);
        }
        option
    }

    /// Products supplying `target`, filtered, with products already chosen
    /// under other nutrients left out, stably sorted by priority.
    pub fn ranked_options(
        &self,
        target: &Nutrient,
        profile: &SoilProfile,
        selections: &SelectionSet,
        filter: &OptionFilter,
    ) -> Vec<FertilizerOption> {
        let Some(element) = target.element else {
            return Vec::new();
        };
        let taken: Vec<&str> = selections
            .iter()
            .filter(|s| s.nutrient != target.name)
            .map(|s| s.fert_label.as_str())
            .collect();

        let mut options: Vec<FertilizerOption> = self
            .catalog
            .filter(Some(element), filter.release, &filter.search)
            .filter(|f| !taken.contains(&f.label.as_str()))
            .map(|f| self.evaluate_option(target, element, f, profile))
            .collect();
        options.sort_by_key(|o| o.priority);
        options
    }

    /// Check a candidate rate for selector `slot` of `target` against every
    /// other selection.
    pub fn would_exceed(
        &self,
        fert_label: &str,
        candidate_rate: f64,
        target: &Nutrient,
        slot: usize,
        profile: &SoilProfile,
        selections: &SelectionSet,
    ) -> Option<Exceedance> {
        let fertilizer = self.lookup(fert_label)?;
        let own = selections
            .for_nutrient(&target.name)
            .find(|(idx, _)| *idx == slot)
            .map(|(_, s)| s);
        let others = || {
            selections
                .iter()
                .filter(move |s| !own.is_some_and(|o| std::ptr::eq(o, *s)))
        };
        would_exceed(
            fertilizer,
            candidate_rate,
            profile,
            |element| self.added_ppm(others(), element),
            self.max_excess_percent,
        )
    }

    /// Put `fert_label` at `rate` into selector `slot` and refresh the summary
    /// lines of both the new and the replaced product. Unknown labels leave
    /// both untouched and return false.
    pub fn apply(
        &self,
        selections: &mut SelectionSet,
        summary: &mut AmendmentsSummary,
        target: &Nutrient,
        slot: usize,
        fert_label: &str,
        rate: f64,
    ) -> bool {
        if self.lookup(fert_label).is_none() || target.element.is_none() {
            return false;
        }

        let previous = selections
            .slots(&target.name)
            .get(slot)
            .cloned()
            .flatten()
            .map(|s| s.fert_label);

        selections.set(&target.name, slot, fert_label, rate.max(0.0));
        if let Some(previous) = previous.filter(|p| p != fert_label) {
            self.sync_summary(selections, summary, target, &previous);
        }
        self.sync_summary(selections, summary, target, fert_label);
        true
    }

    /// Drop selector `slot` and rebuild its product's summary line from the
    /// slots that remain.
    pub fn remove(
        &self,
        selections: &mut SelectionSet,
        summary: &mut AmendmentsSummary,
        target: &Nutrient,
        slot: usize,
    ) -> Option<FertilizerSelection> {
        let removed = selections.remove(&target.name, slot)?;
        self.sync_summary(selections, summary, target, &removed.fert_label);
        Some(removed)
    }

    /// One summary line per (product, target nutrient), carrying the summed
    /// rate of every slot under that nutrient holding the product. The line
    /// goes away with the last such slot.
    fn sync_summary(
        &self,
        selections: &SelectionSet,
        summary: &mut AmendmentsSummary,
        target: &Nutrient,
        fert_label: &str,
    ) {
        let mut rates = selections
            .for_nutrient(&target.name)
            .filter(|(_, s)| s.fert_label == fert_label)
            .map(|(_, s)| s.rate)
            .peekable();
        if rates.peek().is_none() {
            summary.remove(fert_label, &target.name);
            return;
        }
        let total: f64 = rates.sum();

        match (self.lookup(fert_label), target.element) {
            (Some(fertilizer), Some(element)) => {
                summary.upsert(SoilAmendmentEntry::new(fertilizer, &target.name, element, total));
            }
            _ => {
                summary.remove(fert_label, &target.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::nutrient::NutrientCategory;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-6, "{} != {}", a, b);
    }

    fn profile() -> SoilProfile {
        SoilProfile::new(vec![
            Nutrient::new("Calcium (Mehlich III)", 949.0, 1520.5, "ppm"),
            Nutrient::new("Magnesium (Mehlich III)", 326.0, 214.5, "ppm"),
            Nutrient::new("Nitrate-N (KCl)", 10.0, 20.0, "ppm"),
            Nutrient::new("Sulphur (KCl)", 20.0, 50.0, "ppm"),
            Nutrient::new("Potassium (Mehlich III)", 120.0, 200.0, "ppm"),
            Nutrient::new("pH-level (1:5 water)", 6.4, 6.5, ""),
            Nutrient::new("Base Saturation Magnesium", 10.0, 15.0, "%")
                .with_category(NutrientCategory::BaseSaturation),
        ])
    }

    fn calcium(p: &SoilProfile) -> Nutrient {
        p.authoritative(Element::Calcium).unwrap().clone()
    }

    fn calcium_only() -> FertilizerDefinition {
        FertilizerDefinition::new("Calcium Chloride", &[(Element::Calcium, 27.0)])
    }

    #[test]
    fn uncapped_rate_scenario() {
        let p = profile();
        let calcium_nitrate =
            FertilizerDefinition::new("Calcium Nitrate", &[(Element::Calcium, 17.0), (Element::Nitrate, 12.0)]);
        let rate = uncapped_rate(&calcium(&p), &calcium_nitrate, 0.0);
        assert_close(rate, (1520.5 - 949.0) * 100.0 * 2.4 / 17.0);
    }

    #[test]
    fn uncapped_rate_is_never_negative() {
        let p = profile();
        let mg = p.authoritative(Element::Magnesium).unwrap();
        let dolomite =
            FertilizerDefinition::new("Dolomite", &[(Element::Calcium, 20.0), (Element::Magnesium, 10.0)]);
        assert_eq!(uncapped_rate(mg, &dolomite, 0.0), 0.0);

        let ca = calcium(&p);
        assert_eq!(uncapped_rate(&ca, &calcium_only(), 10_000.0), 0.0);

        let no_ideal = Nutrient::new("Zinc", 1.0, 0.0, "ppm");
        assert_eq!(uncapped_rate(&no_ideal, &calcium_only(), 0.0), 0.0);
    }

    #[test]
    fn single_nutrient_product_is_not_capped() {
        let p = profile();
        let ca = calcium(&p);
        let uncapped = uncapped_rate(&ca, &calcium_only(), 0.0);
        let capped = cap(&calcium_only(), Element::Calcium, uncapped, &p, 25.0);
        assert_close(capped.rate, uncapped);
        assert!(capped.limiting.is_none());
    }

    #[test]
    fn product_over_limit_element_gets_zero_rate() {
        let p = profile();
        let dolomite =
            FertilizerDefinition::new("Dolomite", &[(Element::Calcium, 20.0), (Element::Magnesium, 10.0)]);
        let ca = calcium(&p);
        let uncapped = uncapped_rate(&ca, &dolomite, 0.0);
        assert!(uncapped > 0.0);

        let capped = cap(&dolomite, Element::Calcium, uncapped, &p, 25.0);
        assert_eq!(capped.rate, 0.0);
        let limit = capped.limiting.unwrap();
        assert_eq!(limit.element, Element::Magnesium);
        assert!(limit.max_rate < 0.0);
        assert_close(limit.max_level, 268.125);
    }

    #[test]
    fn cap_binds_at_headroom_of_other_element() {
        let p = profile();
        let calcium_nitrate =
            FertilizerDefinition::new("Calcium Nitrate", &[(Element::Calcium, 17.0), (Element::Nitrate, 12.0)]);
        let ca = calcium(&p);
        let uncapped = uncapped_rate(&ca, &calcium_nitrate, 0.0);
        let capped = cap(&calcium_nitrate, Element::Calcium, uncapped, &p, 25.0);

        // Nitrate headroom: 20 * 1.25 - 10 = 15 ppm
        assert_close(capped.rate, 15.0 * 100.0 * 2.4 / 12.0);
        assert_eq!(capped.limiting.unwrap().element, Element::Nitrate);
        assert!(capped.reason().unwrap().contains("Nitrate"));

        // Applying the capped rate lands nitrate exactly on its maximum
        assert!(would_exceed(&calcium_nitrate, capped.rate, &p, |_| 0.0, 25.0).is_none());
    }

    #[test]
    fn cap_is_never_negative() {
        let p = profile();
        for uncapped in [0.0, 1.0, 500.0, 10_000.0] {
            let epsom = FertilizerDefinition::new(
                "Epsom Salt",
                &[(Element::Magnesium, 9.9), (Element::Sulphur, 13.0)],
            );
            let sulphur = p.authoritative(Element::Sulphur).unwrap();
            let c = cap(&epsom, sulphur.element.unwrap(), uncapped, &p, 25.0);
            assert!(c.rate >= 0.0);
            assert!(c.rate <= uncapped);
        }
    }

    #[test]
    fn would_exceed_boundary() {
        let p = profile();
        let nitrate_only = FertilizerDefinition::new("Nitrate", &[(Element::Nitrate, 10.0)]);
        // Exactly 15 ppm of headroom
        let limit_rate = 15.0 * 100.0 * 2.4 / 10.0;
        assert!(would_exceed(&nitrate_only, limit_rate, &p, |_| 0.0, 25.0).is_none());

        let over = would_exceed(&nitrate_only, limit_rate + 0.01, &p, |_| 0.0, 25.0).unwrap();
        assert_eq!(over.element, Element::Nitrate);
        assert!(over.deviation_percent > 25.0);

        // Other selections count against the headroom
        assert!(would_exceed(&nitrate_only, limit_rate, &p, |_| 1.0, 25.0).is_some());
    }

    #[test]
    fn aggregate_sums_across_all_targets() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);

        let mut selections = SelectionSet::new();
        selections.set(&ca.name, 0, "Super Fine Ag Lime", 240.0);
        selections.set("Sulphur (KCl)", 0, "Natural Gypsum", 120.0);

        let agg = engine.aggregate(&selections, &ca);
        // 240*40/100/2.4 + 120*20/100/2.4
        assert_close(agg.total_added_ppm, 40.0 + 10.0);
        assert_close(agg.new_level, 999.0);
    }

    #[test]
    fn aggregate_is_order_independent() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);

        let picks = vec![
            FertilizerSelection::new(&ca.name, "Super Fine Ag Lime", 300.0),
            FertilizerSelection::new("Sulphur (KCl)", "Natural Gypsum", 150.0),
            FertilizerSelection::new(&ca.name, "Calcium Nitrate", 75.5),
            FertilizerSelection::new(&ca.name, "Not A Product", 75.5),
        ];
        let forward = engine.aggregate(&SelectionSet::from_selections(picks.clone()), &ca);
        let mut reversed_picks = picks;
        reversed_picks.reverse();
        let reversed = engine.aggregate(&SelectionSet::from_selections(reversed_picks), &ca);
        assert_close(forward.total_added_ppm, reversed.total_added_ppm);
    }

    #[test]
    fn recommend_accounts_for_earlier_selectors() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);

        let mut selections = SelectionSet::new();
        selections.set(&ca.name, 0, "Super Fine Ag Lime", 240.0);
        selections.add_slot(&ca.name);

        let first = engine
            .recommend(&ca, "Calcium Chloride", &selections, 0, &p)
            .unwrap();
        let second = engine
            .recommend(&ca, "Calcium Chloride", &selections, 1, &p)
            .unwrap();
        assert_close(first.rate - second.rate, 40.0 * 100.0 * 2.4 / 27.0);
        assert!(engine.recommend(&ca, "Nope", &selections, 0, &p).is_none());
    }

    #[test]
    fn ranked_options_are_sorted_by_priority() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);

        let options = engine.ranked_options(&ca, &p, &SelectionSet::new(), &OptionFilter::default());
        assert!(!options.is_empty());
        assert!(options.windows(2).all(|w| w[0].priority <= w[1].priority));
        assert!(options.iter().all(|o| o.target == Element::Calcium));

        // Calcium Nitrate at pH 6.4 is within its window
        let can = options.iter().find(|o| o.label == "Calcium Nitrate").unwrap();
        assert_eq!(can.priority, OptionPriority::PhCompatible);
    }

    #[test]
    fn ranked_options_exclude_products_used_elsewhere() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);

        let mut selections = SelectionSet::new();
        selections.set("Sulphur (KCl)", 0, "Natural Gypsum", 100.0);
        let filter = OptionFilter {
            release: None,
            search: "gypsum".to_string(),
        };
        let options = engine.ranked_options(&ca, &p, &selections, &filter);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].label, "Nutri-Gyp™ Natural Gypsum");
    }

    #[test]
    fn no_safe_rate_without_ph() {
        let catalog = FertilizerCatalog::from_definitions(vec![FertilizerDefinition::new(
            "Dolomite",
            &[(Element::Calcium, 20.0), (Element::Magnesium, 10.0)],
        )]);
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);
        let options = engine.ranked_options(&ca, &p, &SelectionSet::new(), &OptionFilter::default());
        assert_eq!(options[0].priority, OptionPriority::NoSafeRate);
        assert!(options[0].explanation.contains("Magnesium"));
    }

    #[test]
    fn apply_unknown_label_is_noop() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);

        let mut selections = SelectionSet::new();
        let mut summary = AmendmentsSummary::new();
        assert!(!engine.apply(&mut selections, &mut summary, &ca, 0, "Missing", 10.0));
        assert!(selections.is_empty());
        assert!(summary.is_empty());
    }

    #[test]
    fn apply_and_remove_keep_summary_in_step() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);

        let mut selections = SelectionSet::new();
        let mut summary = AmendmentsSummary::new();
        assert!(engine.apply(&mut selections, &mut summary, &ca, 0, "Super Fine Ag Lime", 240.0));
        assert!(engine.apply(&mut selections, &mut summary, &ca, 0, "Super Fine Ag Lime", 300.0));
        assert_eq!(summary.len(), 1);
        assert_close(summary.entries()[0].actual_nutrient_applied, 120.0);

        assert!(engine.apply(&mut selections, &mut summary, &ca, 0, "Calcium Chloride", 100.0));
        assert_eq!(summary.len(), 1);
        assert_eq!(summary.entries()[0].fertilizer, "Calcium Chloride");

        engine.remove(&mut selections, &mut summary, &ca, 0);
        assert!(summary.is_empty());
        assert!(selections.is_empty());
    }

    #[test]
    fn summary_sums_slots_sharing_a_product() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);

        let mut selections = SelectionSet::new();
        let mut summary = AmendmentsSummary::new();
        engine.apply(&mut selections, &mut summary, &ca, 0, "Super Fine Ag Lime", 100.0);
        engine.apply(&mut selections, &mut summary, &ca, 1, "Super Fine Ag Lime", 200.0);
        assert_eq!(summary.len(), 1);
        assert_close(summary.entries()[0].rate, 300.0);

        let removed = engine.remove(&mut selections, &mut summary, &ca, 1).unwrap();
        assert_close(removed.rate, 200.0);
        assert_eq!(summary.len(), 1);
        assert_close(summary.entries()[0].rate, 100.0);
        assert_close(summary.entries()[0].actual_nutrient_applied, 40.0);
    }

    #[test]
    fn replacing_one_of_two_slots_keeps_the_other_product() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);

        let mut selections = SelectionSet::new();
        let mut summary = AmendmentsSummary::new();
        engine.apply(&mut selections, &mut summary, &ca, 0, "Super Fine Ag Lime", 100.0);
        engine.apply(&mut selections, &mut summary, &ca, 1, "Super Fine Ag Lime", 200.0);
        engine.apply(&mut selections, &mut summary, &ca, 1, "Calcium Chloride", 50.0);

        let labels: Vec<&str> = summary.entries().iter().map(|e| e.fertilizer.as_str()).collect();
        assert_eq!(labels, vec!["Super Fine Ag Lime", "Calcium Chloride"]);
        assert_close(summary.entries()[0].rate, 100.0);
        assert_close(summary.entries()[1].rate, 50.0);

        // Summary always mirrors the selections
        let selected: f64 = selections.iter().map(|s| s.rate).sum();
        let summarized: f64 = summary.entries().iter().map(|e| e.rate).sum();
        assert_close(selected, summarized);
    }

    #[test]
    fn engine_would_exceed_ignores_own_slot() {
        let catalog = FertilizerCatalog::standard();
        let engine = RateEngine::new(&catalog, 25.0);
        let p = profile();
        let ca = calcium(&p);

        let mut selections = SelectionSet::new();
        selections.set(&ca.name, 0, "Calcium Nitrate", 300.0);
        let headroom_rate = 15.0 * 100.0 * 2.4 / 12.0;
        assert!(engine
            .would_exceed("Calcium Nitrate", headroom_rate, &ca, 0, &p, &selections)
            .is_none());
        assert!(engine
            .would_exceed("Calcium Nitrate", headroom_rate, &ca, 1, &p, &selections)
            .is_some());
    }

    #[test]
    fn max_excess_is_clamped() {
        let catalog = FertilizerCatalog::default();
        assert_eq!(RateEngine::new(&catalog, 500.0).max_excess_percent(), 100.0);
        assert_eq!(RateEngine::new(&catalog, 0.0).max_excess_percent(), 5.0);
    }
}
