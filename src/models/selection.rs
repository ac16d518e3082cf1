use crate::models::fertilizer::FertilizerDefinition;
use crate::models::nutrient::Element;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user's choice of product and rate, made under one target nutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FertilizerSelection {
    pub nutrient: String,
    pub fert_label: String,
    /// kg/ha of product
    pub rate: f64,
}

impl FertilizerSelection {
    pub fn new(nutrient: impl Into<String>, fert_label: impl Into<String>, rate: f64) -> Self {
        Self {
            nutrient: nutrient.into(),
            fert_label: fert_label.into(),
            rate: rate.max(0.0),
        }
    }
}

/// Selector slots grouped under their target nutrient. A slot may be empty
/// (no product chosen yet).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionSet {
    slots: BTreeMap<String, Vec<Option<FertilizerSelection>>>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_selections(selections: impl IntoIterator<Item = FertilizerSelection>) -> Self {
        let mut set = Self::new();
        for selection in selections {
            set.slots
                .entry(selection.nutrient.clone())
                .or_default()
                .push(Some(selection));
        }
        set
    }

    /// Add an empty selector under `nutrient`; returns its slot index.
    pub fn add_slot(&mut self, nutrient: &str) -> usize {
        let slots = self.slots.entry(nutrient.to_string()).or_default();
        slots.push(None);
        slots.len() - 1
    }

    pub fn slots(&self, nutrient: &str) -> &[Option<FertilizerSelection>] {
        self.slots.get(nutrient).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn slot_count(&self, nutrient: &str) -> usize {
        self.slots(nutrient).len()
    }

    /// Fill (or replace) a slot. Out-of-range indexes append.
    pub fn set(&mut self, nutrient: &str, index: usize, fert_label: &str, rate: f64) -> usize {
        let selection = FertilizerSelection::new(nutrient, fert_label, rate);
        let slots = self.slots.entry(nutrient.to_string()).or_default();
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = Some(selection);
                index
            }
            None => {
                slots.push(Some(selection));
                slots.len() - 1
            }
        }
    }

    pub fn set_rate(&mut self, nutrient: &str, index: usize, rate: f64) -> bool {
        match self
            .slots
            .get_mut(nutrient)
            .and_then(|slots| slots.get_mut(index))
            .and_then(Option::as_mut)
        {
            Some(selection) => {
                selection.rate = rate.max(0.0);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, nutrient: &str, index: usize) -> Option<FertilizerSelection> {
        let slots = self.slots.get_mut(nutrient)?;
        if index >= slots.len() {
            return None;
        }
        let removed = slots.remove(index);
        if slots.is_empty() {
            self.slots.remove(nutrient);
        }
        removed
    }

    /// Filled selections made under `nutrient`, with their slot index.
    pub fn for_nutrient<'a>(
        &'a self,
        nutrient: &str,
    ) -> impl Iterator<Item = (usize, &'a FertilizerSelection)> + 'a {
        self.slots(nutrient)
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|s| (idx, s)))
    }

    /// Every filled selection across all target nutrients.
    pub fn iter(&self) -> impl Iterator<Item = &FertilizerSelection> {
        self.slots.values().flatten().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

/// One materialized line of the soil amendments summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoilAmendmentEntry {
    pub fertilizer: String,
    pub nutrient: String,
    /// kg/ha of product
    pub rate: f64,
    /// kg/ha of the target nutrient actually supplied
    pub actual_nutrient_applied: f64,
    pub unit: String,
    pub contains: Vec<String>,
}

impl SoilAmendmentEntry {
    pub fn new(fertilizer: &FertilizerDefinition, nutrient: &str, target: Element, rate: f64) -> Self {
        Self {
            fertilizer: fertilizer.label.clone(),
            nutrient: nutrient.to_string(),
            rate,
            actual_nutrient_applied: rate * fertilizer.percent(target) / 100.0,
            unit: "kg/ha".to_string(),
            contains: fertilizer
                .elements()
                .map(|(e, _)| e.as_str().to_string())
                .collect(),
        }
    }
}

/// Total applied per nutrient with a per-product breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NutrientTotal {
    pub total: f64,
    pub sources: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AmendmentsSummary {
    entries: Vec<SoilAmendmentEntry>,
}

impl AmendmentsSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for (fertilizer, nutrient) or append a new one.
    pub fn upsert(&mut self, entry: SoilAmendmentEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.fertilizer == entry.fertilizer && e.nutrient == entry.nutrient)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, fertilizer: &str, nutrient: &str) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.fertilizer == fertilizer && e.nutrient == nutrient));
        self.entries.len() != before
    }

    pub fn entries(&self) -> &[SoilAmendmentEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn totals(&self) -> BTreeMap<String, NutrientTotal> {
        let mut totals: BTreeMap<String, NutrientTotal> = BTreeMap::new();
        for entry in &self.entries {
            let total = totals.entry(entry.nutrient.clone()).or_default();
            total.total += entry.actual_nutrient_applied;
            *total.sources.entry(entry.fertilizer.clone()).or_default() +=
                entry.actual_nutrient_applied;
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gypsum() -> FertilizerDefinition {
        FertilizerDefinition::new(
            "Natural Gypsum",
            &[(Element::Calcium, 20.0), (Element::Sulphur, 15.0)],
        )
    }

    #[test]
    fn slots_and_selections() {
        let mut set = SelectionSet::new();
        assert_eq!(set.add_slot("Calcium"), 0);
        assert_eq!(set.add_slot("Calcium"), 1);
        assert!(set.is_empty());

        set.set("Calcium", 1, "Natural Gypsum", 500.0);
        set.set("Sulphur", 0, "Elemental Sulfur", 50.0);
        assert_eq!(set.iter().count(), 2);
        assert_eq!(set.for_nutrient("Calcium").next().unwrap().0, 1);

        assert!(set.set_rate("Calcium", 1, 250.0));
        assert!(!set.set_rate("Calcium", 0, 250.0));
        assert!((set.slots("Calcium")[1].as_ref().unwrap().rate - 250.0).abs() < 1e-9);

        let removed = set.remove("Sulphur", 0).unwrap();
        assert_eq!(removed.fert_label, "Elemental Sulfur");
        assert_eq!(set.slot_count("Sulphur"), 0);
        assert!(set.remove("Sulphur", 0).is_none());
    }

    #[test]
    fn negative_rates_clamp_to_zero() {
        let s = FertilizerSelection::new("Calcium", "Natural Gypsum", -10.0);
        assert_eq!(s.rate, 0.0);
    }

    #[test]
    fn amendment_entry_values() {
        let entry = SoilAmendmentEntry::new(&gypsum(), "Calcium", Element::Calcium, 500.0);
        assert!((entry.actual_nutrient_applied - 100.0).abs() < 1e-9);
        assert_eq!(entry.unit, "kg/ha");
        assert_eq!(entry.contains, vec!["Calcium", "Sulphur"]);
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut summary = AmendmentsSummary::new();
        let entry = SoilAmendmentEntry::new(&gypsum(), "Calcium", Element::Calcium, 500.0);
        summary.upsert(entry.clone());
        summary.upsert(entry.clone());
        assert_eq!(summary.len(), 1);

        summary.upsert(SoilAmendmentEntry::new(&gypsum(), "Calcium", Element::Calcium, 300.0));
        assert_eq!(summary.len(), 1);
        assert!((summary.entries()[0].rate - 300.0).abs() < 1e-9);

        summary.upsert(SoilAmendmentEntry::new(&gypsum(), "Sulphur", Element::Sulphur, 300.0));
        assert_eq!(summary.len(), 2);
        assert!(summary.remove("Natural Gypsum", "Sulphur"));
        assert!(!summary.remove("Natural Gypsum", "Sulphur"));
    }

    #[test]
    fn totals_group_by_nutrient() {
        let mut summary = AmendmentsSummary::new();
        summary.upsert(SoilAmendmentEntry::new(&gypsum(), "Calcium", Element::Calcium, 500.0));
        let lime = FertilizerDefinition::new("Super Fine Ag Lime", &[(Element::Calcium, 40.0)]);
        summary.upsert(SoilAmendmentEntry::new(&lime, "Calcium", Element::Calcium, 100.0));

        let totals = summary.totals();
        let calcium = &totals["Calcium"];
        assert!((calcium.total - 140.0).abs() < 1e-9);
        assert_eq!(calcium.sources.len(), 2);
        assert!((calcium.sources["Super Fine Ag Lime"] - 40.0).abs() < 1e-9);
    }
}
