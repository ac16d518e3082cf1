use crate::models::fertilizer::{FertilizerDefinition, ReleaseType};
use crate::models::nutrient::Element;
use std::collections::HashSet;

use Element::{
    Ammonium as NH4, Boron as B, Calcium as Ca, Cobalt as Co, Copper as Cu, Iron as Fe,
    Magnesium as Mg, Manganese as Mn, Molybdenum as Mo, Nitrate as NO3, Phosphorus as P,
    Potassium as K, Sodium as Na, Sulphur as S, Urea as UR, Zinc as Zn,
};
use ReleaseType::{Fast, Moderate, Slow, VerySlow};

type Row = (
    &'static str,
    &'static [(Element, f64)],
    Option<f64>,
    Option<f64>,
    Option<ReleaseType>,
);

const HUMIC_BLEND: &[(Element, f64)] = &[
    (NO3, 0.1),
    (NH4, 0.1),
    (Ca, 0.1),
    (Mg, 0.1),
    (K, 0.1),
    (P, 0.1),
    (S, 0.1),
];

#[rustfmt::skip]
const STANDARD_ROWS: &[Row] = &[
    ("Urea", &[(NH4, 46.0)], None, None, None),
    ("Calcium Nitrate", &[(Ca, 17.0), (NO3, 12.0)], None, Some(7.5), Some(Fast)),
    ("Potassium Nitrate", &[(K, 39.0), (NO3, 14.0)], None, None, Some(Fast)),
    ("Sodium Nitrate (Chile Nitrate)", &[(Na, 26.0), (NO3, 16.0)], None, Some(8.0), Some(Fast)),
    ("Zinc Nitrate", &[(Zn, 12.0), (NO3, 8.0)], None, None, Some(Fast)),
    ("Iron Nitrate", &[(Fe, 6.0), (NO3, 10.0)], None, None, Some(Fast)),
    ("Copper Nitrate", &[(Cu, 8.0), (NO3, 12.0)], None, None, Some(Fast)),
    ("Ammonium Nitrate", &[(NH4, 17.0), (NO3, 17.0)], Some(5.5), Some(7.5), Some(Fast)),
    ("UAN Solution (Urea Ammonium Nitrate)", &[(UR, 18.0), (NH4, 9.0), (NO3, 9.0)], Some(5.5), Some(7.5), Some(Fast)),
    ("Calcium Ammonium Nitrate (CAN)", &[(Ca, 8.0), (Mg, 2.0), (NH4, 13.0), (NO3, 13.0)], Some(5.5), Some(7.5), Some(Fast)),
    ("Ammonium Polyphosphate (APP)", &[(P, 10.0), (NH4, 11.0)], Some(5.5), Some(8.0), Some(Fast)),
    ("Ammonium Chloride", &[(NH4, 25.0)], Some(5.0), Some(7.0), Some(Fast)),
    ("Ammonium Acetate", &[(NH4, 12.0)], Some(5.0), Some(8.5), Some(Fast)),
    ("Triple Superphosphate (TSP)", &[(P, 45.0), (Ca, 19.0)], Some(5.5), Some(7.5), Some(Fast)),
    ("Monoammonium Phosphate (MAP)", &[(P, 21.9), (NH4, 10.0)], Some(6.5), Some(8.5), Some(Fast)),
    ("Diammonium Phosphate (DAP)", &[(P, 20.0), (NH4, 18.0)], Some(5.0), Some(6.8), Some(Fast)),
    ("Rock Phosphate", &[(P, 25.0), (Ca, 30.0)], None, Some(6.0), Some(VerySlow)),
    ("Agricultural Limestone (CaCO₃)", &[(Ca, 40.0)], None, Some(6.5), Some(Slow)),
    ("Bone Meal", &[(Ca, 26.0), (P, 14.0)], None, Some(7.0), Some(Slow)),
    ("Fish Bone Meal", &[(Ca, 20.0), (P, 10.0), (NH4, 5.0)], Some(5.0), Some(7.5), Some(Slow)),
    ("Calcium Chloride", &[(Ca, 27.0)], None, None, Some(Fast)),
    ("Muriate of Potash (Potassium Chloride)", &[(K, 60.0)], Some(5.5), Some(8.5), Some(Fast)),
    ("Langbeinite", &[(K, 22.0), (Mg, 11.0), (S, 22.0)], Some(5.5), Some(8.0), Some(Moderate)),
    ("Potassium Magnesium Sulfate", &[(K, 22.0), (Mg, 11.0), (S, 22.0)], Some(5.5), Some(8.0), Some(Moderate)),
    ("Potassium Thiosulfate", &[(K, 25.0), (S, 17.0)], Some(5.0), Some(8.0), Some(Fast)),
    ("Potassium Carbonate", &[(K, 55.0)], Some(5.5), Some(7.5), Some(Fast)),
    ("Potassium Acetate", &[(K, 25.0)], Some(5.5), Some(8.0), Some(Fast)),
    ("Wood Ash", &[(K, 5.0), (Ca, 10.0), (Mg, 2.0), (P, 1.0)], Some(5.0), Some(7.0), Some(Slow)),
    ("Dolomitic Lime", &[(Ca, 20.0), (Mg, 10.0)], None, Some(6.5), Some(Slow)),
    ("Kieserite (Magnesium Sulfate Monohydrate)", &[(Mg, 16.0), (S, 22.0)], None, None, Some(Moderate)),
    ("Epsom Salt (Magnesium Sulfate Heptahydrate)", &[(Mg, 9.9), (S, 13.0)], None, None, Some(Fast)),
    ("Thermophosphate", &[(Ca, 20.0), (Mg, 2.0), (P, 18.0)], Some(5.5), Some(7.5), Some(Slow)),
    ("Magnesium Nitrate", &[(Mg, 10.5), (NO3, 11.0)], Some(5.5), Some(8.0), Some(Fast)),
    ("Magnesium Chloride", &[(Mg, 12.0)], Some(5.0), Some(8.0), Some(Fast)),
    ("Sulfur-Rich Compost", &[(S, 2.0), (Ca, 3.0), (Mg, 2.0), (K, 2.0), (P, 1.0), (NH4, 2.0)], Some(5.0), Some(8.0), Some(Slow)),
    ("Elemental Sulfur", &[(S, 90.0)], None, None, Some(VerySlow)),
    ("Ammonium Sulfate", &[(NH4, 21.0), (S, 24.0)], Some(5.0), Some(8.5), Some(Fast)),
    ("Potassium Sulfate (Sulfate of Potash)", &[(K, 42.5), (S, 18.4)], Some(5.0), Some(8.5), Some(Fast)),
    ("Ammonium Thiosulfate", &[(S, 26.0), (NH4, 12.0)], Some(5.0), Some(8.5), Some(Moderate)),
    ("Sulfur-Coated Urea", &[(S, 15.0), (NH4, 35.0)], Some(5.0), Some(8.0), Some(Slow)),
    ("Chicken Manure", &[(P, 2.5), (NH4, 3.0), (K, 2.0), (Ca, 3.0), (Mg, 1.0), (S, 0.5)], Some(5.0), Some(8.0), Some(Slow)),
    ("NTS Fast Fulvic™", HUMIC_BLEND, Some(4.0), Some(12.0), Some(Fast)),
    ("NTS Fulvic Acid Powder™", HUMIC_BLEND, Some(4.0), Some(12.0), Some(Fast)),
    ("NTS FulvX™ Powder", HUMIC_BLEND, Some(4.0), Some(12.0), Some(Fast)),
    ("NTS Liquid Humus™", HUMIC_BLEND, Some(4.0), Some(12.0), Some(Fast)),
    ("NTS Soluble Humate Granules™", HUMIC_BLEND, Some(4.0), Some(12.0), Some(Fast)),
    ("NTS Super Soluble Humates™", HUMIC_BLEND, Some(4.0), Some(12.0), Some(Fast)),
    ("Life Force® Carbon™", HUMIC_BLEND, Some(4.0), Some(12.0), Some(Slow)),
    ("Life Force Gold™", &[(Ca, 9.8), (K, 2.4), (NH4, 2.0), (P, 1.55), (S, 4.0)], None, None, Some(Moderate)),
    ("NTS Soft Rock™", &[(Ca, 20.0), (P, 9.0)], None, None, Some(Slow)),
    ("Nutri-Gyp™ Natural Gypsum", &[(Ca, 19.0), (S, 15.0)], Some(4.5), Some(8.4), Some(Moderate)),
    ("Nutri-Cal™", &[(K, 2.5), (Mg, 3.26), (S, 4.63)], None, None, Some(Fast)),
    ("Nutri-Phos Super Active™", &[(Ca, 28.9), (P, 12.6)], Some(6.0), Some(7.0), Some(Slow)),
    ("Soluble Boron™", &[(B, 22.0)], Some(5.0), Some(8.0), Some(Fast)),
    ("Boric Acid™", &[(B, 17.5)], Some(5.5), Some(8.5), Some(Moderate)),
    ("Borax", &[(B, 14.0)], None, None, Some(Moderate)),
    ("Cobalt Sulfate Heptahydrate", &[(Co, 21.0)], None, None, Some(Fast)),
    ("Copper Sulfate", &[(Cu, 25.0)], None, None, Some(Fast)),
    ("Dolomite", &[(Ca, 20.0), (Mg, 10.0)], None, None, Some(Slow)),
    ("Gran Am", &[(NH4, 20.0), (S, 24.0)], None, None, Some(Fast)),
    ("Granulated Boric Acid", &[(B, 17.5)], None, None, Some(Moderate)),
    ("Granulated Copper Sulfate", &[(Cu, 25.0)], None, None, Some(Fast)),
    ("Granulated Zinc Mono", &[(Zn, 35.0)], None, None, Some(Fast)),
    ("Guano", &[(Ca, 30.0), (P, 13.0)], None, None, Some(Slow)),
    ("Iron Sulfate", &[(Fe, 18.0)], None, None, Some(Fast)),
    ("Magnesite", &[(Mg, 27.0)], None, None, Some(Slow)),
    ("Magnesium Oxide", &[(Mg, 53.0)], None, None, Some(Slow)),
    ("Magnesium Sulfate", &[(Mg, 9.9), (S, 13.0)], None, None, Some(Fast)),
    ("Manganese Sulfate", &[(Mn, 31.0)], None, None, Some(Fast)),
    ("Mono Potassium Phosphate (MKP)", &[(K, 28.0), (P, 22.0)], None, None, Some(Fast)),
    ("Natural Gypsum", &[(Ca, 20.0), (S, 15.0)], None, None, Some(Moderate)),
    ("NTS Stabilised Boron Granules™", &[(B, 3.3)], None, None, Some(Moderate)),
    ("Sodium Molybdate", &[(Mo, 39.0)], None, None, Some(Fast)),
    ("Super Fine Ag Lime", &[(Ca, 40.0)], None, None, Some(Slow)),
    ("Zinc Sulfate Heptahydrate", &[(Zn, 22.0), (S, 11.0)], None, None, Some(Fast)),
    ("Zinc Sulfate Monohydrate", &[(Zn, 34.0), (S, 15.0)], None, None, Some(Fast)),
];

const DESCRIPTIONS: &[(&str, &str)] = &[
    ("Urea", "A highly concentrated nitrogen fertilizer that promotes vigorous vegetative growth and rapid green-up in crops."),
    ("NTS Fast Fulvic™", "An 8 % fulvic acid liquid possessing a myriad of yield-enhancing qualities."),
    ("NTS Fulvic Acid Powder™", "Fulvic acid in a concentrated, soluble powder, the most versatile and productive input in agriculture, in freight-friendly form."),
    ("NTS FulvX™ Powder", "Concentrated soluble fulvic & humic acid."),
    ("NTS Liquid Humus™", "A liquid humic acid suspension derived from premium humates, designed to improve soil structure, nutrient retention, and biological activity."),
    ("NTS Soluble Humate Granules™", "High-purity, fully soluble humate granules for use in liquid formulations or direct soil application to enhance CEC, nutrient chelation, and microbial health."),
    ("NTS Super Soluble Humates™", "Highly refined, super-soluble humic acid powder for preparing DIY liquid humus, boosting nutrient efficiency, and stimulating beneficial soil microbes."),
];

const URLS: &[(&str, &str)] = &[(
    "NTS Soft Rock™",
    "https://nutri-tech.com.au/collections/composted-fertilisers/products/nts-soft-rock",
)];

fn build_row(row: &Row) -> FertilizerDefinition {
    let (label, content, min_ph, max_ph, release) = *row;
    let mut def = FertilizerDefinition::new(label, content);
    if min_ph.is_some() || max_ph.is_some() || release.is_some() {
        def = def.with_ph_window(min_ph, max_ph);
    }
    if let Some(release) = release {
        def = def.with_release(release);
    }
    if let Some((_, description)) = DESCRIPTIONS.iter().find(|(l, _)| *l == label) {
        def = def.with_description(*description);
    }
    if let Some((_, url)) = URLS.iter().find(|(l, _)| *l == label) {
        def = def.with_url(*url);
    }
    def
}

/// Fertilizer definitions keyed by unique label, in table order.
#[derive(Debug, Clone, Default)]
pub struct FertilizerCatalog {
    definitions: Vec<FertilizerDefinition>,
}

impl FertilizerCatalog {
    pub fn standard() -> Self {
        let catalog = Self::from_definitions(STANDARD_ROWS.iter().map(build_row));
        tracing::info!("Loaded fertilizer catalog with {} products", catalog.len());
        catalog
    }

    /// First occurrence of a label wins; later duplicates are dropped.
    pub fn from_definitions(defs: impl IntoIterator<Item = FertilizerDefinition>) -> Self {
        let mut seen = HashSet::new();
        let definitions = defs
            .into_iter()
            .filter(|d| seen.insert(d.label.clone()))
            .collect();
        Self { definitions }
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn all(&self) -> &[FertilizerDefinition] {
        &self.definitions
    }

    pub fn get(&self, label: &str) -> Option<&FertilizerDefinition> {
        self.definitions.iter().find(|d| d.label == label)
    }

    /// Release type (None = all) and case-insensitive label search.
    pub fn filter<'a>(
        &'a self,
        element: Option<Element>,
        release: Option<ReleaseType>,
        search: &'a str,
    ) -> impl Iterator<Item = &'a FertilizerDefinition> {
        let needle = search.trim().to_lowercase();
        self.definitions.iter().filter(move |d| {
            element.is_none_or(|e| d.contains(e))
                && release.is_none_or(|r| d.release_type == Some(r))
                && (needle.is_empty() || d.label.to_lowercase().contains(&needle))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_contents() {
        let catalog = FertilizerCatalog::standard();
        assert_eq!(catalog.len(), STANDARD_ROWS.len());

        let can = catalog.get("Calcium Nitrate").unwrap();
        assert!((can.percent(Element::Calcium) - 17.0).abs() < 1e-9);
        assert!((can.percent(Element::Nitrate) - 12.0).abs() < 1e-9);
        assert_eq!(can.release_type, Some(ReleaseType::Fast));
        assert_eq!(can.ph_window.unwrap().max_ph, Some(7.5));

        let urea = catalog.get("Urea").unwrap();
        assert!(urea.ph_window.is_none());
        assert!(urea.release_type.is_none());
        assert!(urea.description.is_some());

        assert!(catalog.get("NTS Soft Rock™").unwrap().url.is_some());
        assert!(catalog.get("Unobtainium").is_none());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let catalog = FertilizerCatalog::from_definitions(vec![
            FertilizerDefinition::new("Gypsum", &[(Element::Calcium, 19.0)]),
            FertilizerDefinition::new("Borax", &[(Element::Boron, 14.0)]),
            FertilizerDefinition::new("Gypsum", &[(Element::Calcium, 99.0)]),
        ]);
        assert_eq!(catalog.len(), 2);
        assert!((catalog.get("Gypsum").unwrap().percent(Element::Calcium) - 19.0).abs() < 1e-9);
    }

    #[test]
    fn filter_by_element_release_and_search() {
        let catalog = FertilizerCatalog::standard();
        let boron: Vec<_> = catalog.filter(Some(Element::Boron), None, "").collect();
        assert!(!boron.is_empty());
        assert!(boron.iter().all(|d| d.contains(Element::Boron)));

        let slow_calcium: Vec<_> = catalog
            .filter(Some(Element::Calcium), Some(ReleaseType::Slow), "")
            .collect();
        assert!(!slow_calcium.is_empty());
        assert!(slow_calcium
            .iter()
            .all(|d| d.release_type == Some(ReleaseType::Slow)));

        let gypsum: Vec<_> = catalog.filter(None, None, "GYPSUM").collect();
        assert_eq!(gypsum.len(), 2);
    }
}
