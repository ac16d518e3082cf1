use crate::logic::calculations::deviation_percent;
use crate::models::nutrient::{Element, NutrientStatus};
use crate::models::profile::SoilProfile;
use regex_lite::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Used when the report carries no Ca/Mg ratio of its own.
pub const DEFAULT_CA_MG_IDEAL: f64 = 3.35;

const BALANCED_BAND_PERCENT: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioDef {
    pub label: &'static str,
    pub numerator: Element,
    pub denominator: Element,
    pub explanation: &'static str,
}

pub const RATIOS: &[(RatioDef, Option<f64>)] = &[
    (
        RatioDef {
            label: "Ca/Mg",
            numerator: Element::Calcium,
            denominator: Element::Magnesium,
            explanation: "The Ca/Mg ratio is the most important factor in high production fertility. When ideal levels are achieved, there will be maximum nutrient availability, optimum soil structure, and luxury levels of oxygen.",
        },
        None,
    ),
    (
        RatioDef {
            label: "Mg/K",
            numerator: Element::Magnesium,
            denominator: Element::Potassium,
            explanation: "The Mg/K ratio indicates likely availability of both these minerals, and is also a guideline to phosphate uptake.",
        },
        Some(7.0),
    ),
    (
        RatioDef {
            label: "K/Na",
            numerator: Element::Potassium,
            denominator: Element::Sodium,
            explanation: "The K/Na ratio is indicative of potassium availability and sodium excesses. When this ratio is inverted, the plant will take up sodium instead of potassium.",
        },
        Some(1.0),
    ),
    (
        RatioDef {
            label: "Ca/K",
            numerator: Element::Calcium,
            denominator: Element::Potassium,
            explanation: "The Ca/K ratio relates to crop quality. When potassium is high in relation to calcium, the uptake of calcium is retarded, and vice versa.",
        },
        Some(5.0),
    ),
    (
        RatioDef {
            label: "P/Zn",
            numerator: Element::Phosphorus,
            denominator: Element::Zinc,
            explanation: "The P/Zn ratio relates to leaf size and plant sugar production. Each of these minerals can retard availability of the other if the 10:1 ratio is not maintained.",
        },
        Some(10.0),
    ),
    (
        RatioDef {
            label: "Fe/Mn",
            numerator: Element::Iron,
            denominator: Element::Manganese,
            explanation: "The Fe/Mn ratio relates to chlorophyll management. If iron is slightly higher than manganese, both elements will be at maximum plant availability.",
        },
        Some(1.1),
    ),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatioReading {
    pub label: &'static str,
    pub value: Option<f64>,
    pub ideal: Option<f64>,
    pub deviation_percent: Option<f64>,
    #[serde(skip)]
    pub explanation: &'static str,
}

impl RatioReading {
    /// Low/High beyond ±25% of the ideal ratio.
    pub fn status(&self) -> Option<NutrientStatus> {
        let deviation = self.deviation_percent?;
        Some(if deviation < -BALANCED_BAND_PERCENT {
            NutrientStatus::Low
        } else if deviation > BALANCED_BAND_PERCENT {
            NutrientStatus::High
        } else {
            NutrientStatus::Optimal
        })
    }
}

/// Names like "Ca/Mg Ratio", "Ca_Mg_Ratio" or "camg ratio".
pub fn is_ca_mg_ratio(name: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)ca[/_\- ]?mg[/_\- ]?ratio").expect("ratio pattern is valid")
    })
    .is_match(name)
}

fn ratio_of(profile: &SoilProfile, numerator: Element, denominator: Element) -> Option<f64> {
    let num = profile.authoritative(numerator)?.current;
    let den = profile.authoritative(denominator)?.current;
    (den != 0.0).then(|| num / den)
}

pub fn nutritional_ratios(profile: &SoilProfile) -> Vec<RatioReading> {
    RATIOS
        .iter()
        .map(|(def, fixed_ideal)| {
            let (value, ideal) = if fixed_ideal.is_none() {
                match profile.nutrients.iter().find(|n| is_ca_mg_ratio(&n.name)) {
                    Some(reported) => (
                        Some(reported.current),
                        Some(reported.target().unwrap_or(DEFAULT_CA_MG_IDEAL)),
                    ),
                    None => (
                        ratio_of(profile, def.numerator, def.denominator),
                        Some(DEFAULT_CA_MG_IDEAL),
                    ),
                }
            } else {
                (ratio_of(profile, def.numerator, def.denominator), *fixed_ideal)
            };

            let deviation = match (value, ideal) {
                (Some(v), Some(i)) if i != 0.0 => Some(deviation_percent(v, i)),
                _ => None,
            };

            RatioReading {
                label: def.label,
                value,
                ideal,
                deviation_percent: deviation,
                explanation: def.explanation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::nutrient::Nutrient;

    fn find<'a>(readings: &'a [RatioReading], label: &str) -> &'a RatioReading {
        readings.iter().find(|r| r.label == label).unwrap()
    }

    #[test]
    fn computes_ratios_from_authoritative_readings() {
        let profile = SoilProfile::new(vec![
            Nutrient::new("Calcium (Mehlich III)", 1000.0, 1500.0, "ppm"),
            Nutrient::new("Magnesium (Mehlich III)", 200.0, 200.0, "ppm"),
            Nutrient::new("Potassium (Mehlich III)", 100.0, 150.0, "ppm"),
            Nutrient::new("Iron (DTPA)", 0.0, 40.0, "ppm"),
        ]);
        let readings = nutritional_ratios(&profile);
        assert_eq!(readings.len(), 6);

        let ca_mg = find(&readings, "Ca/Mg");
        assert!((ca_mg.value.unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(ca_mg.ideal, Some(DEFAULT_CA_MG_IDEAL));
        assert_eq!(ca_mg.status(), Some(NutrientStatus::High));

        let mg_k = find(&readings, "Mg/K");
        assert!((mg_k.value.unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(mg_k.status(), Some(NutrientStatus::Low));

        // No sodium, no manganese
        assert_eq!(find(&readings, "K/Na").value, None);
        assert_eq!(find(&readings, "Fe/Mn").deviation_percent, None);
    }

    #[test]
    fn reported_ca_mg_ratio_wins() {
        let profile = SoilProfile::new(vec![
            Nutrient::new("Calcium (Mehlich III)", 1000.0, 1500.0, "ppm"),
            Nutrient::new("Magnesium (Mehlich III)", 200.0, 200.0, "ppm"),
            Nutrient::new("Ca/Mg Ratio", 3.5, 4.0, ""),
        ]);
        let ca_mg = find(&nutritional_ratios(&profile), "Ca/Mg").clone();
        assert_eq!(ca_mg.value, Some(3.5));
        assert_eq!(ca_mg.ideal, Some(4.0));
        assert_eq!(ca_mg.status(), Some(NutrientStatus::Optimal));
    }

    #[test]
    fn zero_denominator_yields_no_value() {
        let profile = SoilProfile::new(vec![
            Nutrient::new("Phosphorus (Mehlich III)", 50.0, 60.0, "ppm"),
            Nutrient::new("Zinc (DTPA)", 0.0, 6.0, "ppm"),
        ]);
        assert_eq!(find(&nutritional_ratios(&profile), "P/Zn").value, None);
    }

    #[test]
    fn ratio_name_matching() {
        assert!(is_ca_mg_ratio("Ca/Mg Ratio"));
        assert!(is_ca_mg_ratio("ca_mg_ratio"));
        assert!(is_ca_mg_ratio("CaMg Ratio"));
        assert!(!is_ca_mg_ratio("Calcium"));
    }
}
