use crate::logic::ratios::RatioReading;
use crate::logic::scoring::HealthScore;
use crate::models::nutrient::Nutrient;
use crate::models::profile::PaddockInfo;
use crate::models::program::ProgramItem;
use crate::models::selection::{NutrientTotal, SoilAmendmentEntry};
use std::collections::BTreeMap;
use crate::models::tank_mix::MixingItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contact details printed on the report footer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Agronomist {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Agronomist {
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty() && self.email.trim().is_empty() && self.phone.trim().is_empty()
    }
}

/// Everything the PDF renderer needs for one paddock.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportExport {
    pub generated_at: DateTime<Utc>,
    pub paddock: PaddockInfo,
    pub nutrients: Vec<Nutrient>,
    pub ratios: Vec<RatioReading>,
    pub recommendations: Vec<SoilAmendmentEntry>,
    /// kg/ha supplied per target nutrient, with each product's share.
    pub nutrient_totals: BTreeMap<String, NutrientTotal>,
    pub tank_mixing: Vec<MixingItem>,
    pub seed_treatment: Vec<ProgramItem>,
    pub soil_drench: Vec<ProgramItem>,
    pub foliar_spray: Vec<ProgramItem>,
    pub plant_health_score: HealthScore,
    #[serde(skip_serializing_if = "Agronomist::is_empty")]
    pub agronomist: Agronomist,
    pub general_comments: String,
}

impl ReportExport {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scoring::overall_score;
    use crate::models::nutrient::Element;
    use crate::models::program::{ProductProgram, ProgramKind};
    use crate::models::tank_mix::TankMix;

    fn export() -> ReportExport {
        let nutrients = vec![Nutrient::new("Calcium (Mehlich III)", 949.0, 1520.5, "ppm")];
        let mut mix = TankMix::new();
        mix.add("Spray Oil");
        let mut drench = ProductProgram::new(ProgramKind::SoilDrench);
        drench.add(
            "Calcium Fulvate",
            1.0,
            "L/ha",
            BTreeMap::from([(Element::Calcium, 10.0)]),
        );
        ReportExport {
            generated_at: Utc::now(),
            paddock: PaddockInfo {
                paddock: Some("North Block".into()),
                ..Default::default()
            },
            plant_health_score: overall_score(&nutrients),
            nutrients,
            ratios: Vec::new(),
            recommendations: Vec::new(),
            nutrient_totals: BTreeMap::new(),
            tank_mixing: mix.items().to_vec(),
            seed_treatment: Vec::new(),
            soil_drench: drench.items().to_vec(),
            foliar_spray: Vec::new(),
            agronomist: Agronomist::default(),
            general_comments: "Balanced nutrition is key.".into(),
        }
    }

    #[test]
    fn serializes_camel_case_keys() {
        let json: serde_json::Value = serde_json::from_str(&export().to_json().unwrap()).unwrap();
        assert!(json.get("generatedAt").is_some());
        assert!(json.get("plantHealthScore").is_some());
        assert_eq!(json["tankMixing"][0]["productDescription"], "Spray Oil");
        assert_eq!(json["tankMixing"][0]["sequence"], 1);
        assert_eq!(json["paddock"]["paddock"], "North Block");
        assert_eq!(json["generalComments"], "Balanced nutrition is key.");
    }

    #[test]
    fn programs_export_as_product_lists() {
        let json: serde_json::Value = serde_json::from_str(&export().to_json().unwrap()).unwrap();
        assert_eq!(json["seedTreatment"], serde_json::json!([]));
        assert_eq!(json["soilDrench"][0]["product"], "Calcium Fulvate");
        assert_eq!(json["soilDrench"][0]["unit"], "L/ha");
        assert_eq!(json["soilDrench"][0]["nutrientContent"]["Calcium"], 10.0);
        assert_eq!(json["foliarSpray"], serde_json::json!([]));
    }

    #[test]
    fn blank_agronomist_is_omitted() {
        let mut report = export();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(json.get("agronomist").is_none());

        report.agronomist.name = "Jo Field".into();
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["agronomist"]["name"], "Jo Field");
    }
}
