use crate::models::nutrient::Element;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const FIELD_UNITS: &[&str] = &[
    "g/ha",
    "ml/ha",
    "kg/ha",
    "L/ha",
    "mL/100L Water",
    "L/100L Water",
    "g/100L Water",
    "kg/100L Water",
];

const SEED_UNITS: &[&str] = &[
    "g/ha",
    "ml/ha",
    "kg/ha",
    "L/ha",
    "L/tonne of seed",
    "kg/tonne of seed",
    "mL/100L Water",
    "L/100L Water",
    "g/100L Water",
    "kg/100L Water",
];

/// Application programs printed alongside the soil corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramKind {
    SeedTreatment,
    SoilDrench,
    FoliarSpray,
}

impl ProgramKind {
    pub const ALL: [ProgramKind; 3] = [
        ProgramKind::SeedTreatment,
        ProgramKind::SoilDrench,
        ProgramKind::FoliarSpray,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ProgramKind::SeedTreatment => "Seed Treatment",
            ProgramKind::SoilDrench => "Biological Fertigation Program",
            ProgramKind::FoliarSpray => "Foliar Spray",
        }
    }

    /// Units a rate may be given in. Seed treatments also allow per-tonne-of-seed.
    pub fn units(&self) -> &'static [&'static str] {
        match self {
            ProgramKind::SeedTreatment => SEED_UNITS,
            ProgramKind::SoilDrench | ProgramKind::FoliarSpray => FIELD_UNITS,
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ProgramKind::SeedTreatment => ProgramKind::SoilDrench,
            ProgramKind::SoilDrench => ProgramKind::FoliarSpray,
            ProgramKind::FoliarSpray => ProgramKind::SeedTreatment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramItem {
    pub id: u32,
    pub product: String,
    pub rate: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub nutrient_content: BTreeMap<Element, f64>,
}

/// An ordered list of products for one program.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductProgram {
    kind: ProgramKind,
    items: Vec<ProgramItem>,
    next_id: u32,
}

impl ProductProgram {
    pub fn new(kind: ProgramKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
            next_id: 0,
        }
    }

    pub fn items(&self) -> &[ProgramItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a product. A blank product, a rate that is not positive, or a
    /// unit outside this program's list is refused.
    pub fn add(
        &mut self,
        product: &str,
        rate: f64,
        unit: &str,
        nutrient_content: BTreeMap<Element, f64>,
    ) -> Option<u32> {
        let product = product.trim();
        if product.is_empty() || !rate.is_finite() || rate <= 0.0 {
            return None;
        }
        if !self.kind.units().contains(&unit) {
            tracing::debug!("Unit {} is not offered for {}", unit, self.kind.title());
            return None;
        }
        self.next_id = self
            .next_id
            .max(self.items.iter().map(|i| i.id).max().unwrap_or(0))
            + 1;
        let id = self.next_id;
        self.items.push(ProgramItem {
            id,
            product: product.to_string(),
            rate,
            unit: unit.to_string(),
            nutrient_content,
        });
        Some(id)
    }

    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }
}

/// The three programs kept for a paddock.
#[derive(Debug, Clone, PartialEq)]
pub struct Programs {
    pub seed_treatment: ProductProgram,
    pub soil_drench: ProductProgram,
    pub foliar_spray: ProductProgram,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            seed_treatment: ProductProgram::new(ProgramKind::SeedTreatment),
            soil_drench: ProductProgram::new(ProgramKind::SoilDrench),
            foliar_spray: ProductProgram::new(ProgramKind::FoliarSpray),
        }
    }
}

impl Programs {
    pub fn get(&self, kind: ProgramKind) -> &ProductProgram {
        match kind {
            ProgramKind::SeedTreatment => &self.seed_treatment,
            ProgramKind::SoilDrench => &self.soil_drench,
            ProgramKind::FoliarSpray => &self.foliar_spray,
        }
    }

    pub fn get_mut(&mut self, kind: ProgramKind) -> &mut ProductProgram {
        match kind {
            ProgramKind::SeedTreatment => &mut self.seed_treatment,
            ProgramKind::SoilDrench => &mut self.soil_drench,
            ProgramKind::FoliarSpray => &mut self.foliar_spray,
        }
    }
}
