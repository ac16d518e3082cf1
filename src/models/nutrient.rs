use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Canonical nutrient identity, resolved once when a lab record is ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    Nitrogen,
    Nitrate,
    Ammonium,
    Urea,
    Phosphorus,
    Potassium,
    Calcium,
    Magnesium,
    Sodium,
    Sulphur,
    Iron,
    Copper,
    Manganese,
    Boron,
    Zinc,
    Cobalt,
    Molybdenum,
    Silicon,
    Aluminium,
}

impl Element {
    pub fn as_str(&self) -> &'static str {
        match self {
            Element::Nitrogen => "Nitrogen",
            Element::Nitrate => "Nitrate",
            Element::Ammonium => "Ammonium",
            Element::Urea => "Urea",
            Element::Phosphorus => "Phosphorus",
            Element::Potassium => "Potassium",
            Element::Calcium => "Calcium",
            Element::Magnesium => "Magnesium",
            Element::Sodium => "Sodium",
            Element::Sulphur => "Sulphur",
            Element::Iron => "Iron",
            Element::Copper => "Copper",
            Element::Manganese => "Manganese",
            Element::Boron => "Boron",
            Element::Zinc => "Zinc",
            Element::Cobalt => "Cobalt",
            Element::Molybdenum => "Molybdenum",
            Element::Silicon => "Silicon",
            Element::Aluminium => "Aluminium",
        }
    }

    pub fn abbrev(&self) -> &'static str {
        match self {
            Element::Nitrogen => "N",
            Element::Nitrate => "NO3",
            Element::Ammonium => "NH4",
            Element::Urea => "Urea",
            Element::Phosphorus => "P",
            Element::Potassium => "K",
            Element::Calcium => "Ca",
            Element::Magnesium => "Mg",
            Element::Sodium => "Na",
            Element::Sulphur => "S",
            Element::Iron => "Fe",
            Element::Copper => "Cu",
            Element::Manganese => "Mn",
            Element::Boron => "B",
            Element::Zinc => "Zn",
            Element::Cobalt => "Co",
            Element::Molybdenum => "Mo",
            Element::Silicon => "Si",
            Element::Aluminium => "Al",
        }
    }

    /// "Calcium (Ca)"
    pub fn labelled(&self) -> String {
        format!("{} ({})", self.as_str(), self.abbrev())
    }

    pub fn all() -> &'static [Element] {
        &[
            Element::Nitrogen,
            Element::Nitrate,
            Element::Ammonium,
            Element::Urea,
            Element::Phosphorus,
            Element::Potassium,
            Element::Calcium,
            Element::Magnesium,
            Element::Sodium,
            Element::Sulphur,
            Element::Iron,
            Element::Copper,
            Element::Manganese,
            Element::Boron,
            Element::Zinc,
            Element::Cobalt,
            Element::Molybdenum,
            Element::Silicon,
            Element::Aluminium,
        ]
    }

    /// Exact name or symbol, case-insensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "nitrogen" | "n" => Some(Element::Nitrogen),
            "nitrate" | "no3" => Some(Element::Nitrate),
            "ammonium" | "nh4" => Some(Element::Ammonium),
            "urea" => Some(Element::Urea),
            "phosphorus" | "p" => Some(Element::Phosphorus),
            "potassium" | "k" => Some(Element::Potassium),
            "calcium" | "ca" => Some(Element::Calcium),
            "magnesium" | "mg" => Some(Element::Magnesium),
            "sodium" | "na" => Some(Element::Sodium),
            "sulphur" | "sulfur" | "s" => Some(Element::Sulphur),
            "iron" | "fe" => Some(Element::Iron),
            "copper" | "cu" => Some(Element::Copper),
            "manganese" | "mn" => Some(Element::Manganese),
            "boron" | "b" => Some(Element::Boron),
            "zinc" | "zn" => Some(Element::Zinc),
            "cobalt" | "co" => Some(Element::Cobalt),
            "molybdenum" | "mo" => Some(Element::Molybdenum),
            "silicon" | "silica" | "si" => Some(Element::Silicon),
            "aluminium" | "aluminum" | "al" => Some(Element::Aluminium),
            _ => None,
        }
    }

    /// Resolve a lab label such as `"Calcium (Mehlich III)"`, `"Nitrate-N (KCl)"`,
    /// `"Ca - Calcium"`, `"Base Saturation Potassium"` or `"Boron_Hot_CaCl2"`.
    pub fn resolve(name: &str) -> Option<Self> {
        let lower = name.trim().to_lowercase();

        // Leaf report labels: "Ca - Calcium"
        if let Some((symbol, full)) = lower.split_once(" - ") {
            return Self::from_str(full).or_else(|| Self::from_str(symbol));
        }

        if let Some(e) = Self::from_str(&lower) {
            return Some(e);
        }

        let stripped = ["base saturation ", "lamotte ", "tae "]
            .iter()
            .find_map(|prefix| lower.strip_prefix(prefix))
            .unwrap_or(&lower);

        let first = stripped
            .split(|c: char| c.is_whitespace() || matches!(c, '(' | '-' | '_'))
            .find(|token| !token.is_empty())?;

        // Single-letter symbols only count when they are the whole label
        if first.len() <= 2 && first != stripped {
            return None;
        }
        Self::from_str(first)
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extraction method, in authority order: earlier variants win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TestMethod {
    Mehlich3,
    Kcl,
    Dtpa,
    HotCaCl2,
    CaCl2,
    Leco,
    Calc,
    Water1To5,
    LaMotte,
    Tae,
}

impl TestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestMethod::Mehlich3 => "Mehlich III",
            TestMethod::Kcl => "KCl",
            TestMethod::Dtpa => "DTPA",
            TestMethod::HotCaCl2 => "Hot CaCl2",
            TestMethod::CaCl2 => "CaCl2",
            TestMethod::Leco => "LECO",
            TestMethod::Calc => "Calc",
            TestMethod::Water1To5 => "1:5 water",
            TestMethod::LaMotte => "LaMotte",
            TestMethod::Tae => "TAE",
        }
    }

    pub fn detect(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        let patterns = [
            ("(mehlich iii)", TestMethod::Mehlich3),
            ("(kcl)", TestMethod::Kcl),
            ("(dtpa)", TestMethod::Dtpa),
            ("(hot cacl2)", TestMethod::HotCaCl2),
            ("(cacl2)", TestMethod::CaCl2),
            ("(leco)", TestMethod::Leco),
            ("(calc)", TestMethod::Calc),
            ("(1:5 water)", TestMethod::Water1To5),
            ("lamotte", TestMethod::LaMotte),
            ("tae", TestMethod::Tae),
        ];
        patterns
            .iter()
            .find(|(pattern, _)| lower.contains(pattern))
            .map(|(_, method)| *method)
    }

    /// Primary (Albrecht) extraction methods, as opposed to LaMotte/Reams and TAE.
    pub fn is_primary(&self) -> bool {
        !matches!(self, TestMethod::LaMotte | TestMethod::Tae)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientCategory {
    #[default]
    #[serde(alias = "albrecht", alias = "albrecht_mehlich_kcl")]
    Soil,
    BaseSaturation,
    #[serde(alias = "lamotte")]
    LamotteReams,
    Tae,
}

impl NutrientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientCategory::Soil => "Soil",
            NutrientCategory::BaseSaturation => "Base Saturation",
            NutrientCategory::LamotteReams => "LaMotte/Reams",
            NutrientCategory::Tae => "TAE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "soil" | "albrecht" | "albrecht_mehlich_kcl" => Some(NutrientCategory::Soil),
            "base_saturation" | "base saturation" => Some(NutrientCategory::BaseSaturation),
            "lamotte_reams" | "lamotte" => Some(NutrientCategory::LamotteReams),
            "tae" => Some(NutrientCategory::Tae),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientStatus {
    Low,
    Optimal,
    High,
}

impl NutrientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NutrientStatus::Low => "Deficient",
            NutrientStatus::Optimal => "Optimal",
            NutrientStatus::High => "Excessive",
        }
    }

    pub fn color(&self) -> ratatui::style::Color {
        use ratatui::style::Color;
        match self {
            NutrientStatus::Low => Color::Red,
            NutrientStatus::Optimal => Color::Green,
            NutrientStatus::High => Color::Blue,
        }
    }
}

impl std::fmt::Display for NutrientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Multipliers of the ideal below/above which a reading is low/high.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusThresholds {
    pub low: f64,
    pub high: f64,
}

impl StatusThresholds {
    pub const STANDARD: StatusThresholds = StatusThresholds {
        low: 0.9,
        high: 1.1,
    };
    pub const WIDE: StatusThresholds = StatusThresholds {
        low: 0.75,
        high: 1.25,
    };

    pub fn classify(
        &self,
        current: f64,
        ideal: Option<f64>,
        range: Option<IdealRange>,
    ) -> NutrientStatus {
        if let Some(range) = range {
            return if current < range.low {
                NutrientStatus::Low
            } else if current > range.high {
                NutrientStatus::High
            } else {
                NutrientStatus::Optimal
            };
        }
        match ideal.filter(|i| is_valid_ideal(*i)) {
            Some(ideal) if current < self.low * ideal => NutrientStatus::Low,
            Some(ideal) if current > self.high * ideal => NutrientStatus::High,
            _ => NutrientStatus::Optimal,
        }
    }
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

pub fn is_valid_ideal(ideal: f64) -> bool {
    ideal.is_finite() && ideal > 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IdealRange {
    pub low: f64,
    pub high: f64,
}

impl IdealRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Parse `"99 - 124 ppm"`. `"N/A"` and unparseable strings give `None`.
    pub fn parse(s: &str) -> Option<Self> {
        static RANGE_RE: OnceLock<Regex> = OnceLock::new();
        let re = RANGE_RE.get_or_init(|| {
            Regex::new(r"(\d+\.?\d*)\s*-\s*(\d+\.?\d*)").expect("range pattern is valid")
        });
        if s.trim().eq_ignore_ascii_case("n/a") {
            return None;
        }
        let caps = re.captures(s)?;
        let low = caps[1].parse::<f64>().ok()?;
        let high = caps[2].parse::<f64>().ok()?;
        Some(Self { low, high })
    }

    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    /// Leaf tests target the "luxury" top of the range for P, Ca, Mg and B.
    pub fn leaf_ideal(&self, element: Option<Element>) -> f64 {
        match element {
            Some(Element::Phosphorus | Element::Calcium | Element::Magnesium | Element::Boron) => {
                self.high
            }
            _ => self.midpoint(),
        }
    }
}

/// Lab values arrive as numbers or strings; `"<0.5"` and other non-numeric
/// strings read as zero.
pub fn parse_lab_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.starts_with('<') {
                Some(0.0)
            } else {
                Some(s.parse::<f64>().unwrap_or(0.0))
            }
        }
        _ => None,
    }
}

/// A nutrient record as returned by the extraction service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNutrient {
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    #[serde(default)]
    pub current: serde_json::Value,
    #[serde(default)]
    pub ideal: serde_json::Value,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default, alias = "ideal_range")]
    pub ideal_range: Option<[f64; 2]>,
    #[serde(default)]
    pub category: Option<String>,
}

impl RawNutrient {
    /// Leaf reports tag records as `"leaf"` or label them `"Ca - Calcium"`.
    pub fn is_leaf_reading(&self) -> bool {
        let tagged = self
            .category
            .as_deref()
            .is_some_and(|c| c.trim().eq_ignore_ascii_case("leaf"));
        tagged || self.name.contains(" - ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrient {
    pub name: String,
    pub generic_name: String,
    pub element: Option<Element>,
    pub current: f64,
    pub ideal: Option<f64>,
    pub unit: String,
    pub range: Option<IdealRange>,
    pub category: NutrientCategory,
    pub status: NutrientStatus,
}

impl Nutrient {
    pub fn new(name: impl Into<String>, current: f64, ideal: f64, unit: impl Into<String>) -> Self {
        let name = name.into();
        let element = Element::resolve(&name);
        let generic_name = element
            .map(|e| e.as_str().to_string())
            .unwrap_or_else(|| name.clone());
        let ideal = Some(ideal).filter(|i| is_valid_ideal(*i));
        let current = if current.is_finite() { current } else { 0.0 };
        Self {
            status: StatusThresholds::STANDARD.classify(current, ideal, None),
            name,
            generic_name,
            element,
            current,
            ideal,
            unit: unit.into(),
            range: None,
            category: NutrientCategory::Soil,
        }
    }

    pub fn with_category(mut self, category: NutrientCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_range(mut self, range: IdealRange, thresholds: StatusThresholds) -> Self {
        self.range = Some(range);
        self.reclassify(thresholds);
        self
    }

    pub fn from_raw(raw: &RawNutrient, thresholds: StatusThresholds) -> Self {
        let element = raw
            .generic_name
            .as_deref()
            .and_then(Element::resolve)
            .or_else(|| Element::resolve(&raw.name));

        let generic_name = raw
            .generic_name
            .clone()
            .or_else(|| element.map(|e| e.as_str().to_string()))
            .unwrap_or_else(|| raw.name.clone());

        let range = raw
            .ideal_range
            .map(|[low, high]| IdealRange::new(low, high))
            .or_else(|| raw.range.as_deref().and_then(IdealRange::parse));

        let current = parse_lab_value(&raw.current)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0);
        let leaf = raw.is_leaf_reading();
        let ideal = parse_lab_value(&raw.ideal)
            .filter(|i| is_valid_ideal(*i))
            .or_else(|| {
                range
                    .map(|r| if leaf { r.leaf_ideal(element) } else { r.midpoint() })
                    .filter(|i| is_valid_ideal(*i))
            });

        let category = raw
            .category
            .as_deref()
            .and_then(NutrientCategory::from_str)
            .unwrap_or_default();

        Self {
            name: raw.name.clone(),
            generic_name,
            element,
            current,
            ideal,
            unit: raw.unit.clone().unwrap_or_default(),
            range,
            category,
            status: thresholds.classify(current, ideal, range),
        }
    }

    pub fn reclassify(&mut self, thresholds: StatusThresholds) {
        self.status = thresholds.classify(self.current, self.ideal, self.range);
    }

    /// The ideal, when it is usable as a requirement.
    pub fn target(&self) -> Option<f64> {
        self.ideal.filter(|i| is_valid_ideal(*i))
    }

    pub fn method(&self) -> Option<TestMethod> {
        TestMethod::detect(&self.name)
    }

    pub fn deviation_fraction(&self) -> Option<f64> {
        self.target().map(|ideal| (self.current - ideal) / ideal)
    }

    pub fn deviation_percent(&self) -> Option<f64> {
        self.deviation_fraction().map(|d| d * 100.0)
    }

    pub fn is_ph(&self) -> bool {
        let lower = self.name.trim().to_lowercase();
        lower == "ph"
            || ["ph-", "ph ", "ph(", "ph_"]
                .iter()
                .any(|prefix| lower.starts_with(prefix))
    }
}
