/// 1 ppm in the sampled soil layer equals 2.4 kg/ha.
pub const PPM_TO_KG_HA: f64 = 2.4;

/// Tolerance when comparing a projected level against its allowed maximum.
pub const EXCESS_EPSILON: f64 = 1e-6;

/// Corrections within this many percent of target count as on target.
pub const PROGRESS_BAND_PERCENT: f64 = 25.0;

pub const DEFAULT_MAX_EXCESS_PERCENT: f64 = 25.0;
pub const MIN_MAX_EXCESS_PERCENT: f64 = 5.0;
pub const MAX_MAX_EXCESS_PERCENT: f64 = 100.0;

pub fn ppm_to_kg_ha(ppm: f64) -> f64 {
    ppm * PPM_TO_KG_HA
}

pub fn kg_ha_to_ppm(kg_ha: f64) -> f64 {
    kg_ha / PPM_TO_KG_HA
}

/// Product rate (kg/ha) that delivers `ppm` of an element present at `percent`.
pub fn product_rate_for_ppm(ppm: f64, percent: f64) -> f64 {
    if percent > 0.0 {
        ppm * 100.0 * PPM_TO_KG_HA / percent
    } else {
        0.0
    }
}

/// ppm of an element delivered by `rate` kg/ha of a product at `percent`.
pub fn ppm_from_product_rate(rate: f64, percent: f64) -> f64 {
    rate * percent / 100.0 / PPM_TO_KG_HA
}

/// Highest level tolerated before a correction counts as overshoot.
pub fn max_allowed_level(ideal: f64, max_excess_percent: f64) -> f64 {
    ideal * (1.0 + max_excess_percent / 100.0)
}

/// Signed deviation from ideal as a percentage.
pub fn deviation_percent(current: f64, ideal: f64) -> f64 {
    (current - ideal) / ideal * 100.0
}

pub fn clamp_max_excess(percent: f64) -> f64 {
    if percent.is_finite() {
        percent.clamp(MIN_MAX_EXCESS_PERCENT, MAX_MAX_EXCESS_PERCENT)
    } else {
        DEFAULT_MAX_EXCESS_PERCENT
    }
}
