use crate::error::{ReportError, Result};
use crate::models::{Nutrient, PaddockInfo, RawNutrient, SoilProfile, StatusThresholds};
use serde::Deserialize;
use std::path::Path;

/// Client for the PDF extraction service.
pub struct ExtractionClient {
    client: reqwest::Client,
    base_url: String,
    thresholds: StatusThresholds,
}

// Extraction service response structures
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtractionResponse {
    Analyses { analyses: Vec<RawAnalysis> },
    Single { nutrients: Vec<RawNutrient> },
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    info: Option<PaddockInfo>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    nutrients: Vec<RawNutrient>,
}

/// One paddock's worth of readings, merged across report pages.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedAnalysis {
    pub key: String,
    pub info: PaddockInfo,
    pub profile: SoilProfile,
}

fn known(value: Option<String>) -> Option<String> {
    value.filter(|v| {
        let v = v.trim();
        !v.is_empty() && !v.eq_ignore_ascii_case("unknown")
    })
}

/// Parse an extraction response body. Analyses sharing a paddock name are
/// merged in report order.
pub fn parse_extraction(body: &str, thresholds: StatusThresholds) -> Result<Vec<ExtractedAnalysis>> {
    let response: ExtractionResponse = serde_json::from_str(body)?;

    let analyses = match response {
        ExtractionResponse::Single { nutrients } => vec![RawAnalysis {
            info: None,
            name: None,
            nutrients,
        }],
        ExtractionResponse::Analyses { analyses } => analyses,
    };

    let mut merged: Vec<ExtractedAnalysis> = Vec::new();
    for (idx, analysis) in analyses.into_iter().enumerate() {
        let mut info = analysis.info.unwrap_or_default();
        info.paddock = known(info.paddock.take());
        info.crop = known(info.crop.take());
        info.sample_date = known(info.sample_date.take());

        if analysis.nutrients.is_empty() && info.paddock.is_none() && analysis.name.is_none() {
            tracing::debug!("Skipping empty analysis {}", idx + 1);
            continue;
        }

        let key = info
            .paddock
            .clone()
            .or_else(|| known(analysis.name.clone()))
            .unwrap_or_else(|| format!("Analysis {}", idx + 1));
        let nutrients = analysis
            .nutrients
            .iter()
            .filter(|raw| !raw.name.trim().is_empty())
            .map(|raw| Nutrient::from_raw(raw, thresholds));

        match merged.iter_mut().find(|a| a.key == key) {
            Some(existing) => existing.profile.nutrients.extend(nutrients),
            None => merged.push(ExtractedAnalysis {
                key,
                info,
                profile: SoilProfile::new(nutrients.collect()),
            }),
        }
    }

    if merged.iter().all(|a| a.profile.is_empty()) {
        return Err(ReportError::InvalidData(
            "No nutrient readings found in report".into(),
        ));
    }

    tracing::info!(
        "Parsed {} analyses with {} readings",
        merged.len(),
        merged.iter().map(|a| a.profile.nutrients.len()).sum::<usize>()
    );
    Ok(merged)
}

impl ExtractionClient {
    pub fn new(base_url: impl Into<String>, thresholds: StatusThresholds) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            thresholds,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload a soil or leaf test PDF and parse the analyses it contains.
    pub async fn extract(&self, pdf: &Path) -> Result<Vec<ExtractedAnalysis>> {
        let body = self.extract_raw(pdf).await?;
        parse_extraction(&body, self.thresholds)
    }

    /// Upload a PDF and return the service's JSON body untouched.
    pub async fn extract_raw(&self, pdf: &Path) -> Result<String> {
        let bytes = tokio::fs::read(pdf).await?;
        let file_name = pdf
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report.pdf".into());

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let url = format!("{}/extract-soil-report", self.base_url);
        tracing::info!("Uploading {} to {}", pdf.display(), url);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ReportError::DataSourceUnavailable(format!("Extraction service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::DataSourceUnavailable(format!(
                "Extraction service returned {}: {}",
                status, body
            )));
        }

        response.text().await.map_err(|e| {
            ReportError::DataSourceUnavailable(format!("Failed to read extraction response: {}", e))
        })
    }

    /// Test connection to the extraction service
    pub async fn test_connection(&self) -> Result<bool> {
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| ReportError::DataSourceUnavailable(format!("Extraction service: {}", e)))?;

        Ok(!response.status().is_server_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Element, NutrientCategory, NutrientStatus};

    #[test]
    fn parses_legacy_single_analysis() {
        let body = r#"{"nutrients": [
            {"name": "Calcium (Mehlich III)", "current": "949", "ideal": 1520.5, "unit": "ppm"},
            {"name": "Boron (Hot CaCl2)", "current": "<0.1", "ideal": "2", "unit": "ppm"}
        ]}"#;
        let analyses = parse_extraction(body, StatusThresholds::STANDARD).unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].key, "Analysis 1");

        let boron = &analyses[0].profile.nutrients[1];
        assert_eq!(boron.current, 0.0);
        assert_eq!(boron.element, Some(Element::Boron));
        assert_eq!(boron.status, NutrientStatus::Low);
    }

    #[test]
    fn merges_analyses_by_paddock() {
        let body = r#"{"analyses": [
            {"id": 1, "info": {"paddock": "North", "crop": "Wheat", "date": "2024-03-01"},
             "nutrients": [{"name": "Calcium (Mehlich III)", "current": 900, "ideal": 1500}]},
            {"id": 2, "info": {"paddock": "South", "crop": "Unknown"},
             "nutrients": [{"name": "Zinc (DTPA)", "current": 2, "ideal": 6}]},
            {"id": 3, "info": {"paddock": "North"},
             "nutrients": [{"name": "Calcium TAE", "current": 4000, "ideal": 3000, "category": "tae"}]}
        ]}"#;
        let analyses = parse_extraction(body, StatusThresholds::STANDARD).unwrap();
        assert_eq!(analyses.len(), 2);

        let north = &analyses[0];
        assert_eq!(north.key, "North");
        assert_eq!(north.info.sample_date.as_deref(), Some("2024-03-01"));
        assert_eq!(north.profile.nutrients.len(), 2);
        assert_eq!(north.profile.nutrients[1].category, NutrientCategory::Tae);

        assert_eq!(analyses[1].info.crop, None);
    }

    #[test]
    fn service_ids_are_ignored() {
        let body = r#"{"analyses": [
            {"id": "a-17", "info": {"paddock": "East"},
             "nutrients": [{"name": "Zinc (DTPA)", "current": 2, "ideal": 6}]},
            {"id": {"page": 2}, "info": {"paddock": "East"},
             "nutrients": [{"name": "Boron (Hot CaCl2)", "current": 1, "ideal": 2}]}
        ]}"#;
        let analyses = parse_extraction(body, StatusThresholds::STANDARD).unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].key, "East");
        assert_eq!(analyses[0].profile.nutrients.len(), 2);
    }

    #[test]
    fn unnamed_paddock_falls_back_to_position() {
        let body = r#"{"analyses": [
            {"id": 1, "info": {"paddock": "Unknown"},
             "nutrients": [{"name": "Calcium", "current": 900, "ideal": 1500}]}
        ]}"#;
        let analyses = parse_extraction(body, StatusThresholds::STANDARD).unwrap();
        assert_eq!(analyses[0].key, "Analysis 1");
    }

    #[test]
    fn rejects_reports_without_readings() {
        assert!(parse_extraction(r#"{"nutrients": []}"#, StatusThresholds::STANDARD).is_err());
        assert!(parse_extraction("not json", StatusThresholds::STANDARD).is_err());
    }

    #[test]
    fn client_trims_base_url() {
        let client = ExtractionClient::new("http://localhost:5000/", StatusThresholds::STANDARD);
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
