use crate::error::{ReportError, Result};
use crate::logic::comments::CommentInputs;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Client for the AI comment generation service.
pub struct CommentsClient {
    client: reqwest::Client,
    base_url: String,
    report_ref: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    summary: Option<String>,
}

// Stored comments arrive either as one text or as named report sections
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Explanation {
    Text(String),
    Sections(BTreeMap<String, String>),
}

impl Explanation {
    fn into_text(self) -> String {
        match self {
            Explanation::Text(text) => text,
            Explanation::Sections(sections) => sections
                .into_values()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AiComments {
    #[serde(default)]
    combined_nutrients_explanation: Option<Explanation>,
}

/// Lists that may come back comma-joined or as arrays.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NameList {
    Joined(String),
    List(Vec<String>),
}

impl Default for NameList {
    fn default() -> Self {
        NameList::List(Vec::new())
    }
}

impl NameList {
    fn into_names(self) -> Vec<String> {
        let names = match self {
            NameList::Joined(s) => s.split(',').map(str::to_string).collect(),
            NameList::List(v) => v,
        };
        names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
struct FormData {
    #[serde(default)]
    nutrient_deficient: NameList,
    #[serde(default)]
    nutrient_excess: NameList,
}

#[derive(Debug, Deserialize)]
struct StoredResponse {
    #[serde(default)]
    ai_comments: Option<AiComments>,
    #[serde(default)]
    form_data: Option<FormData>,
    #[serde(default)]
    closest_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentSource {
    Stored,
    Generated,
}

/// Summary text plus the nutrient lists the template paragraphs are built from.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentsSummary {
    pub summary: String,
    pub deficient: Vec<String>,
    pub excess: Vec<String>,
    pub closest_key: Option<String>,
    pub source: CommentSource,
}

pub(crate) fn parse_stored(body: &str) -> Result<CommentsSummary> {
    let stored: StoredResponse = serde_json::from_str(body)?;
    let summary = stored
        .ai_comments
        .and_then(|c| c.combined_nutrients_explanation)
        .map(Explanation::into_text)
        .ok_or_else(|| ReportError::InvalidData("Stored comments carry no explanation".into()))?;
    let form = stored.form_data.unwrap_or_default();
    Ok(CommentsSummary {
        summary,
        deficient: form.nutrient_deficient.into_names(),
        excess: form.nutrient_excess.into_names(),
        closest_key: stored.closest_key,
        source: CommentSource::Stored,
    })
}

impl CommentsClient {
    pub fn new(base_url: impl Into<String>, report_ref: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            report_ref: report_ref.filter(|r| !r.trim().is_empty()),
        }
    }

    pub fn has_stored_comments(&self) -> bool {
        self.report_ref.is_some()
    }

    /// Ask the service to write a summary for the given status buckets.
    pub async fn generate(&self, inputs: &CommentInputs) -> Result<String> {
        let url = format!("{}/generate-comments", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(inputs)
            .send()
            .await
            .map_err(|e| ReportError::DataSourceUnavailable(format!("Comments service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::DataSourceUnavailable(format!(
                "Comments service returned {}: {}",
                status, body
            )));
        }

        let generated: GenerateResponse = response.json().await.map_err(|e| {
            ReportError::DataSourceUnavailable(format!("Failed to parse comments response: {}", e))
        })?;
        generated
            .summary
            .ok_or_else(|| ReportError::InvalidData("Comments response has no summary".into()))
    }

    /// Comments already written for this report and paddock, if any.
    pub async fn fetch_stored(&self, paddock_key: &str) -> Result<Option<CommentsSummary>> {
        let Some(report_ref) = &self.report_ref else {
            return Ok(None);
        };
        let url = format!("{}/api/proxy/get-ai-comments/{}", self.base_url, report_ref);
        let response = self
            .client
            .get(&url)
            .query(&[("key", paddock_key)])
            .send()
            .await
            .map_err(|e| ReportError::DataSourceUnavailable(format!("Comments service: {}", e)))?;

        if !response.status().is_success() {
            tracing::debug!(
                "No stored comments for '{}' ({})",
                paddock_key,
                response.status()
            );
            return Ok(None);
        }

        let body = response.text().await?;
        parse_stored(&body).map(Some)
    }

    /// Test connection to the comments service
    pub async fn test_connection(&self) -> Result<bool> {
        let response = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(|e| ReportError::DataSourceUnavailable(format!("Comments service: {}", e)))?;

        Ok(!response.status().is_server_error())
    }

    /// Stored comments when available, otherwise a freshly generated summary.
    pub async fn fetch(&self, paddock_key: &str, inputs: &CommentInputs) -> Result<CommentsSummary> {
        match self.fetch_stored(paddock_key).await {
            Ok(Some(stored)) => return Ok(stored),
            Ok(None) => {}
            Err(e) => tracing::warn!("Stored comments unavailable: {}", e),
        }

        let summary = self.generate(inputs).await?;
        Ok(CommentsSummary {
            summary,
            deficient: inputs.deficient.clone(),
            excess: inputs.excess.clone(),
            closest_key: None,
            source: CommentSource::Generated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_comments_with_joined_lists() {
        let body = r#"{
            "ai_comments": {"combined_nutrients_explanation": "Calcium is limiting."},
            "form_data": {"nutrient_deficient": "Calcium, Boron,", "nutrient_excess": "Magnesium"},
            "closest_key": "North"
        }"#;
        let stored = parse_stored(body).unwrap();
        assert_eq!(stored.summary, "Calcium is limiting.");
        assert_eq!(stored.deficient, vec!["Calcium", "Boron"]);
        assert_eq!(stored.excess, vec!["Magnesium"]);
        assert_eq!(stored.closest_key.as_deref(), Some("North"));
        assert_eq!(stored.source, CommentSource::Stored);
    }

    #[test]
    fn stored_comments_with_arrays_and_sections() {
        let body = r#"{
            "ai_comments": {"combined_nutrients_explanation": {
                "Available Nutrients": "Phosphorus is low.",
                "Soil pH": "pH is ideal."
            }},
            "form_data": {"nutrient_deficient": ["Phosphorus"], "nutrient_excess": []}
        }"#;
        let stored = parse_stored(body).unwrap();
        assert_eq!(stored.summary, "Phosphorus is low.\n\npH is ideal.");
        assert_eq!(stored.deficient, vec!["Phosphorus"]);
        assert!(stored.excess.is_empty());
    }

    #[test]
    fn stored_comments_need_an_explanation() {
        assert!(parse_stored(r#"{"form_data": {}}"#).is_err());
    }

    #[test]
    fn blank_report_ref_disables_stored_lookup() {
        let client = CommentsClient::new("http://localhost:8000/", Some("  ".into()));
        assert!(!client.has_stored_comments());
        let client = CommentsClient::new("http://localhost:8000", Some("r-42".into()));
        assert!(client.has_stored_comments());
    }
}
