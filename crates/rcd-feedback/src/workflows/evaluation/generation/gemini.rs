use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{parse_feedback, ReportGenerationError, ReportGenerator};
use crate::config::{ConfigError, GenerationConfig};
use crate::workflows::evaluation::domain::AiReport;
use crate::workflows::evaluation::request::ReportRequest;

const ERROR_BODY_PREVIEW: usize = 512;

/// Adapter for the Generative Language `generateContent` endpoint using JSON-mode output.
pub struct GeminiReportClient {
    http: Client,
    endpoint: String,
    model: String,
    api_key: SecretString,
}

impl GeminiReportClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, ConfigError> {
        let api_key = config.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            model: config.model.clone(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(request: &ReportRequest) -> serde_json::Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.brief }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.output_contract,
            }
        })
    }
}

impl fmt::Debug for GeminiReportClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiReportClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ReportGenerator for GeminiReportClient {
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn generate(&self, request: &ReportRequest) -> Result<AiReport, ReportGenerationError> {
        debug!(brief_len = request.brief.len(), "submitting report brief");

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "report service unreachable");
                ReportGenerationError::ServiceUnavailable(err.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| ReportGenerationError::ServiceUnavailable(err.to_string()))?;

        if !status.is_success() {
            warn!(%status, "report service rejected the request");
            return Err(ReportGenerationError::ServiceUnavailable(format!(
                "status {status}: {}",
                preview(&body)
            )));
        }

        let text = extract_text(&body)?;
        let report = parse_feedback(&text, &request.summary)?;
        info!(
            action_items = report.action_plan.len(),
            "report service returned structured feedback"
        );
        Ok(report)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: Option<String>,
}

fn extract_text(body: &str) -> Result<String, ReportGenerationError> {
    let envelope: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| ReportGenerationError::MalformedResponse(err.to_string()))?;

    let candidate = envelope.candidates.into_iter().next().ok_or_else(|| {
        ReportGenerationError::MalformedResponse("response contained no candidates".to_string())
    })?;
    let finish_reason = candidate.finish_reason.unwrap_or_default();

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ReportGenerationError::MalformedResponse(format!(
            "candidate carried no text (finish reason '{finish_reason}')"
        )));
    }

    Ok(text)
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_PREVIEW) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(extract_text(body).expect("text present"), "{\"a\":1}");
    }

    #[test]
    fn extract_text_rejects_empty_candidates() {
        let err = extract_text(r#"{"candidates":[]}"#).expect_err("no candidates");
        assert!(matches!(err, ReportGenerationError::MalformedResponse(_)));
    }

    #[test]
    fn extract_text_reports_finish_reason_when_blocked() {
        let body = r#"{"candidates":[{"finishReason":"SAFETY"}]}"#;
        match extract_text(body) {
            Err(ReportGenerationError::MalformedResponse(message)) => {
                assert!(message.contains("SAFETY"));
            }
            other => panic!("expected malformed response, got {other:?}"),
        }
    }

    #[test]
    fn preview_truncates_long_bodies() {
        let body = "x".repeat(ERROR_BODY_PREVIEW * 2);
        assert_eq!(preview(&body).len(), ERROR_BODY_PREVIEW);
        assert_eq!(preview("short"), "short");
    }
}
