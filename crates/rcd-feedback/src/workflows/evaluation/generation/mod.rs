//! Boundary with the external text-generation collaborator.
//!
//! Implementations submit a [`ReportRequest`] and hand back an [`AiReport`]. Only the structured
//! fields of the response are trusted; scores always come from the request's local summary.

mod gemini;

pub use gemini::GeminiReportClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::domain::{ActionPlanItem, AiReport};
use super::request::ReportRequest;
use super::scoring::ScoreSummary;

/// Sends one generation request per call. Retrying is left to the caller.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, request: &ReportRequest) -> Result<AiReport, ReportGenerationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportGenerationError {
    #[error("report service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("report service returned a malformed response: {0}")]
    MalformedResponse(String),
}

impl ReportGenerationError {
    /// The caller stopped waiting before the collaborator answered.
    pub fn abandoned() -> Self {
        Self::ServiceUnavailable("request abandoned before a response arrived".to_string())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ServiceUnavailable(_) => FailureKind::ServiceUnavailable,
            Self::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ServiceUnavailable,
    MalformedResponse,
}

/// Structured object the collaborator is asked to produce.
///
/// Unknown keys, including any score the collaborator computed itself, are dropped.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedFeedback {
    recognition: String,
    correction: String,
    direction: String,
    action_plan: Vec<GeneratedActionItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedActionItem {
    action: String,
    how: String,
    responsible: String,
    deadline: String,
    success_indicator: String,
}

/// Parse the collaborator's structured text into a report scored with `summary`.
pub fn parse_feedback(text: &str, summary: &ScoreSummary) -> Result<AiReport, ReportGenerationError> {
    let feedback: GeneratedFeedback = serde_json::from_str(text)
        .map_err(|err| ReportGenerationError::MalformedResponse(err.to_string()))?;

    for (field, value) in [
        ("recognition", &feedback.recognition),
        ("correction", &feedback.correction),
        ("direction", &feedback.direction),
    ] {
        if value.trim().is_empty() {
            return Err(ReportGenerationError::MalformedResponse(format!(
                "field '{field}' is empty"
            )));
        }
    }

    if feedback.action_plan.is_empty() {
        return Err(ReportGenerationError::MalformedResponse(
            "actionPlan contains no items".to_string(),
        ));
    }

    let action_plan = feedback
        .action_plan
        .into_iter()
        .enumerate()
        .map(|(idx, item)| item.into_domain(idx))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AiReport {
        recognition: feedback.recognition,
        correction: feedback.correction,
        direction: feedback.direction,
        action_plan,
        average_score: summary.average_score,
        classification: summary.classification,
    })
}

impl GeneratedActionItem {
    fn into_domain(self, idx: usize) -> Result<ActionPlanItem, ReportGenerationError> {
        for (field, value) in [
            ("action", &self.action),
            ("how", &self.how),
            ("responsible", &self.responsible),
            ("deadline", &self.deadline),
            ("successIndicator", &self.success_indicator),
        ] {
            if value.trim().is_empty() {
                return Err(ReportGenerationError::MalformedResponse(format!(
                    "actionPlan[{idx}].{field} is empty"
                )));
            }
        }

        Ok(ActionPlanItem {
            action: self.action,
            how: self.how,
            responsible: self.responsible,
            deadline: self.deadline,
            success_indicator: self.success_indicator,
        })
    }
}
