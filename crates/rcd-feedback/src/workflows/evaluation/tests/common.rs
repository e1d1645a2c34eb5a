use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::Notify;

use crate::workflows::evaluation::domain::{
    ActionPlanItem, AiReport, Classification, EvaluationRecord, Score,
};
use crate::workflows::evaluation::generation::{
    parse_feedback, ReportGenerationError, ReportGenerator,
};
use crate::workflows::evaluation::request::ReportRequest;
use crate::workflows::evaluation::{
    evaluation_router, EvaluationService, RecordPatch, SessionId, WizardController,
};

pub(super) fn session_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date")
}

pub(super) fn score(value: u8) -> Score {
    Score::new(value).expect("score within range")
}

pub(super) fn completed_record() -> EvaluationRecord {
    let mut record = EvaluationRecord::new(session_date());
    record.employee_name = "Dr. Ana Souza".to_string();
    record.role = "Orthodontist".to_string();
    record.period = "Last 30 days".to_string();
    record.deliveries.narrative = "Completed every aligner case on schedule".to_string();
    record.deliveries.score = score(5);
    record.attitude.narrative = "Owns sterilization protocol audits".to_string();
    record.attitude.score = score(5);
    record.relationship.narrative = "Mentors new assistants".to_string();
    record.relationship.score = score(4);
    record.development.narrative = "Started an implantology course".to_string();
    record.development.score = score(4);
    record.commitment_text = "Finish the implantology course by June".to_string();
    record
}

pub(super) fn action_item(action: &str) -> ActionPlanItem {
    ActionPlanItem {
        action: action.to_string(),
        how: "Weekly checkpoint with the clinical coordinator".to_string(),
        responsible: "Clinical coordinator".to_string(),
        deadline: "30 days".to_string(),
        success_indicator: "Checkpoint notes filed every Friday".to_string(),
    }
}

/// Report as a collaborator might return it, with scores the controller must overwrite.
pub(super) fn upstream_report() -> AiReport {
    AiReport {
        recognition: "Consistent, careful clinical work".to_string(),
        correction: "Charting is sometimes closed late".to_string(),
        direction: "Prepare to lead the implant program".to_string(),
        action_plan: vec![
            action_item("Close charts the same day"),
            action_item("Shadow the implant lead"),
            action_item("Present one case at the monthly meeting"),
        ],
        average_score: 0.5,
        classification: Classification::D,
    }
}

/// Structured text echoing conflicting numbers alongside the contract fields.
pub(super) fn structured_feedback_json() -> &'static str {
    r#"{
        "recognition": "Consistent, careful clinical work",
        "correction": "Charting is sometimes closed late",
        "direction": "Prepare to lead the implant program",
        "averageScore": 1.25,
        "classification": "D",
        "actionPlan": [
            {
                "action": "Close charts the same day",
                "how": "Reserve fifteen minutes after the last patient",
                "responsible": "Dr. Ana Souza",
                "deadline": "30 days",
                "successIndicator": "No open charts in the Friday audit"
            }
        ]
    }"#
}

/// Generator returning a fixed result and counting calls.
pub(super) struct StaticGenerator {
    result: Result<AiReport, ReportGenerationError>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ReportRequest>>,
}

impl StaticGenerator {
    pub(super) fn succeeding() -> Self {
        Self::with_result(Ok(upstream_report()))
    }

    pub(super) fn failing(error: ReportGenerationError) -> Self {
        Self::with_result(Err(error))
    }

    pub(super) fn with_result(result: Result<AiReport, ReportGenerationError>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn last_request(&self) -> Option<ReportRequest> {
        self.last_request.lock().expect("request mutex").clone()
    }
}

#[async_trait]
impl ReportGenerator for StaticGenerator {
    async fn generate(&self, request: &ReportRequest) -> Result<AiReport, ReportGenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().expect("request mutex") = Some(request.clone());
        self.result.clone()
    }
}

/// Generator that parses a canned structured payload, like a real collaborator would.
pub(super) struct EchoGenerator {
    payload: String,
}

impl EchoGenerator {
    pub(super) fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

#[async_trait]
impl ReportGenerator for EchoGenerator {
    async fn generate(&self, request: &ReportRequest) -> Result<AiReport, ReportGenerationError> {
        parse_feedback(&self.payload, &request.summary)
    }
}

/// Generator that parks every call until `release` is invoked.
pub(super) struct GatedGenerator {
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedGenerator {
    pub(super) fn new() -> Self {
        Self {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn release(&self) {
        self.gate.notify_one();
    }

    /// Yield until a generation call is parked on the gate.
    pub(super) async fn wait_for_call(&self) {
        while self.calls() == 0 {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl ReportGenerator for GatedGenerator {
    async fn generate(&self, _request: &ReportRequest) -> Result<AiReport, ReportGenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(upstream_report())
    }
}

pub(super) fn controller<G: ReportGenerator>(generator: Arc<G>) -> WizardController<G> {
    WizardController::starting_on(generator, session_date())
}

/// Controller with a complete record sitting on the Commitment step.
pub(super) async fn controller_at_commitment<G: ReportGenerator>(
    generator: Arc<G>,
) -> WizardController<G> {
    let mut controller = controller(generator);
    *controller.record_mut().expect("editable") = completed_record();
    for _ in 0..5 {
        controller.advance().await;
    }
    controller
}

pub(super) fn router_with(
    generator: StaticGenerator,
) -> (axum::Router, Arc<EvaluationService<StaticGenerator>>) {
    let service = Arc::new(EvaluationService::new(Arc::new(generator)));
    (evaluation_router(service.clone()), service)
}

/// Service holding one session with a complete record, parked on the Commitment step.
pub(super) async fn service_at_commitment<G: ReportGenerator + 'static>(
    service: &EvaluationService<G>,
) -> SessionId {
    let session_id = service.create().expect("session created").session_id;
    let record = completed_record();
    service
        .edit(
            &session_id,
            RecordPatch {
                employee_name: Some(record.employee_name),
                role: Some(record.role),
                commitment_text: Some(record.commitment_text),
                ..RecordPatch::default()
            },
        )
        .expect("record editable");
    for _ in 0..5 {
        service.advance(&session_id).await.expect("session exists");
    }
    session_id
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&body).expect("json body")
}
