//! Performance evaluation wizard: record, scoring, report generation, and session hosting.
//!
//! The controller owns one session's record and report. Scores are aggregated locally and
//! the external collaborator only contributes the R.C.D. narrative and the action plan.

pub mod controller;
pub mod domain;
pub mod generation;
pub mod report;
pub mod request;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use controller::{AdvanceOutcome, AdvanceStep, Notice, ValidationBlocked, WizardController};
pub use domain::{
    ActionPlanItem, AiReport, BlockKind, BlockPatch, Classification, EvaluationRecord,
    RecordPatch, Score, ScoreOutOfRange, ScoredBlock, Step,
};
pub use generation::{
    parse_feedback, FailureKind, GeminiReportClient, ReportGenerationError, ReportGenerator,
};
pub use report::{render_text, BlockScoreEntry, ReportView};
pub use request::{build_request, output_contract, ReportRequest};
pub use router::evaluation_router;
pub use scoring::{aggregate, aggregate_scores, ScoreSummary};
pub use service::{
    evaluate_record, AdvanceResponse, EvaluationService, SessionError, SessionId, SessionSnapshot,
    DEFAULT_SESSION_IDLE_TIMEOUT,
};
