use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::domain::{AiReport, EvaluationRecord, RecordPatch, Step};
use super::generation::{FailureKind, ReportGenerationError, ReportGenerator};
use super::request::{build_request, ReportRequest};
use super::scoring::{aggregate, ScoreSummary};

const GENERATION_FAILED_MESSAGE: &str =
    "There was an error generating the AI feedback. Please try again.";

/// Forward move refused because required fields on the current step are blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationBlocked {
    pub step: Step,
    pub missing_fields: Vec<&'static str>,
}

/// User-facing notice left behind by a failed generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: FailureKind,
    pub message: String,
    pub detail: String,
}

impl Notice {
    fn from_error(error: &ReportGenerationError) -> Self {
        Self {
            kind: error.kind(),
            message: GENERATION_FAILED_MESSAGE.to_string(),
            detail: error.to_string(),
        }
    }
}

/// Result of an `advance` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    Moved { step: Step },
    Blocked(ValidationBlocked),
    Busy,
    AlreadyAtReport,
    ReportReady,
    GenerationFailed { notice: Notice },
    /// A generation result arrived while no request was in flight.
    Stale,
}

/// First half of an advance: either settled synchronously or waiting on generation.
#[derive(Debug)]
pub enum AdvanceStep {
    Settled(AdvanceOutcome),
    Generate(ReportRequest),
}

/// Finite-state controller for one evaluation session.
pub struct WizardController<G> {
    step: Step,
    record: EvaluationRecord,
    report: Option<AiReport>,
    is_loading: bool,
    notice: Option<Notice>,
    pending_summary: Option<ScoreSummary>,
    generator: Arc<G>,
}

impl<G> WizardController<G>
where
    G: ReportGenerator,
{
    pub fn new(generator: Arc<G>) -> Self {
        Self::starting_on(generator, Local::now().date_naive())
    }

    pub fn starting_on(generator: Arc<G>, today: NaiveDate) -> Self {
        Self {
            step: Step::Identification,
            record: EvaluationRecord::new(today),
            report: None,
            is_loading: false,
            notice: None,
            pending_summary: None,
            generator,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn record(&self) -> &EvaluationRecord {
        &self.record
    }

    pub fn report(&self) -> Option<&AiReport> {
        self.report.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn generator(&self) -> &Arc<G> {
        &self.generator
    }

    /// Write access to the record, closed while generating and on the Report step.
    pub fn record_mut(&mut self) -> Option<&mut EvaluationRecord> {
        if self.is_editable() {
            Some(&mut self.record)
        } else {
            None
        }
    }

    /// Apply a partial update; returns `false` when the record is not editable.
    pub fn apply_patch(&mut self, patch: RecordPatch) -> bool {
        match self.record_mut() {
            Some(record) => {
                record.apply(patch);
                true
            }
            None => false,
        }
    }

    pub fn is_editable(&self) -> bool {
        !self.is_loading && !self.step.is_terminal()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.step.missing_fields(&self.record)
    }

    pub fn can_advance(&self) -> bool {
        !self.is_loading && !self.step.is_terminal() && self.step.is_complete(&self.record)
    }

    /// Move forward one step, generating the report when leaving Commitment.
    pub async fn advance(&mut self) -> AdvanceOutcome {
        match self.begin_advance() {
            AdvanceStep::Settled(outcome) => outcome,
            AdvanceStep::Generate(request) => {
                let generator = Arc::clone(&self.generator);
                let pending = PendingGeneration {
                    controller: Some(self),
                };
                let result = generator.generate(&request).await;
                pending.settle(result)
            }
        }
    }

    /// Synchronous part of `advance`. Entering Report sets the loading flag and hands back the
    /// request; the caller must pass the generator's result to [`Self::complete_generation`].
    pub fn begin_advance(&mut self) -> AdvanceStep {
        if self.is_loading {
            return AdvanceStep::Settled(AdvanceOutcome::Busy);
        }

        let Some(next) = self.step.next() else {
            return AdvanceStep::Settled(AdvanceOutcome::AlreadyAtReport);
        };

        let missing_fields = self.missing_fields();
        if !missing_fields.is_empty() {
            debug!(step = ?self.step, ?missing_fields, "advance blocked");
            return AdvanceStep::Settled(AdvanceOutcome::Blocked(ValidationBlocked {
                step: self.step,
                missing_fields,
            }));
        }

        if next.is_terminal() {
            let summary = aggregate(&self.record);
            let request = build_request(&self.record, &summary);

            self.step = Step::Report;
            self.report = None;
            self.notice = None;
            self.is_loading = true;
            self.pending_summary = Some(summary);

            info!(
                average_score = summary.average_score,
                classification = %summary.classification,
                "requesting feedback report"
            );
            return AdvanceStep::Generate(request);
        }

        debug!(from = ?self.step, to = ?next, "advancing");
        self.step = next;
        AdvanceStep::Settled(AdvanceOutcome::Moved { step: next })
    }

    /// Settle an in-flight generation whose caller went away before the result arrived.
    pub fn abandon_generation(&mut self) -> AdvanceOutcome {
        self.complete_generation(Err(ReportGenerationError::abandoned()))
    }

    /// Settle an in-flight generation started by [`Self::begin_advance`].
    pub fn complete_generation(
        &mut self,
        result: Result<AiReport, ReportGenerationError>,
    ) -> AdvanceOutcome {
        let Some(summary) = self.pending_summary.take() else {
            warn!("generation result arrived with no request in flight");
            return AdvanceOutcome::Stale;
        };
        self.is_loading = false;

        let result = result.and_then(|report| {
            if report.action_plan.is_empty() {
                Err(ReportGenerationError::MalformedResponse(
                    "actionPlan contains no items".to_string(),
                ))
            } else {
                Ok(report)
            }
        });

        match result {
            Ok(mut report) => {
                report.average_score = summary.average_score;
                report.classification = summary.classification;
                info!(classification = %report.classification, "feedback report ready");
                self.report = Some(report);
                AdvanceOutcome::ReportReady
            }
            Err(error) => {
                warn!(error = %error, "feedback report generation failed");
                let notice = Notice::from_error(&error);
                self.step = Step::Commitment;
                self.report = None;
                self.notice = Some(notice.clone());
                AdvanceOutcome::GenerationFailed { notice }
            }
        }
    }

    /// Step back one position. No-op at Identification, on Report, or while loading.
    pub fn retreat(&mut self) -> Step {
        if self.is_loading || self.step.is_terminal() {
            return self.step;
        }
        if let Some(previous) = self.step.previous() {
            debug!(from = ?self.step, to = ?previous, "retreating");
            self.step = previous;
        }
        self.step
    }

    pub fn can_reset(&self) -> bool {
        !self.is_loading && (self.report.is_some() || self.notice.is_some())
    }

    /// Start a new evaluation dated today. Only allowed once a report exists or after a
    /// failed attempt.
    pub fn reset(&mut self) -> bool {
        self.reset_on(Local::now().date_naive())
    }

    pub fn reset_on(&mut self, today: NaiveDate) -> bool {
        if !self.can_reset() {
            return false;
        }
        info!("starting a new evaluation");
        self.step = Step::Identification;
        self.record = EvaluationRecord::new(today);
        self.report = None;
        self.notice = None;
        self.is_loading = false;
        self.pending_summary = None;
        true
    }
}

/// Holds the controller across the generation await. Dropped unsettled, it returns the
/// session to Commitment so the evaluator can retry.
struct PendingGeneration<'a, G: ReportGenerator> {
    controller: Option<&'a mut WizardController<G>>,
}

impl<G: ReportGenerator> PendingGeneration<'_, G> {
    fn settle(mut self, result: Result<AiReport, ReportGenerationError>) -> AdvanceOutcome {
        match self.controller.take() {
            Some(controller) => controller.complete_generation(result),
            None => AdvanceOutcome::Stale,
        }
    }
}

impl<G: ReportGenerator> Drop for PendingGeneration<'_, G> {
    fn drop(&mut self) {
        if let Some(controller) = self.controller.take() {
            controller.abandon_generation();
        }
    }
}
