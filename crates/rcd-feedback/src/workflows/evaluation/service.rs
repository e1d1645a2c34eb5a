use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::controller::{AdvanceOutcome, AdvanceStep, Notice, WizardController};
use super::domain::{EvaluationRecord, RecordPatch, Step};
use super::generation::ReportGenerator;
use super::report::ReportView;
use crate::error::AppError;

/// Identifier for an in-memory evaluation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw).map(Self)
    }
}

/// Everything a presentation layer needs to render the current step.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub step: Step,
    pub step_label: &'static str,
    pub step_index: usize,
    pub record: EvaluationRecord,
    pub is_loading: bool,
    pub can_advance: bool,
    pub can_reset: bool,
    pub missing_fields: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl SessionSnapshot {
    fn capture<G: ReportGenerator>(session_id: SessionId, controller: &WizardController<G>) -> Self {
        let step = controller.step();
        Self {
            session_id,
            step,
            step_label: step.label(),
            step_index: step.index(),
            record: controller.record().clone(),
            is_loading: controller.is_loading(),
            can_advance: controller.can_advance(),
            can_reset: controller.can_reset(),
            missing_fields: controller.missing_fields(),
            report: controller
                .report()
                .map(|report| ReportView::new(controller.record(), report)),
            notice: controller.notice().cloned(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvanceResponse {
    #[serde(flatten)]
    pub outcome: AdvanceOutcome,
    pub session: SessionSnapshot,
}

/// Idle time after which an untouched session is dropped from the store.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

struct HostedSession<G> {
    controller: WizardController<G>,
    last_touched: Instant,
}

type SessionMap<G> = HashMap<SessionId, HostedSession<G>>;

/// Hosts independent wizard sessions sharing one report generator.
///
/// Sessions idle for longer than the configured timeout are evicted the next time the store is
/// locked, unless a report is being generated for them.
pub struct EvaluationService<G> {
    generator: Arc<G>,
    idle_timeout: Duration,
    sessions: Mutex<SessionMap<G>>,
}

impl<G> EvaluationService<G>
where
    G: ReportGenerator + 'static,
{
    pub fn new(generator: Arc<G>) -> Self {
        Self::with_idle_timeout(generator, DEFAULT_SESSION_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(generator: Arc<G>, idle_timeout: Duration) -> Self {
        Self {
            generator,
            idle_timeout,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn generator(&self) -> &Arc<G> {
        &self.generator
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionMap<G>>, SessionError> {
        let mut sessions = self.sessions.lock().map_err(|_| SessionError::Unavailable)?;
        let before = sessions.len();
        sessions.retain(|_, session| {
            session.controller.is_loading() || session.last_touched.elapsed() < self.idle_timeout
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "idle evaluation sessions evicted");
        }
        Ok(sessions)
    }

    fn touch<'a>(
        sessions: &'a mut SessionMap<G>,
        session_id: &SessionId,
    ) -> Result<&'a mut WizardController<G>, SessionError> {
        let session = sessions.get_mut(session_id).ok_or(SessionError::NotFound)?;
        session.last_touched = Instant::now();
        Ok(&mut session.controller)
    }

    pub fn create(&self) -> Result<SessionSnapshot, SessionError> {
        let session_id = SessionId::generate();
        let controller = WizardController::new(Arc::clone(&self.generator));
        let snapshot = SessionSnapshot::capture(session_id, &controller);

        self.lock()?.insert(
            session_id,
            HostedSession {
                controller,
                last_touched: Instant::now(),
            },
        );
        info!(%session_id, "evaluation session opened");
        Ok(snapshot)
    }

    pub fn snapshot(&self, session_id: &SessionId) -> Result<SessionSnapshot, SessionError> {
        let mut sessions = self.lock()?;
        let controller = Self::touch(&mut sessions, session_id)?;
        Ok(SessionSnapshot::capture(*session_id, controller))
    }

    pub fn edit(
        &self,
        session_id: &SessionId,
        patch: RecordPatch,
    ) -> Result<SessionSnapshot, SessionError> {
        let mut sessions = self.lock()?;
        let controller = Self::touch(&mut sessions, session_id)?;
        if !controller.apply_patch(patch) {
            return Err(SessionError::Locked);
        }
        Ok(SessionSnapshot::capture(*session_id, controller))
    }

    /// Advance the session. The store lock is released while the generator runs so other
    /// sessions stay responsive and a second advance on this one observes `Busy`. If this
    /// future is dropped mid-generation the session falls back to Commitment.
    pub async fn advance(&self, session_id: &SessionId) -> Result<AdvanceResponse, SessionError> {
        let request = {
            let mut sessions = self.lock()?;
            let controller = Self::touch(&mut sessions, session_id)?;
            match controller.begin_advance() {
                AdvanceStep::Settled(outcome) => {
                    return Ok(AdvanceResponse {
                        outcome,
                        session: SessionSnapshot::capture(*session_id, controller),
                    });
                }
                AdvanceStep::Generate(request) => request,
            }
        };

        let guard = InFlight {
            service: self,
            session_id: *session_id,
            armed: true,
        };
        let result = self.generator.generate(&request).await;
        guard.disarm();

        let mut sessions = self.lock()?;
        let controller = Self::touch(&mut sessions, session_id)?;
        let outcome = controller.complete_generation(result);
        Ok(AdvanceResponse {
            outcome,
            session: SessionSnapshot::capture(*session_id, controller),
        })
    }

    pub fn retreat(&self, session_id: &SessionId) -> Result<SessionSnapshot, SessionError> {
        let mut sessions = self.lock()?;
        let controller = Self::touch(&mut sessions, session_id)?;
        controller.retreat();
        Ok(SessionSnapshot::capture(*session_id, controller))
    }

    pub fn reset(&self, session_id: &SessionId) -> Result<SessionSnapshot, SessionError> {
        let mut sessions = self.lock()?;
        let controller = Self::touch(&mut sessions, session_id)?;
        if !controller.reset() {
            return Err(SessionError::ResetRefused);
        }
        Ok(SessionSnapshot::capture(*session_id, controller))
    }

    pub fn close(&self, session_id: &SessionId) -> Result<(), SessionError> {
        let mut sessions = self.lock()?;
        let session = sessions.get(session_id).ok_or(SessionError::NotFound)?;
        if session.controller.is_loading() {
            return Err(SessionError::Locked);
        }
        sessions.remove(session_id);
        info!(%session_id, "evaluation session closed");
        Ok(())
    }

    /// Number of live sessions after idle eviction.
    pub fn session_count(&self) -> Result<usize, SessionError> {
        Ok(self.lock()?.len())
    }

    fn abandon(&self, session_id: &SessionId) {
        let Ok(mut sessions) = self.sessions.lock() else {
            warn!(%session_id, "session store unavailable while abandoning generation");
            return;
        };
        if let Some(session) = sessions.get_mut(session_id) {
            warn!(%session_id, "generation abandoned by caller");
            session.controller.abandon_generation();
            session.last_touched = Instant::now();
        }
    }
}

/// Settles a session whose advance future is dropped while the generator is running.
struct InFlight<'a, G>
where
    G: ReportGenerator + 'static,
{
    service: &'a EvaluationService<G>,
    session_id: SessionId,
    armed: bool,
}

impl<G> InFlight<'_, G>
where
    G: ReportGenerator + 'static,
{
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<G> Drop for InFlight<'_, G>
where
    G: ReportGenerator + 'static,
{
    fn drop(&mut self) {
        if self.armed {
            self.service.abandon(&self.session_id);
        }
    }
}

/// Drive a complete record through a fresh controller in one call.
///
/// Used by batch callers that already hold every field; gating and scoring behave exactly as
/// in an interactive session.
pub async fn evaluate_record<G>(
    generator: Arc<G>,
    record: EvaluationRecord,
) -> Result<ReportView, AppError>
where
    G: ReportGenerator,
{
    let mut controller = WizardController::starting_on(generator, record.date);
    if let Some(slot) = controller.record_mut() {
        *slot = record;
    }

    loop {
        match controller.advance().await {
            AdvanceOutcome::Moved { .. } => continue,
            AdvanceOutcome::Blocked(blocked) => {
                return Err(AppError::Incomplete(blocked.missing_fields));
            }
            AdvanceOutcome::GenerationFailed { notice } => return Err(AppError::from(notice)),
            AdvanceOutcome::ReportReady
            | AdvanceOutcome::AlreadyAtReport
            | AdvanceOutcome::Busy
            | AdvanceOutcome::Stale => break,
        }
    }

    match controller.report() {
        Some(report) => Ok(ReportView::new(controller.record(), report)),
        None => Err(AppError::Incomplete(controller.missing_fields())),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("evaluation session not found")]
    NotFound,
    #[error("evaluation session is not editable while a report is pending or displayed")]
    Locked,
    #[error("a new evaluation can only start after a report or a failed generation attempt")]
    ResetRefused,
    #[error("session store unavailable")]
    Unavailable,
}
