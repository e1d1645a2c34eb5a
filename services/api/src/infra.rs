use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use rcd_feedback::error::AppError;
use rcd_feedback::workflows::evaluation::EvaluationRecord;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|err| format!("invalid date '{raw}': {err} (expected YYYY-MM-DD)"))
}

/// Read an evaluation record from a JSON file. Missing text fields default to empty.
pub(crate) fn load_record(path: &Path) -> Result<EvaluationRecord, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let record = serde_json::from_str(&raw)?;
    Ok(record)
}
