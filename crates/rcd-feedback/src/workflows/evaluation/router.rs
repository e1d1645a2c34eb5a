use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde_json::json;

use super::controller::AdvanceOutcome;
use super::domain::RecordPatch;
use super::generation::ReportGenerator;
use super::service::{EvaluationService, SessionError, SessionId};

/// Router exposing the wizard to an HTTP presentation layer.
pub fn evaluation_router<G>(service: Arc<EvaluationService<G>>) -> Router
where
    G: ReportGenerator + 'static,
{
    Router::new()
        .route("/api/v1/evaluations", post(create_handler::<G>))
        .route(
            "/api/v1/evaluations/:session_id",
            get(snapshot_handler::<G>).delete(close_handler::<G>),
        )
        .route(
            "/api/v1/evaluations/:session_id/record",
            patch(edit_handler::<G>),
        )
        .route(
            "/api/v1/evaluations/:session_id/advance",
            post(advance_handler::<G>),
        )
        .route(
            "/api/v1/evaluations/:session_id/retreat",
            post(retreat_handler::<G>),
        )
        .route(
            "/api/v1/evaluations/:session_id/reset",
            post(reset_handler::<G>),
        )
        .with_state(service)
}

fn parse_session_id(raw: &str) -> Result<SessionId, Response> {
    raw.parse().map_err(|_| error_response(SessionError::NotFound))
}

fn error_response(error: SessionError) -> Response {
    let status = match error {
        SessionError::NotFound => StatusCode::NOT_FOUND,
        SessionError::Locked | SessionError::ResetRefused => StatusCode::CONFLICT,
        SessionError::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn create_handler<G>(State(service): State<Arc<EvaluationService<G>>>) -> Response
where
    G: ReportGenerator + 'static,
{
    match service.create() {
        Ok(snapshot) => (StatusCode::CREATED, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn snapshot_handler<G>(
    State(service): State<Arc<EvaluationService<G>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: ReportGenerator + 'static,
{
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.snapshot(&session_id) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn edit_handler<G>(
    State(service): State<Arc<EvaluationService<G>>>,
    Path(session_id): Path<String>,
    axum::Json(patch): axum::Json<RecordPatch>,
) -> Response
where
    G: ReportGenerator + 'static,
{
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.edit(&session_id, patch) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn advance_handler<G>(
    State(service): State<Arc<EvaluationService<G>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: ReportGenerator + 'static,
{
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.advance(&session_id).await {
        Ok(response) => {
            let status = match response.outcome {
                AdvanceOutcome::Busy => StatusCode::CONFLICT,
                _ => StatusCode::OK,
            };
            (status, axum::Json(response)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn retreat_handler<G>(
    State(service): State<Arc<EvaluationService<G>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: ReportGenerator + 'static,
{
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.retreat(&session_id) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reset_handler<G>(
    State(service): State<Arc<EvaluationService<G>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: ReportGenerator + 'static,
{
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.reset(&session_id) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn close_handler<G>(
    State(service): State<Arc<EvaluationService<G>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: ReportGenerator + 'static,
{
    let session_id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.close(&session_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}
