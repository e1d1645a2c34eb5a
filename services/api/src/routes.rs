use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Extension;
use axum::Json;
use rcd_feedback::error::AppError;
use rcd_feedback::workflows::evaluation::{
    evaluate_record, evaluation_router, EvaluationRecord, EvaluationService, ReportGenerator,
    ReportView,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_evaluation_routes<G>(service: Arc<EvaluationService<G>>) -> axum::Router
where
    G: ReportGenerator + 'static,
{
    let generator = Arc::clone(service.generator());
    evaluation_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/reports", post(report_endpoint::<G>))
        .layer(Extension(generator))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// One-shot evaluation of a complete record, bypassing the interactive session.
pub(crate) async fn report_endpoint<G>(
    Extension(generator): Extension<Arc<G>>,
    Json(record): Json<EvaluationRecord>,
) -> Result<Json<ReportView>, AppError>
where
    G: ReportGenerator + 'static,
{
    let view = evaluate_record(generator, record).await?;
    Ok(Json(view))
}
