use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::common::{read_json_body, service_at_commitment, GatedGenerator};
use crate::workflows::evaluation::router::advance_handler;
use crate::workflows::evaluation::{
    AdvanceOutcome, EvaluationService, FailureKind, SessionError, Step,
};

#[tokio::test]
async fn dropped_advance_returns_session_to_commitment() {
    let generator = Arc::new(GatedGenerator::new());
    let service = EvaluationService::new(Arc::clone(&generator));
    let session_id = service_at_commitment(&service).await;

    let abandoned =
        tokio::time::timeout(Duration::from_millis(50), service.advance(&session_id)).await;
    assert!(abandoned.is_err(), "generation should still be parked");

    let snapshot = service.snapshot(&session_id).expect("session kept");
    assert_eq!(snapshot.step, Step::Commitment);
    assert!(!snapshot.is_loading);
    assert!(snapshot.can_reset);
    assert!(snapshot.report.is_none());
    let notice = snapshot.notice.expect("notice left behind");
    assert_eq!(notice.kind, FailureKind::ServiceUnavailable);

    generator.release();
    let retry = service.advance(&session_id).await.expect("session exists");
    assert_eq!(retry.outcome, AdvanceOutcome::ReportReady);
    assert_eq!(generator.calls(), 2);
    assert!(service.close(&session_id).is_ok());
}

#[tokio::test]
async fn concurrent_advance_is_busy_and_issues_one_request() {
    let generator = Arc::new(GatedGenerator::new());
    let service = Arc::new(EvaluationService::new(Arc::clone(&generator)));
    let session_id = service_at_commitment(&service).await;

    let first = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.advance(&session_id).await }
    });
    generator.wait_for_call().await;

    let response = advance_handler(State(Arc::clone(&service)), Path(session_id.to_string())).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["outcome"], "busy");
    assert_eq!(body["session"]["is_loading"], true);

    let second = service.advance(&session_id).await.expect("session exists");
    assert_eq!(second.outcome, AdvanceOutcome::Busy);
    assert!(matches!(service.close(&session_id), Err(SessionError::Locked)));

    generator.release();
    let first = first
        .await
        .expect("advance task joins")
        .expect("session exists");
    assert_eq!(first.outcome, AdvanceOutcome::ReportReady);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn idle_sessions_are_evicted() {
    let generator = Arc::new(GatedGenerator::new());
    let service = EvaluationService::with_idle_timeout(generator, Duration::ZERO);

    let first = service.create().expect("session created").session_id;
    let second = service.create().expect("session created").session_id;

    assert!(matches!(
        service.snapshot(&first),
        Err(SessionError::NotFound)
    ));
    assert!(matches!(
        service.snapshot(&second),
        Err(SessionError::NotFound)
    ));
    assert_eq!(service.session_count().expect("store available"), 0);
}

#[tokio::test]
async fn sessions_generating_a_report_survive_eviction() {
    let generator = Arc::new(GatedGenerator::new());
    let service = Arc::new(EvaluationService::with_idle_timeout(
        Arc::clone(&generator),
        Duration::from_millis(200),
    ));

    let idle = service.create().expect("session created").session_id;
    let busy = service_at_commitment(&service).await;
    let pending = tokio::spawn({
        let service = Arc::clone(&service);
        async move { service.advance(&busy).await }
    });
    generator.wait_for_call().await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(service.session_count().expect("store available"), 1);
    assert!(matches!(service.snapshot(&idle), Err(SessionError::NotFound)));
    assert!(service.snapshot(&busy).expect("still hosted").is_loading);

    generator.release();
    let outcome = pending
        .await
        .expect("advance task joins")
        .expect("session exists")
        .outcome;
    assert_eq!(outcome, AdvanceOutcome::ReportReady);
}

#[test]
fn recently_used_sessions_are_kept_and_counted() {
    let service = EvaluationService::new(Arc::new(GatedGenerator::new()));
    let first = service.create().expect("session created").session_id;
    service.create().expect("session created");

    assert_eq!(service.session_count().expect("store available"), 2);
    service.close(&first).expect("session closes");
    assert_eq!(service.session_count().expect("store available"), 1);
}
