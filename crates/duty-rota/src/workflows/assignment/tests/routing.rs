use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use super::common::*;
use crate::workflows::assignment::{assignment_router, AssignmentConfig, AssignmentService};

fn router_with(repository: Arc<MemoryRepository>) -> Router {
    let config = AssignmentConfig {
        random_seed: Some(17),
        ..AssignmentConfig::default()
    };
    assignment_router(Arc::new(AssignmentService::new(repository, config)))
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

#[tokio::test]
async fn preview_returns_assignments_and_stats() {
    let repository = Arc::new(MemoryRepository::seeded_with(ushers(5), welcome_team(2)));
    let router = router_with(repository.clone());

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/organizations/grace-chapel/event-types/sunday-service/assignments/preview",
            json!({ "date": "2025-03-02", "excluded_person_ids": ["u01"] }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["stats"]["total_assigned"], 2);
    assert_eq!(body["stats"]["coverage_percent"], 100);
    assert_eq!(body["assignments"].as_array().map(Vec::len), Some(2));
    assert!(body["assignments"]
        .as_array()
        .expect("assignments array")
        .iter()
        .all(|assignment| assignment["person"]["id"] != "u01"));
    assert!(repository.stored_events().is_empty());
}

#[tokio::test]
async fn preview_reports_missing_event_type_as_not_found() {
    let repository = Arc::new(MemoryRepository::seeded_with(ushers(5), welcome_team(2)));

    let response = router_with(repository)
        .oneshot(json_request(
            "POST",
            "/api/v1/organizations/grace-chapel/event-types/midweek/assignments/preview",
            json!({ "date": "2025-03-02" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .is_some_and(|message| message.contains("midweek")));
}

#[tokio::test]
async fn batch_reports_created_and_failed_dates() {
    let repository = Arc::new(MemoryRepository::seeded_with(ushers(6), welcome_team(2)));
    repository.push_event(past_event(date(2025, 3, 9), &["u01"], &usher()));

    let response = router_with(repository.clone())
        .oneshot(json_request(
            "POST",
            "/api/v1/organizations/grace-chapel/event-types/sunday-service/events/batch",
            json!({ "dates": ["2025-03-02", "2025-03-09", "2025-03-16"] }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["created"], 2);
    assert_eq!(body["failed"], 1);
    assert_eq!(body["results"][1]["success"], false);
    assert_eq!(
        body["results"][1]["error"],
        "an event already exists for this date"
    );
    assert_eq!(body["results"][0]["event_id"], "evt-0001");
    assert_eq!(repository.stored_events().len(), 3);
}

#[tokio::test]
async fn empty_batch_is_unprocessable() {
    let repository = Arc::new(MemoryRepository::seeded_with(ushers(6), welcome_team(2)));

    let response = router_with(repository)
        .oneshot(json_request(
            "POST",
            "/api/v1/organizations/grace-chapel/event-types/sunday-service/events/batch",
            json!({ "dates": [] }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn fairness_endpoints_return_rankings_and_breakdowns() {
    let repository = Arc::new(MemoryRepository::seeded_with(ushers(3), welcome_team(2)));
    repository.push_event(past_event(date(2025, 2, 23), &["u01"], &usher()));
    let router = router_with(repository);

    let report = router
        .clone()
        .oneshot(get_request(
            "/api/v1/organizations/grace-chapel/event-types/sunday-service/fairness?date=2025-03-02",
        ))
        .await
        .expect("router responds");
    assert_eq!(report.status(), StatusCode::OK);
    let body = read_json_body(report).await;
    assert_eq!(body["date"], "2025-03-02");
    assert_eq!(body["sections"][0]["section_name"], "Welcome");
    assert_eq!(
        body["sections"][0]["candidates"]
            .as_array()
            .map(Vec::len),
        Some(3)
    );
    assert_eq!(body["sections"][0]["candidates"][2]["person_id"], "u01");

    let explain = router
        .clone()
        .oneshot(get_request(
            "/api/v1/organizations/grace-chapel/people/u01/roles/usher/fairness?date=2025-03-02",
        ))
        .await
        .expect("router responds");
    assert_eq!(explain.status(), StatusCode::OK);
    let body = read_json_body(explain).await;
    assert_eq!(body["participation_count"], 1);
    assert_eq!(body["weeks_since_role"], 1);
    assert_eq!(body["components"].as_array().map(Vec::len), Some(4));

    let unknown = router
        .oneshot(get_request(
            "/api/v1/organizations/grace-chapel/people/ghost/roles/usher/fairness?date=2025-03-02",
        ))
        .await
        .expect("router responds");
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}
