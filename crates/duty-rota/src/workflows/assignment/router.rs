use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use super::domain::{EventTypeId, OrganizationId, PersonId, RoleId};
use super::repository::SchedulingRepository;
use super::service::{AssignmentError, AssignmentService};

/// Router builder exposing generation, batch and fairness endpoints.
pub fn assignment_router<R>(service: Arc<AssignmentService<R>>) -> Router
where
    R: SchedulingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/organizations/:organization_id/event-types/:event_type_id/assignments/preview",
            post(preview_handler::<R>),
        )
        .route(
            "/api/v1/organizations/:organization_id/event-types/:event_type_id/events/batch",
            post(batch_handler::<R>),
        )
        .route(
            "/api/v1/organizations/:organization_id/event-types/:event_type_id/fairness",
            get(fairness_report_handler::<R>),
        )
        .route(
            "/api/v1/organizations/:organization_id/people/:person_id/roles/:role_id/fairness",
            get(explain_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub excluded_person_ids: Vec<PersonId>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub dates: Vec<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

pub(crate) async fn preview_handler<R>(
    State(service): State<Arc<AssignmentService<R>>>,
    Path((organization_id, event_type_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<PreviewRequest>,
) -> Response
where
    R: SchedulingRepository + 'static,
{
    let excluded: HashSet<PersonId> = request.excluded_person_ids.into_iter().collect();
    let mut rng = service.selection_rng();
    let result = service.generate_one(
        &OrganizationId(organization_id),
        &EventTypeId(event_type_id),
        request.date,
        &excluded,
        &mut rng,
    );

    match result {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn batch_handler<R>(
    State(service): State<Arc<AssignmentService<R>>>,
    Path((organization_id, event_type_id)): Path<(String, String)>,
    axum::Json(request): axum::Json<BatchRequest>,
) -> Response
where
    R: SchedulingRepository + 'static,
{
    let mut rng = service.selection_rng();
    let result = service.generate_batch(
        &OrganizationId(organization_id),
        &EventTypeId(event_type_id),
        &request.dates,
        &mut rng,
    );

    match result {
        Ok(results) => {
            let created = results.iter().filter(|result| result.success).count();
            let payload = json!({
                "created": created,
                "failed": results.len() - created,
                "results": results,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn fairness_report_handler<R>(
    State(service): State<Arc<AssignmentService<R>>>,
    Path((organization_id, event_type_id)): Path<(String, String)>,
    Query(query): Query<DateQuery>,
) -> Response
where
    R: SchedulingRepository + 'static,
{
    match service.fairness_report(
        &OrganizationId(organization_id),
        &EventTypeId(event_type_id),
        query.date,
    ) {
        Ok(sections) => {
            let payload = json!({ "date": query.date, "sections": sections });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn explain_handler<R>(
    State(service): State<Arc<AssignmentService<R>>>,
    Path((organization_id, person_id, role_id)): Path<(String, String, String)>,
    Query(query): Query<DateQuery>,
) -> Response
where
    R: SchedulingRepository + 'static,
{
    match service.explain(
        &OrganizationId(organization_id),
        &PersonId(person_id),
        &RoleId(role_id),
        query.date,
    ) {
        Ok(breakdown) => (StatusCode::OK, axum::Json(breakdown)).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: AssignmentError) -> Response {
    let status = match &error {
        AssignmentError::EventTypeNotFound { .. } | AssignmentError::PersonNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        AssignmentError::DuplicateEvent { .. } => StatusCode::CONFLICT,
        AssignmentError::EmptyBatch => StatusCode::UNPROCESSABLE_ENTITY,
        AssignmentError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
