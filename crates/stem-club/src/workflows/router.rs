use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use super::contact::{contact_form, ContactSubmissionDraft};
use super::intake::{FieldErrors, Notice, NoticeBuffer, RejectionReason, SubmitResult};
use super::membership::{membership_form, MembershipApplicationDraft, Sector};
use crate::store::RemoteStore;

/// Router exposing the sector directory and both intake forms.
///
/// Every request mounts a fresh controller, so one HTTP call is one form submission.
pub fn intake_router<S>(store: Arc<S>) -> Router
where
    S: RemoteStore + 'static,
{
    Router::new()
        .route("/api/v1/sectors", get(sectors_handler::<S>))
        .route("/api/v1/contact", post(contact_handler::<S>))
        .route("/api/v1/membership", post(membership_handler::<S>))
        .with_state(store)
}

#[derive(Debug, Serialize)]
struct SectorsResponse {
    sectors: Vec<Sector>,
    notices: Vec<Notice>,
}

pub(crate) async fn sectors_handler<S>(State(store): State<Arc<S>>) -> Response
where
    S: RemoteStore + 'static,
{
    let notices = Arc::new(NoticeBuffer::default());
    let form = membership_form(store, notices.clone()).await;
    let body = SectorsResponse {
        sectors: form.sector_options(),
        notices: notices.notices(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

pub(crate) async fn contact_handler<S>(
    State(store): State<Arc<S>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response
where
    S: RemoteStore + 'static,
{
    let notices = Arc::new(NoticeBuffer::default());
    let form = contact_form(store, notices.clone());
    let (draft, malformed) = ContactSubmissionDraft::from_payload(&request_body(payload));
    form.fill(draft);
    let result = if malformed.is_empty() {
        form.submit().await
    } else {
        form.reject_input(malformed)
    };
    submission_response(result, notices.notices())
}

pub(crate) async fn membership_handler<S>(
    State(store): State<Arc<S>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response
where
    S: RemoteStore + 'static,
{
    let notices = Arc::new(NoticeBuffer::default());
    let form = membership_form(store, notices.clone()).await;
    let (draft, malformed) = MembershipApplicationDraft::from_payload(&request_body(payload));
    form.fill(draft);
    let result = if malformed.is_empty() {
        form.submit().await
    } else {
        form.reject_input(malformed)
    };
    submission_response(result, notices.notices())
}

/// An unreadable body is treated as an empty form, so it fails validation like one.
fn request_body(payload: Result<Json<Value>, JsonRejection>) -> Value {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            debug!(status = %rejection.status(), "request body unreadable");
            Value::Null
        }
    }
}

fn submission_response<K>(result: SubmitResult<K>, notices: Vec<Notice>) -> Response
where
    K: Ord + Copy + Serialize,
{
    let (status, label, errors) = match result {
        SubmitResult::Accepted => (StatusCode::CREATED, "accepted", FieldErrors::new()),
        SubmitResult::Invalid(errors) => (StatusCode::UNPROCESSABLE_ENTITY, "invalid", errors),
        SubmitResult::Rejected(RejectionReason::DuplicateSubmission)
        | SubmitResult::Blocked => (StatusCode::CONFLICT, "duplicate", FieldErrors::new()),
        SubmitResult::Rejected(RejectionReason::TransientFailure) => {
            (StatusCode::BAD_GATEWAY, "failed", FieldErrors::new())
        }
        SubmitResult::InFlight | SubmitResult::AlreadyAccepted => {
            (StatusCode::CONFLICT, "busy", FieldErrors::new())
        }
        SubmitResult::Detached => (
            StatusCode::SERVICE_UNAVAILABLE,
            "detached",
            FieldErrors::new(),
        ),
    };

    let payload = json!({
        "status": label,
        "errors": errors,
        "notices": notices,
    });
    (status, Json(payload)).into_response()
}
