//! HTTP route handlers for the API

use super::AppState;
use crate::error::CoreError;
use crate::store::{parse_body, ReminderEvent, ReminderPatch};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

// ============================================================================
// Helpers
// ============================================================================

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(serde_json::json!({ "message": text }))).into_response()
}

fn error(status: StatusCode, text: &str) -> Response {
    (status, Json(serde_json::json!({ "error": text }))).into_response()
}

fn invalid_input(reason: &str) -> Response {
    tracing::debug!("Rejected request body: {}", reason);
    error(StatusCode::BAD_REQUEST, "Invalid input")
}

/// Map a store error onto the route's status code and error body.
/// `not_found` is the route-specific text for an empty or missing result.
fn failure(err: CoreError, not_found: &str) -> Response {
    match &err {
        CoreError::NotFound(..) => error(StatusCode::NOT_FOUND, not_found),
        CoreError::InvalidInput(reason) => invalid_input(reason),
        _ => error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

const REMINDER_NOT_FOUND: &str = "Reminder not found";

// ============================================================================
// Health Check
// ============================================================================

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "reminders": state.store.len()
    }))
}

// ============================================================================
// Reminders
// ============================================================================

/// The body is parsed as JSON whatever its content type
pub async fn create_reminder(State(state): State<AppState>, body: Bytes) -> Response {
    match parse_body(&body).and_then(|candidate| state.store.create(candidate)) {
        Ok(reminder) => {
            state.notify(ReminderEvent::Created { reminder });
            message(StatusCode::CREATED, "Reminder created")
        }
        Err(CoreError::InvalidInput(reason)) => invalid_input(&reason),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

pub async fn list_reminders(State(state): State<AppState>) -> Response {
    match state.store.list_all() {
        Ok(reminders) => Json(reminders).into_response(),
        Err(e) => failure(e, "No reminders found"),
    }
}

pub async fn list_completed(State(state): State<AppState>) -> Response {
    match state.store.list_by_completion(true) {
        Ok(reminders) => Json(reminders).into_response(),
        Err(e) => failure(e, "No completed reminders found"),
    }
}

pub async fn list_incomplete(State(state): State<AppState>) -> Response {
    match state.store.list_by_completion(false) {
        Ok(reminders) => Json(reminders).into_response(),
        Err(e) => failure(e, "No incomplete reminders found"),
    }
}

pub async fn list_due_today(State(state): State<AppState>) -> Response {
    match state.store.list_due_today(state.timezone) {
        Ok(reminders) => Json(reminders).into_response(),
        Err(e) => failure(e, "No reminders due today"),
    }
}

pub async fn get_reminder(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.get_by_id(&id) {
        Ok(reminder) => Json(reminder).into_response(),
        Err(e) => failure(e, REMINDER_NOT_FOUND),
    }
}

/// Unknown ids are 404 before the body is looked at. Any JSON body is
/// accepted; only unparseable bytes on an existing id are rejected.
pub async fn update_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let result = match parse_body(&body) {
        Ok(body) => state.store.update_by_id(&id, ReminderPatch::from_value(body)),
        Err(e) => state.store.get_by_id(&id).and(Err(e)),
    };

    match result {
        Ok(reminder) => {
            state.notify(ReminderEvent::Updated { reminder });
            message(StatusCode::OK, "Reminder updated successfully")
        }
        Err(e) => failure(e, REMINDER_NOT_FOUND),
    }
}

pub async fn delete_reminder(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.store.delete_by_id(&id) {
        Ok(_) => {
            state.notify(ReminderEvent::Deleted { id });
            message(StatusCode::OK, "Reminder deleted")
        }
        Err(e) => failure(e, REMINDER_NOT_FOUND),
    }
}

pub async fn mark_completed(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    set_completion(&state, &id, true, "Reminder marked as completed")
}

pub async fn mark_incomplete(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    set_completion(&state, &id, false, "Reminder marked as incomplete")
}

fn set_completion(state: &AppState, id: &str, is_completed: bool, text: &str) -> Response {
    match state.store.set_completion(id, is_completed) {
        Ok(_) => {
            state.notify(ReminderEvent::CompletionChanged {
                id: id.to_string(),
                is_completed,
            });
            message(StatusCode::OK, text)
        }
        Err(e) => failure(e, REMINDER_NOT_FOUND),
    }
}
