//! HTTP API module for the Reminder API
//!
//! Provides REST endpoints over the reminder store plus a change-event stream.

pub mod routes;
mod sse;

use crate::config::{Config, Timezone};
use crate::error::Result;
use crate::store::{ReminderEvent, ReminderStore};

use axum::{
    routing::{get, patch},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Reminder collection
    pub store: Arc<ReminderStore>,
    /// Calendar used for the due-today view
    pub timezone: Timezone,
    /// Broadcast channel for SSE events
    pub event_tx: broadcast::Sender<ReminderEvent>,
}

impl AppState {
    /// Broadcast a store change. Having no subscribers is fine.
    pub fn notify(&self, event: ReminderEvent) {
        let _ = self.event_tx.send(event);
    }
}

/// Start the HTTP API server
pub async fn serve(
    addr: SocketAddr,
    store: Arc<ReminderStore>,
    config: &Config,
    event_tx: broadcast::Sender<ReminderEvent>,
) -> Result<()> {
    let state = AppState {
        store,
        timezone: config.reminders.timezone,
        event_tx,
    };

    let app = create_router(state);

    // Check if port is already in use (another instance running)
    if tokio::net::TcpStream::connect(addr).await.is_ok() {
        tracing::error!(
            "Port {} is already in use. Use `curl http://{}/health` to check.",
            addr.port(),
            addr
        );
        return Err(crate::error::CoreError::Api(format!(
            "Port {} already in use",
            addr.port()
        )));
    }

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| crate::error::CoreError::Api(e.to_string()))?;

    Ok(())
}

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/reminders",
            get(routes::list_reminders).post(routes::create_reminder),
        )
        // Literal segments before the :id catch-all
        .route("/reminders/completed", get(routes::list_completed))
        .route("/reminders/incomplete", get(routes::list_incomplete))
        .route("/reminders/due-today", get(routes::list_due_today))
        .route(
            "/reminders/:id",
            get(routes::get_reminder)
                .patch(routes::update_reminder)
                .delete(routes::delete_reminder),
        )
        .route("/reminders/:id/complete", patch(routes::mark_completed))
        .route("/reminders/:id/not-complete", patch(routes::mark_incomplete))
        .route("/events", get(sse::events_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> (Router, Arc<ReminderStore>) {
        let store = Arc::new(ReminderStore::new());
        let (event_tx, _) = broadcast::channel(16);
        let state = AppState {
            store: store.clone(),
            timezone: Timezone::Utc,
            event_tx,
        };
        (create_router(state), store)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        dispatch(app, request).await
    }

    /// Send raw bytes with an optional content type
    async fn send_raw(
        app: &Router,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let request = request.body(Body::from(body.to_string())).unwrap();
        dispatch(app, request).await
    }

    async fn dispatch(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn reminder(id: &str, due_date: &str, is_completed: bool) -> Value {
        json!({
            "id": id,
            "title": format!("Reminder {}", id),
            "description": "test",
            "dueDate": due_date,
            "isCompleted": is_completed
        })
    }

    #[tokio::test]
    async fn test_pay_rent_lifecycle() {
        let (app, _) = test_app();
        let pay_rent = json!({
            "id": "1",
            "title": "Pay rent",
            "description": "Monthly",
            "dueDate": "2024-01-01",
            "isCompleted": false
        });

        let (status, body) = send(&app, Method::POST, "/reminders", Some(pay_rent.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({ "message": "Reminder created" }));

        let (status, body) = send(&app, Method::GET, "/reminders/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, pay_rent);

        let (status, body) = send(&app, Method::PATCH, "/reminders/1/complete", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Reminder marked as completed" }));

        let (_, body) = send(&app, Method::GET, "/reminders/1", None).await;
        assert_eq!(body["isCompleted"], true);

        let (status, body) = send(&app, Method::DELETE, "/reminders/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Reminder deleted" }));

        let (status, body) = send(&app, Method::GET, "/reminders/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Reminder not found" }));
    }

    #[tokio::test]
    async fn test_create_invalid_input() {
        let (app, store) = test_app();

        let mut empty_title = reminder("1", "2024-01-01", false);
        empty_title["title"] = json!("");
        let mut string_flag = reminder("2", "2024-01-01", false);
        string_flag["isCompleted"] = json!("false");
        let mut missing_due = reminder("3", "2024-01-01", false);
        missing_due.as_object_mut().unwrap().remove("dueDate");

        for body in [empty_title, string_flag, missing_due] {
            let (status, body) = send(&app, Method::POST, "/reminders", Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({ "error": "Invalid input" }));
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_list_empty_and_single() {
        let (app, _) = test_app();

        let (status, body) = send(&app, Method::GET, "/reminders", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "No reminders found" }));

        send(&app, Method::POST, "/reminders", Some(reminder("a", "2024-01-01", false))).await;
        let (status, body) = send(&app, Method::GET, "/reminders", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([reminder("a", "2024-01-01", false)]));
    }

    #[tokio::test]
    async fn test_completion_views() {
        let (app, _) = test_app();

        let (status, body) = send(&app, Method::GET, "/reminders/completed", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "No completed reminders found" }));

        send(&app, Method::POST, "/reminders", Some(reminder("a", "2024-01-01", false))).await;
        send(&app, Method::POST, "/reminders", Some(reminder("b", "2024-01-01", true))).await;

        let (status, body) = send(&app, Method::GET, "/reminders/completed", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([reminder("b", "2024-01-01", true)]));

        let (status, body) = send(&app, Method::GET, "/reminders/incomplete", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([reminder("a", "2024-01-01", false)]));

        send(&app, Method::PATCH, "/reminders/a/complete", None).await;
        let (status, body) = send(&app, Method::GET, "/reminders/incomplete", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "No incomplete reminders found" }));
    }

    #[tokio::test]
    async fn test_due_today() {
        let (app, _) = test_app();

        let (status, body) = send(&app, Method::GET, "/reminders/due-today", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "No reminders due today" }));

        let today = Timezone::Utc.today();
        send(&app, Method::POST, "/reminders", Some(reminder("now", &today, false))).await;
        send(&app, Method::POST, "/reminders", Some(reminder("past", "2000-01-01", false))).await;

        let (status, body) = send(&app, Method::GET, "/reminders/due-today", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([reminder("now", &today, false)]));
    }

    #[tokio::test]
    async fn test_literal_routes_win_over_id() {
        let (app, _) = test_app();
        send(&app, Method::POST, "/reminders", Some(reminder("completed", "2024-01-01", false))).await;

        // The literal view, not the reminder whose id is "completed"
        let (status, body) = send(&app, Method::GET, "/reminders/completed", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "No completed reminders found" }));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (app, store) = test_app();
        send(&app, Method::POST, "/reminders", Some(reminder("a", "2024-01-01", true))).await;

        let (status, body) = send(&app, Method::PATCH, "/reminders/a", Some(json!({ "title": "X" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Reminder updated successfully" }));

        let updated = store.get_by_id("a").unwrap();
        assert_eq!(updated.title(), Some("X"));
        assert_eq!(updated.description(), Some("test"));
        assert!(updated.is_completed());

        let (status, body) = send(&app, Method::PATCH, "/reminders/zzz", Some(json!({ "title": "X" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Reminder not found" }));
    }

    #[tokio::test]
    async fn test_missing_id_routes() {
        let (app, _) = test_app();
        for (method, uri) in [
            (Method::DELETE, "/reminders/nope"),
            (Method::PATCH, "/reminders/nope/complete"),
            (Method::PATCH, "/reminders/nope/not-complete"),
        ] {
            let (status, body) = send(&app, method, uri, None).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(body, json!({ "error": "Reminder not found" }));
        }
    }

    #[tokio::test]
    async fn test_not_complete_route() {
        let (app, store) = test_app();
        send(&app, Method::POST, "/reminders", Some(reminder("a", "2024-01-01", true))).await;

        let (status, body) = send(&app, Method::PATCH, "/reminders/a/not-complete", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Reminder marked as incomplete" }));
        assert_eq!(store.get_by_id("a").unwrap().get("isCompleted"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn test_health_reports_count() {
        let (app, _) = test_app();
        send(&app, Method::POST, "/reminders", Some(reminder("a", "2024-01-01", true))).await;

        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["reminders"], 1);
    }

    #[tokio::test]
    async fn test_mutations_are_broadcast() {
        let store = Arc::new(ReminderStore::new());
        let (event_tx, mut event_rx) = broadcast::channel(16);
        let app = create_router(AppState {
            store,
            timezone: Timezone::Utc,
            event_tx,
        });

        send(&app, Method::POST, "/reminders", Some(reminder("a", "2024-01-01", false))).await;
        send(&app, Method::PATCH, "/reminders/a/complete", None).await;
        send(&app, Method::DELETE, "/reminders/a", None).await;

        assert!(matches!(event_rx.try_recv().unwrap(), ReminderEvent::Created { .. }));
        assert!(matches!(
            event_rx.try_recv().unwrap(),
            ReminderEvent::CompletionChanged { is_completed: true, .. }
        ));
        assert!(matches!(event_rx.try_recv().unwrap(), ReminderEvent::Deleted { .. }));
    }

    #[tokio::test]
    async fn test_create_ignores_content_type() {
        let (app, store) = test_app();
        let body = reminder("a", "2024-01-01", false).to_string();

        let (status, json) = send_raw(&app, Method::POST, "/reminders", None, &body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json, json!({ "message": "Reminder created" }));

        let form = Some("application/x-www-form-urlencoded");
        let body = reminder("b", "2024-01-01", false).to_string();
        let (status, _) = send_raw(&app, Method::POST, "/reminders", form, &body).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_create_malformed_body() {
        let (app, store) = test_app();
        for body in ["", "title=x", "{\"id\":"] {
            let (status, json) = send_raw(&app, Method::POST, "/reminders", None, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json, json!({ "error": "Invalid input" }));
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_update_wrong_type_on_missing_id() {
        let (app, _) = test_app();
        let (status, body) = send(
            &app,
            Method::PATCH,
            "/reminders/missing",
            Some(json!({ "isCompleted": "yes" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Reminder not found" }));

        let (status, body) = send_raw(&app, Method::PATCH, "/reminders/missing", None, "not json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Reminder not found" }));
    }

    #[tokio::test]
    async fn test_update_stores_wrong_types_unchecked() {
        let (app, store) = test_app();
        send(&app, Method::POST, "/reminders", Some(reminder("a", "2024-01-01", false))).await;
        send(&app, Method::POST, "/reminders", Some(reminder("b", "2024-01-01", true))).await;

        let (status, body) = send_raw(
            &app,
            Method::PATCH,
            "/reminders/a",
            None,
            r#"{"isCompleted":"yes"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Reminder updated successfully" }));
        assert_eq!(store.get_by_id("a").unwrap().get("isCompleted"), Some(&json!("yes")));

        // A truthy non-boolean flag is neither completed nor incomplete
        let (_, body) = send(&app, Method::GET, "/reminders/completed", None).await;
        assert_eq!(body, json!([reminder("b", "2024-01-01", true)]));
        let (status, body) = send(&app, Method::GET, "/reminders/incomplete", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "No incomplete reminders found" }));

        let (_, body) = send(&app, Method::GET, "/reminders/a", None).await;
        assert_eq!(body["isCompleted"], "yes");
    }

    #[tokio::test]
    async fn test_update_null_value_is_stored() {
        let (app, _) = test_app();
        send(&app, Method::POST, "/reminders", Some(reminder("a", "2024-01-01", false))).await;

        let (status, _) = send(&app, Method::PATCH, "/reminders/a", Some(json!({ "title": null }))).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, Method::GET, "/reminders/a", None).await;
        assert_eq!(body["title"], Value::Null);
        assert_eq!(body["description"], "test");
    }

    #[tokio::test]
    async fn test_update_unparseable_body_on_existing_id() {
        let (app, store) = test_app();
        send(&app, Method::POST, "/reminders", Some(reminder("a", "2024-01-01", false))).await;

        let (status, body) = send_raw(&app, Method::PATCH, "/reminders/a", None, "title=x").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid input" }));
        assert_eq!(store.get_by_id("a").unwrap().title(), Some("Reminder a"));
    }
}
