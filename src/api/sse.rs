//! Server-Sent Events for real-time updates

use super::AppState;
use crate::store::{Reminder, ReminderEvent};
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// SSE event types sent to clients
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum SseEvent {
    /// Heartbeat to keep connection alive
    Heartbeat { timestamp: String },
    /// Reminder appended to the store
    ReminderCreated { reminder: Reminder },
    /// Partial update applied
    ReminderUpdated { reminder: Reminder },
    /// Reminder removed
    ReminderDeleted { id: String },
    /// Completion flag set
    ReminderCompletion { id: String, is_completed: bool },
}

impl SseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SseEvent::Heartbeat { .. } => "heartbeat",
            SseEvent::ReminderCreated { .. } => "reminder:created",
            SseEvent::ReminderUpdated { .. } => "reminder:updated",
            SseEvent::ReminderDeleted { .. } => "reminder:deleted",
            SseEvent::ReminderCompletion { .. } => "reminder:completion",
        }
    }

    fn into_event(self) -> Event {
        let data = serde_json::to_string(&self).unwrap_or_default();
        Event::default().event(self.event_type()).data(data)
    }
}

impl From<ReminderEvent> for SseEvent {
    fn from(event: ReminderEvent) -> Self {
        match event {
            ReminderEvent::Created { reminder } => SseEvent::ReminderCreated { reminder },
            ReminderEvent::Updated { reminder } => SseEvent::ReminderUpdated { reminder },
            ReminderEvent::Deleted { id } => SseEvent::ReminderDeleted { id },
            ReminderEvent::CompletionChanged { id, is_completed } => {
                SseEvent::ReminderCompletion { id, is_completed }
            }
        }
    }
}

/// SSE events handler
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let event_rx = state.event_tx.subscribe();

    let broadcast_stream = BroadcastStream::new(event_rx).filter_map(|result| match result {
        Ok(reminder_event) => Some(Ok(SseEvent::from(reminder_event).into_event())),
        Err(_) => None, // Lagged, skip
    });

    let heartbeat_stream =
        tokio_stream::wrappers::IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
            .map(|_| {
                Ok(SseEvent::Heartbeat {
                    timestamp: chrono::Utc::now().to_rfc3339(),
                }
                .into_event())
            });

    let merged_stream = futures::stream::select(broadcast_stream, heartbeat_stream);

    Sse::new(merged_stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
