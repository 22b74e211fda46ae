//! Change feed endpoint
//!
//! Streams every catalog mutation as a server-sent event. Clients re-read
//! the affected collection when one arrives.

use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::stream::Stream;
use tokio_stream::StreamExt as _;

use crate::AppState;
use crate::metrics::EVENT_SUBSCRIBERS;

pub fn events_router() -> Router<AppState> {
    Router::new().route("/events", get(stream_events))
}

/// Decrements the subscriber gauge when the client goes away.
struct SubscriberGuard;

impl SubscriberGuard {
    fn new() -> Self {
        EVENT_SUBSCRIBERS.inc();
        Self
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        EVENT_SUBSCRIBERS.dec();
    }
}

/// GET /api/events
async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let guard = SubscriberGuard::new();
    let changes = state.events.stream();
    tracing::debug!(
        subscribers = state.events.subscriber_count(),
        "Change feed subscriber connected"
    );

    let stream = changes.filter_map(move |change| {
        let _alive = &guard;
        match Event::default().event(change.action.as_str()).json_data(&change) {
            Ok(event) => Some(Ok(event)),
            Err(error) => {
                tracing::warn!(%error, "Failed to encode change event");
                None
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
