use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::Stream;
use slotbook_core::models::events::TimeslotEvent;
use std::{convert::Infallible, sync::Arc};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt as _,
};
use tracing::warn;

use crate::ApiState;

/// Server-sent events for every claim and release made after subscribing.
///
/// A subscriber that falls more than the channel capacity behind skips the
/// missed events and keeps streaming.
pub async fn stream_events(
    State(state): State<Arc<ApiState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();

    let stream = BroadcastStream::new(rx)
        .filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!("Event subscriber lagged, skipped {} events", skipped);
                None
            }
        })
        .map(|event| Ok(to_sse_event(&event)));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn to_sse_event(event: &TimeslotEvent) -> Event {
    let json = serde_json::to_string(event).unwrap_or_else(|_| {
        r#"{"type":"error","message":"Failed to serialize event"}"#.to_string()
    });

    Event::default().event(event.name()).data(json)
}
