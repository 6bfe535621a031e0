use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;

use crate::AppState;

/// Streams change notifications. A client that falls behind loses the
/// skipped events and should re-fetch what it shows.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("New SSE client connected");

    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().event(event.event_name()).data(json))),
                Err(e) => {
                    tracing::warn!("Failed to serialize change event: {}", e);
                    None
                }
            },
            Err(e) => {
                tracing::warn!("SSE subscriber lagged: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
