//! SSE endpoint for the live message feed
//!
//! Each connection gets its own [`StreamSession`] and [`PollLoop`] task.
//! A fresh connection replays the whole history, then follows new messages.

use std::convert::Infallible;

use axum::{
    Extension,
    http::header,
    response::{
        IntoResponse,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use serde_json::json;
use tracing::debug;

use crate::{
    api::ApiState,
    stream::{PollLoop, StreamFrame, StreamSession},
};

/// Frames buffered per connection before the poll loop waits on the client.
const SESSION_BUFFER: usize = 32;

/// GET /api/events - SSE stream of chat messages
pub async fn handler(Extension(state): Extension<ApiState>) -> impl IntoResponse {
    let (session, mut frames) = StreamSession::channel(SESSION_BUFFER);
    let session_id = session.id();

    PollLoop::new(state.message_store(), state.user_directory(), state.poll).spawn(session);

    // Dropping this stream (client disconnect) drops `frames`, which is the
    // session's cancellation signal.
    let stream = async_stream::stream! {
        while let Some(frame) = frames.recv().await {
            yield Ok::<_, Infallible>(into_sse_event(frame));
        }
        debug!(session_id = %session_id, "Event stream finished");
    };

    (
        [(header::CONNECTION, "keep-alive")],
        Sse::new(stream).keep_alive(KeepAlive::default()),
    )
}

fn into_sse_event(frame: StreamFrame) -> SseEvent {
    match frame {
        StreamFrame::Event(json) => SseEvent::default().data(json),
        StreamFrame::Error(message) => SseEvent::default()
            .event("error")
            .data(json!({ "error": message }).to_string()),
    }
}
