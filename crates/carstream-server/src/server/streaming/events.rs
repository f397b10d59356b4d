use crate::server::service::{error::ApiError, state::AppState};
use axum::response::sse::{Event, KeepAlive, Sse};
use carstream::{ServerEvent, TerminalReason, emit_events};
use core::convert::Infallible;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::{StreamExt, wrappers::UnboundedReceiverStream};

/// Starts an event delivery and returns the SSE response it feeds.
///
/// The response ends when the emitter closes its connection: after the
/// `done` sentinel on success, or right away on a source fault.
///
/// # Errors
///
/// Fails when the producer rejects the subscription, before any byte is
/// sent.
pub fn event_stream(
    state: &AppState,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, ApiError> {
    let (tx, rx) = mpsc::unbounded_channel::<ServerEvent>();
    let guard = state.tracker.start("sse");
    let subscription = emit_events(&state.producer, state.timeout, tx)?;

    tokio::spawn(async move {
        match subscription.join().await {
            Ok(termination) => {
                let failed = matches!(termination.reason, TerminalReason::Failed(_));
                guard.finish(termination.emitted, failed);
            }
            Err(e) => {
                tracing::warn!("Event subscription ended abnormally: {e}");
                guard.finish(0, true);
            }
        }
    });

    let events = UnboundedReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(to_sse(event)));
    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

fn to_sse(event: ServerEvent) -> Event {
    let sse = Event::default().data(event.data);
    match event.id {
        Some(id) => sse.id(id),
        None => sse,
    }
}
