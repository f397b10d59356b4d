use crate::server::service::state::AppState;
use axum::body::Body;
use bytes::Bytes;
use carstream::{ChannelWriter, ChunkedEnd, write_chunked};
use core::convert::Infallible;
use tokio_stream::{StreamExt, wrappers::UnboundedReceiverStream};

/// Starts a chunked delivery and returns the body it writes into.
///
/// The writer runs on the blocking pool: it parks on its completion gate
/// while the subscription pushes one JSON line per car through a
/// [`ChannelWriter`]. The body ends when the writer drops its sink.
pub fn chunked_body(state: &AppState) -> Body {
    let (sink, chunks) = ChannelWriter::channel();
    let producer = state.producer.clone();
    let timeout = state.timeout;
    let guard = state.tracker.start("chunked");

    tokio::task::spawn_blocking(move || {
        let outcome = write_chunked(&producer, timeout, sink);
        tracing::debug!("Chunked writer released: {:?}", outcome.end);
        let failed = !matches!(outcome.end, ChunkedEnd::Completed);
        guard.finish(outcome.records_written, failed);
    });

    Body::from_stream(UnboundedReceiverStream::new(chunks).map(Ok::<Bytes, Infallible>))
}
