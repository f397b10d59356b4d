//! Blocking, line-per-record delivery into a byte sink.
//!
//! The caller's thread subscribes and parks on a [`CompletionGate`]. Writes
//! happen on the emission task, one serialized record plus `\n` per flush.
//! Whatever ends the subscription (completion, source fault, sink failure, or
//! the emission task being torn down) closes the sink and opens the gate
//! exactly once; only then does the caller perform its final flush and
//! return.

use super::CompletionGate;
use crate::{Car, Error, Event, Producer, SourceFactory, Subscriber};
use core::{ops::ControlFlow, time::Duration};
use parking_lot::Mutex;
use std::{io::Write, sync::Arc};

/// How a chunked write ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkedEnd {
    /// The producer completed (exhaustion, timeout, or cancellation).
    Completed,
    /// The source faulted; the stream was closed without a trailer.
    Failed(Error),
    /// A write to the sink failed, typically because the client disconnected.
    SinkClosed,
    /// The subscription could not be started.
    Rejected(Error),
    /// The emission task went away without a terminal event.
    Dropped,
}

/// Result of [`write_chunked`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkedOutcome {
    /// Records fully written and flushed to the sink.
    pub records_written: usize,
    pub end: ChunkedEnd,
}

struct WriterState<W> {
    sink: Option<W>,
    written: usize,
    end: Option<ChunkedEnd>,
}

struct Shared<W> {
    gate: CompletionGate,
    state: Mutex<WriterState<W>>,
}

impl<W: Write> Shared<W> {
    fn new(sink: W) -> Self {
        Self {
            gate: CompletionGate::new(),
            state: Mutex::new(WriterState {
                sink: Some(sink),
                written: 0,
                end: None,
            }),
        }
    }

    /// Closes the sink, records the first end reason, and opens the gate.
    /// Safe to call any number of times.
    fn finish(&self, end: ChunkedEnd) {
        {
            let mut state = self.state.lock();
            if let Some(mut sink) = state.sink.take() {
                if let Err(e) = sink.flush() {
                    tracing::warn!("Failed to flush chunked sink on close: {e}");
                }
            }
            state.end.get_or_insert(end);
        }
        self.gate.release();
    }
}

fn encode_line(car: &Car) -> serde_json::Result<Vec<u8>> {
    let mut line = serde_json::to_vec(car)?;
    line.push(b'\n');
    Ok(line)
}

struct ChunkedSubscriber<W: Write> {
    shared: Arc<Shared<W>>,
}

impl<W: Write + Send + 'static> Subscriber for ChunkedSubscriber<W> {
    fn on_event(&mut self, event: Event) -> ControlFlow<()> {
        match event {
            Event::Next(car) => {
                let line = match encode_line(&car) {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::warn!("Skipping car {} that failed to serialize: {e}", car.id);
                        return ControlFlow::Continue(());
                    }
                };

                let mut state = self.shared.state.lock();
                let Some(sink) = state.sink.as_mut() else {
                    return ControlFlow::Break(());
                };

                match sink.write_all(&line).and_then(|()| sink.flush()) {
                    Ok(()) => {
                        state.written += 1;
                        ControlFlow::Continue(())
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Chunked sink failed after {} records, closing: {e}",
                            state.written
                        );
                        // Drop the broken sink without another write attempt.
                        state.sink = None;
                        drop(state);
                        self.shared.finish(ChunkedEnd::SinkClosed);
                        ControlFlow::Break(())
                    }
                }
            }
            Event::Error(e) => {
                tracing::warn!("Chunked stream aborted by source fault: {e}");
                self.shared.finish(ChunkedEnd::Failed(e));
                ControlFlow::Continue(())
            }
            Event::Complete => {
                self.shared.finish(ChunkedEnd::Completed);
                ControlFlow::Continue(())
            }
        }
    }
}

impl<W: Write> Drop for ChunkedSubscriber<W> {
    fn drop(&mut self) {
        // Covers the emission task being dropped or panicking before its
        // terminal event; a no-op on every normal path.
        self.shared.finish(ChunkedEnd::Dropped);
    }
}

/// Streams every record of one subscription into `sink`, one JSON document
/// per line, and blocks until the stream is over.
///
/// The sink is written and closed from the emission task, so it must be
/// `Send`. The calling thread is parked until the terminal signal and must not
/// be an async worker: call this from `spawn_blocking` or a plain thread.
///
/// Sink failures are logged and end the subscription; they are reported
/// through [`ChunkedOutcome::end`] rather than as an error, since the response
/// is already partially sent.
pub fn write_chunked<F, W>(producer: &Producer<F>, timeout: Duration, sink: W) -> ChunkedOutcome
where
    F: SourceFactory,
    W: Write + Send + 'static,
{
    let shared = Arc::new(Shared::new(sink));
    let subscriber = ChunkedSubscriber {
        shared: Arc::clone(&shared),
    };

    // On rejection the subscriber is already dropped, which opened the gate.
    if let Err(e) = producer.subscribe(timeout, subscriber) {
        tracing::warn!("Chunked stream rejected: {e}");
        shared.state.lock().end = Some(ChunkedEnd::Rejected(e));
    }

    shared.gate.wait();

    let mut state = shared.state.lock();
    if let Some(mut sink) = state.sink.take() {
        if let Err(e) = sink.flush() {
            tracing::debug!("Final flush of chunked sink failed: {e}");
        }
    }

    ChunkedOutcome {
        records_written: state.written,
        end: state.end.clone().unwrap_or(ChunkedEnd::Dropped),
    }
}
