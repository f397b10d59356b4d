//! Time-bounded, per-subscription record emission.
//!
//! A [`Producer`] does not emit anything by itself. Every call to
//! [`Producer::subscribe`] builds a fresh source from the factory and spawns
//! one emission task on the runtime. That task owns the source and the
//! subscriber, enforces the timeout, and delivers exactly one terminal event.

use super::{Event, Subscriber, Subscription, TerminalReason, Termination};
use crate::{Error, RecordSource, Result, SourceFactory};
use core::time::Duration;
use std::sync::Arc;
use tokio::{runtime::Handle, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Source of independent, time-bounded subscriptions.
///
/// Cloning is cheap and shares the factory, the runtime handle and the
/// shutdown token. No mutable state is shared between subscriptions.
pub struct Producer<F> {
    factory: Arc<F>,
    runtime: Handle,
    shutdown: CancellationToken,
}

impl<F> Clone for Producer<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            runtime: self.runtime.clone(),
            shutdown: self.shutdown.clone(),
        }
    }
}

impl<F: SourceFactory> Producer<F> {
    /// Creates a producer whose emission tasks run on `runtime`.
    pub fn new(factory: F, runtime: Handle) -> Self {
        Self {
            factory: Arc::new(factory),
            runtime,
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates a producer bound to the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Runtime`] when called outside a Tokio runtime.
    pub fn from_current(factory: F) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::Runtime {
            context: e.to_string(),
        })?;
        Ok(Self::new(factory, runtime))
    }

    /// Replaces the producer-wide shutdown token.
    ///
    /// Every subscription listens on a child of this token, so cancelling it
    /// ends all live subscriptions with [`Event::Complete`].
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub const fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Starts emitting records to `subscriber` on the producer's runtime.
    ///
    /// Returns immediately. Records are delivered in emission order until the
    /// source is exhausted, `timeout` elapses, the source faults, or the
    /// subscription is cancelled. Exactly one terminal event follows.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] if `timeout` is zero.
    /// - [`Error::Runtime`] if the producer was already shut down.
    pub fn subscribe<S: Subscriber>(&self, timeout: Duration, subscriber: S) -> Result<Subscription> {
        if timeout.is_zero() {
            return Err(Error::InvalidRequest {
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if self.shutdown.is_cancelled() {
            return Err(Error::Runtime {
                context: "producer is shut down".to_string(),
            });
        }

        let cancel = self.shutdown.child_token();
        let source = self.factory.create();
        let start = Instant::now();
        let span = tracing::debug_span!("subscription", ?timeout);
        let task = self
            .runtime
            .spawn(emit(source, subscriber, start, timeout, cancel.clone()).instrument(span));

        Ok(Subscription::new(cancel, task))
    }
}

/// Drives one subscription from start to its single terminal event.
async fn emit<R, S>(
    mut source: R,
    mut subscriber: S,
    start: Instant,
    timeout: Duration,
    cancel: CancellationToken,
) -> Termination
where
    R: RecordSource,
    S: Subscriber,
{
    // `None` when the timeout reaches past what the clock can represent.
    let deadline = start.checked_add(timeout);
    let mut emitted = 0;

    let reason = loop {
        // Biased so that a fired deadline or cancellation always wins over a
        // record that happens to be ready at the same instant.
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break TerminalReason::Cancelled,
            () = expire(deadline) => break TerminalReason::TimedOut,
            next = source.next_record() => next,
        };

        match next {
            Ok(Some(car)) => {
                emitted += 1;
                if subscriber.on_event(Event::Next(car)).is_break() {
                    tracing::debug!("Subscriber requested stop after {emitted} records");
                    break TerminalReason::Cancelled;
                }
            }
            Ok(None) => break TerminalReason::Exhausted,
            Err(e) => break TerminalReason::Failed(e),
        }
    };

    let terminal = match &reason {
        TerminalReason::Failed(e) => {
            tracing::warn!("Source failed after {emitted} records: {e}");
            Event::Error(e.clone())
        }
        _ => Event::Complete,
    };
    let _ = subscriber.on_event(terminal);

    let elapsed = start.elapsed();
    tracing::debug!(
        "Subscription finished: {:?} after {emitted} records in {}ms",
        reason,
        elapsed.as_millis()
    );

    Termination {
        emitted,
        reason,
        elapsed,
    }
}

/// Resolves at `deadline`, or never if there is none.
async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => core::future::pending().await,
    }
}
