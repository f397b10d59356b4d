use crate::server::telemetry::{
    decrement_streams_inflight, increment_records_delivered, increment_requests,
    increment_stream_errors, increment_streams_inflight, record_stream_duration,
};
use carstream::{CarFactory, Producer};
use core::time::Duration;
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub producer: Producer<CarFactory>,
    /// Timeout applied to every subscription.
    pub timeout: Duration,
    pub tracker: StreamTracker,
}

impl AppState {
    pub fn new(producer: Producer<CarFactory>, timeout: Duration) -> Self {
        Self {
            producer,
            timeout,
            tracker: StreamTracker::default(),
        }
    }
}

/// Counts deliveries that are still running, for metrics and shutdown
/// draining.
#[derive(Clone, Default)]
pub struct StreamTracker {
    inflight: Arc<AtomicUsize>,
}

impl StreamTracker {
    /// Registers a new delivery. The returned guard unregisters it on drop.
    pub fn start(&self, mode: &'static str) -> StreamGuard {
        increment_requests(mode);
        increment_streams_inflight();
        self.inflight.fetch_add(1, Ordering::Relaxed);
        StreamGuard {
            inflight: Arc::clone(&self.inflight),
            started: Instant::now(),
            mode,
        }
    }

    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Relaxed)
    }
}

/// One running delivery; see [`StreamTracker::start`].
pub struct StreamGuard {
    inflight: Arc<AtomicUsize>,
    started: Instant,
    mode: &'static str,
}

impl StreamGuard {
    /// Records the delivery's outcome and unregisters it.
    pub fn finish(self, delivered: usize, failed: bool) {
        let elapsed = self.started.elapsed();
        increment_records_delivered(delivered as u64);
        record_stream_duration(elapsed.as_secs_f64() * 1000.0);
        if failed {
            increment_stream_errors();
            tracing::warn!(
                "{} delivery failed after {delivered} cars in {}ms",
                self.mode,
                elapsed.as_millis()
            );
        } else {
            tracing::info!(
                "{} delivery finished: {delivered} cars in {}ms",
                self.mode,
                elapsed.as_millis()
            );
        }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.inflight.fetch_sub(1, Ordering::Relaxed);
        decrement_streams_inflight();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_track_inflight_deliveries() {
        let tracker = StreamTracker::default();
        let first = tracker.start("batch");
        let second = tracker.start("sse");
        assert_eq!(tracker.inflight(), 2);

        first.finish(3, false);
        assert_eq!(tracker.inflight(), 1);
        drop(second);
        assert_eq!(tracker.inflight(), 0);
    }
}
