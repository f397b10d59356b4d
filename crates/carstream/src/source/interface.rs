use crate::{Car, Result};

/// An asynchronous, pull-based origin of [`Car`] records.
///
/// A producer drives exactly one source per subscription. The source decides
/// its own pacing: the returned future may sleep before resolving.
///
/// - `Ok(Some(car))`: the next record in emission order.
/// - `Ok(None)`: the source is exhausted; no further calls are made.
/// - `Err(e)`: the source faulted; no further calls are made.
pub trait RecordSource: Send + 'static {
    fn next_record(&mut self) -> impl Future<Output = Result<Option<Car>>> + Send;
}

/// Builds a fresh [`RecordSource`] for every subscription.
///
/// Factories are shared by all requests, so they must not hand out shared
/// mutable state: each call returns an independent source with its own id
/// counter and clock.
pub trait SourceFactory: Send + Sync + 'static {
    type Source: RecordSource;

    fn create(&self) -> Self::Source;
}

impl<F, R> SourceFactory for F
where
    F: Fn() -> R + Send + Sync + 'static,
    R: RecordSource,
{
    type Source = R;

    fn create(&self) -> Self::Source {
        self()
    }
}
