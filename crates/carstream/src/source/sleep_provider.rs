use core::{pin::Pin, time::Duration};

/// A trait that abstracts over how a source pauses between records.
///
/// Sources are generic over this so the pacing strategy can be swapped without
/// touching emission logic, e.g. a real timer in production and an immediate
/// yield in benchmarks.
pub trait SleepProvider {
    /// We require `Send` so that the future can be safely moved across threads
    type Sleep: Future<Output = ()> + Send;

    fn sleep_for(dur: Duration) -> Self::Sleep;
}

/// An implementation of [`SleepProvider`] using Tokio's timer.
///
/// This is the default provider for every source in this crate.
pub struct TokioSleep;
impl SleepProvider for TokioSleep {
    type Sleep = tokio::time::Sleep;

    fn sleep_for(dur: Duration) -> Self::Sleep {
        tokio::time::sleep(dur)
    }
}

/// An implementation of [`SleepProvider`] using Tokio's yield.
///
/// The requested duration is ignored: the source yields to the scheduler once
/// and continues. Useful when measuring throughput of the bridge itself rather
/// than the pacing of the source.
pub struct TokioYield;
impl SleepProvider for TokioYield {
    /// Tokio's `yield_now()` returns a private future type, so we must use a
    /// boxed `dyn Future` to abstract over it.
    type Sleep = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn sleep_for(_dur: Duration) -> Self::Sleep {
        Box::pin(tokio::task::yield_now())
    }
}
