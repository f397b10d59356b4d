use crate::{Car, Error, Event, Producer, Result, SourceFactory, Subscriber};
use core::{ops::ControlFlow, time::Duration};
use tokio::sync::oneshot;

/// Accumulates records until the terminal event, then hands over the whole
/// batch (or the fault) in one go.
struct BatchSubscriber {
    records: Vec<Car>,
    done: Option<oneshot::Sender<Result<Vec<Car>>>>,
}

impl BatchSubscriber {
    fn finish(&mut self, result: Result<Vec<Car>>) {
        if let Some(done) = self.done.take() {
            // The caller may have given up waiting; nothing left to deliver to.
            let _ = done.send(result);
        }
    }
}

impl Subscriber for BatchSubscriber {
    fn on_event(&mut self, event: Event) -> ControlFlow<()> {
        match event {
            Event::Next(car) => self.records.push(car),
            Event::Error(e) => {
                // No partial results leak past a fault.
                self.records.clear();
                self.finish(Err(e));
            }
            Event::Complete => {
                let records = core::mem::take(&mut self.records);
                self.finish(Ok(records));
            }
        }
        ControlFlow::Continue(())
    }
}

fn subscribe_batch<F: SourceFactory>(
    producer: &Producer<F>,
    timeout: Duration,
) -> Result<oneshot::Receiver<Result<Vec<Car>>>> {
    let (tx, rx) = oneshot::channel();
    producer.subscribe(
        timeout,
        BatchSubscriber {
            records: Vec::new(),
            done: Some(tx),
        },
    )?;
    Ok(rx)
}

/// Subscribes and blocks the calling thread until the stream ends.
///
/// Returns every record in emission order. Must be called from outside an
/// async context (a plain thread or `spawn_blocking`).
///
/// # Errors
///
/// - The source fault, if the source failed. Partial data is discarded.
/// - [`Error::SubscriptionDropped`] if the emission task vanished without a
///   terminal event.
/// - Any error returned by [`Producer::subscribe`].
pub fn collect<F: SourceFactory>(producer: &Producer<F>, timeout: Duration) -> Result<Vec<Car>> {
    subscribe_batch(producer, timeout)?
        .blocking_recv()
        .map_err(|_| Error::SubscriptionDropped)?
}

/// Async counterpart of [`collect`] for callers already running on the
/// runtime.
///
/// # Errors
///
/// Same as [`collect`].
pub async fn collect_async<F: SourceFactory>(
    producer: &Producer<F>,
    timeout: Duration,
) -> Result<Vec<Car>> {
    subscribe_batch(producer, timeout)?
        .await
        .map_err(|_| Error::SubscriptionDropped)?
}
