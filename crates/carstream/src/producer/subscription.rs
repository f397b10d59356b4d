use crate::{Error, Result};
use core::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Why a subscription ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TerminalReason {
    /// The source reported that it has no more records.
    Exhausted,
    /// The producer's timeout elapsed first.
    TimedOut,
    /// The handle, the subscriber, or a producer-wide shutdown stopped it.
    Cancelled,
    /// The source faulted.
    Failed(Error),
}

/// Summary of a finished subscription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Termination {
    /// Number of records delivered through [`Event::Next`](crate::Event::Next).
    pub emitted: usize,
    pub reason: TerminalReason,
    /// Time from subscription start to the terminal event.
    pub elapsed: Duration,
}

impl Termination {
    /// `true` unless the source faulted.
    pub const fn is_complete(&self) -> bool {
        !matches!(self.reason, TerminalReason::Failed(_))
    }
}

/// Handle to one running subscription.
///
/// Dropping the handle detaches it: emission continues until its own terminal
/// condition. Use [`Subscription::cancel`] to stop it early.
#[derive(Debug)]
pub struct Subscription {
    cancel: CancellationToken,
    task: JoinHandle<Termination>,
}

impl Subscription {
    pub(crate) const fn new(cancel: CancellationToken, task: JoinHandle<Termination>) -> Self {
        Self { cancel, task }
    }

    /// Requests the emission task to stop. The subscriber still receives
    /// [`Event::Complete`](crate::Event::Complete).
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this subscription when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// `true` once the terminal event has been delivered.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the terminal event and returns the subscription summary.
    ///
    /// # Errors
    ///
    /// - [`Error::SubscriptionDropped`] if the runtime dropped the task.
    /// - [`Error::Runtime`] if the emission task panicked.
    pub async fn join(self) -> Result<Termination> {
        self.task.await.map_err(|e| {
            if e.is_cancelled() {
                Error::SubscriptionDropped
            } else {
                Error::Runtime {
                    context: format!("emission task panicked: {e}"),
                }
            }
        })
    }
}
