use crate::{Car, Error};
use core::ops::ControlFlow;

/// One signal delivered to a [`Subscriber`].
///
/// Within a subscription, zero or more [`Event::Next`] values arrive in
/// emission order, followed by exactly one terminal event: either
/// [`Event::Error`] or [`Event::Complete`], never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// The next record in emission order.
    Next(Car),
    /// The source faulted; nothing follows.
    Error(Error),
    /// The stream ended normally (exhaustion, timeout, or cancellation).
    Complete,
}

impl Event {
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Next(_))
    }
}

/// Receives the events of a single subscription.
///
/// A subscriber is moved into the emission task and dropped right after the
/// terminal event, so it is never reused across subscriptions. Returning
/// [`ControlFlow::Break`] from a [`Event::Next`] asks the producer to stop;
/// the subscription then ends with [`Event::Complete`]. The return value for
/// terminal events is ignored.
pub trait Subscriber: Send + 'static {
    fn on_event(&mut self, event: Event) -> ControlFlow<()>;
}

impl<F> Subscriber for F
where
    F: FnMut(Event) -> ControlFlow<()> + Send + 'static,
{
    fn on_event(&mut self, event: Event) -> ControlFlow<()> {
        self(event)
    }
}
