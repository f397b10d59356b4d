use crate::{Car, Event, Producer, Result, SourceFactory, Subscriber, Subscription};
use core::{ops::ControlFlow, time::Duration};
use std::io;
use tokio::sync::mpsc;

/// Payload of the sentinel event sent after the last record.
pub const DONE: &str = "done";

/// One server-sent event, independent of any HTTP framework.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerEvent {
    /// Event id; set to the record id for record events.
    pub id: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Builds the event carrying `car` as a JSON payload.
    ///
    /// # Errors
    ///
    /// Returns the serialization error, if any.
    pub fn record(car: &Car) -> serde_json::Result<Self> {
        Ok(Self {
            id: Some(car.id.to_string()),
            data: car.to_json()?,
        })
    }

    /// The terminal `"done"` sentinel.
    pub fn done() -> Self {
        Self {
            id: None,
            data: DONE.to_string(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.id.is_none() && self.data == DONE
    }
}

/// A long-lived, one-way event connection to a client.
///
/// Dropping the connection closes it.
pub trait EventConnection: Send + 'static {
    /// Sends one event.
    ///
    /// # Errors
    ///
    /// Fails once the client is gone; the emitter then stops the subscription.
    fn send(&mut self, event: ServerEvent) -> io::Result<()>;

    /// Closes the connection. Defaults to dropping it.
    fn close(self)
    where
        Self: Sized,
    {
    }
}

impl EventConnection for mpsc::UnboundedSender<ServerEvent> {
    fn send(&mut self, event: ServerEvent) -> io::Result<()> {
        mpsc::UnboundedSender::send(self, event)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "event receiver dropped"))
    }
}

struct EventSubscriber<C> {
    connection: Option<C>,
    sent: usize,
}

impl<C: EventConnection> EventSubscriber<C> {
    fn close(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
    }
}

impl<C: EventConnection> Subscriber for EventSubscriber<C> {
    fn on_event(&mut self, event: Event) -> ControlFlow<()> {
        match event {
            Event::Next(car) => {
                let Some(connection) = self.connection.as_mut() else {
                    return ControlFlow::Break(());
                };
                let event = match ServerEvent::record(&car) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!("Skipping car {} that failed to serialize: {e}", car.id);
                        return ControlFlow::Continue(());
                    }
                };
                if let Err(e) = connection.send(event) {
                    tracing::debug!("Event connection lost after {} events: {e}", self.sent);
                    self.close();
                    return ControlFlow::Break(());
                }
                self.sent += 1;
                ControlFlow::Continue(())
            }
            Event::Complete => {
                if let Some(connection) = self.connection.as_mut() {
                    if let Err(e) = connection.send(ServerEvent::done()) {
                        tracing::debug!("Failed to send done event: {e}");
                    }
                }
                self.close();
                ControlFlow::Continue(())
            }
            Event::Error(e) => {
                // No sentinel: a stream that ends without "done" is how the
                // client learns the feed failed.
                tracing::warn!("Event stream aborted by source fault after {} events: {e}", self.sent);
                self.close();
                ControlFlow::Continue(())
            }
        }
    }
}

/// Forwards every record of one subscription as a [`ServerEvent`], then sends
/// the [`DONE`] sentinel and closes `connection`.
///
/// Returns as soon as the subscription is running; delivery continues on the
/// producer's runtime. On a source fault the connection is closed without the
/// sentinel.
///
/// # Errors
///
/// Any error returned by [`Producer::subscribe`]; the connection is closed in
/// that case.
pub fn emit_events<F, C>(
    producer: &Producer<F>,
    timeout: Duration,
    connection: C,
) -> Result<Subscription>
where
    F: SourceFactory,
    C: EventConnection,
{
    producer.subscribe(
        timeout,
        EventSubscriber {
            connection: Some(connection),
            sent: 0,
        },
    )
}
