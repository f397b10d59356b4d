//! Error types for the streaming bridge.
//!
//! This module defines the central `Error` enum shared by the producer and
//! every sink adapter. Only faults that a caller can still act on travel
//! through it: generator faults, rejected requests, and subscriptions that
//! vanished before signalling a terminal event. Sink write failures are
//! handled inside the adapters and never surface here.
//!
//! ## Error Cases
//! - `Source`: the record source failed mid-stream.
//! - `InvalidRequest`: a subscription was requested with unusable parameters.
//! - `SubscriptionDropped`: the emission task ended without a terminal event.
//! - `Runtime`: the async runtime refused or lost the emission task.

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for producers and sink adapters.
#[derive(Clone, thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The underlying record source raised a fault.
    #[error("Source error: {reason}")]
    Source { reason: String },

    /// The subscription request was invalid (e.g. a zero timeout).
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The emission task went away before delivering a terminal event.
    #[error("Subscription dropped before a terminal signal")]
    SubscriptionDropped,

    /// The runtime driving the emission task failed.
    #[error("Runtime error: {context}")]
    Runtime { context: String },
}

impl Error {
    /// Shorthand for building a [`Error::Source`] fault.
    pub fn source(reason: impl Into<String>) -> Self {
        Self::Source {
            reason: reason.into(),
        }
    }
}
