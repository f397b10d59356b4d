//! HTTP service implementation.
//!
//! ## Structure
//!
//! - [`state`] - Shared application state and in-flight stream tracking.
//! - [`handler`] - Endpoint handlers and `Accept` negotiation.
//! - [`router`] - Route table and CORS policy.
//! - [`error`] - Mapping of library errors to HTTP responses.

pub mod error;
pub mod handler;
pub mod router;
pub mod state;

#[cfg(test)]
mod tests;
