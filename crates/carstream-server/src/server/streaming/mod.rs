//! Adapters between the library's sinks and axum response bodies.
//!
//! - [`chunked`] - A blocking chunked writer feeding a streamed body.
//! - [`events`] - An event emitter feeding an `text/event-stream` response.

pub mod chunked;
pub mod events;
