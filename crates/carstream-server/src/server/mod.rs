//! Server-side components of the `carstream` HTTP service.
//!
//! ## Submodules
//!
//! - [`config`] - CLI and environment configuration.
//! - [`service`] - Shared state, routing, content negotiation, and handlers.
//! - [`streaming`] - Bridges from the library's sink adapters to HTTP bodies.
//! - [`telemetry`] - Structured logging and optional metrics.

pub mod config;
pub mod service;
pub mod streaming;
pub mod telemetry;
