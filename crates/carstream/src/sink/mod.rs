//! Sink adapters that turn one subscription into a consumer-facing shape.
//!
//! - [`collect`] / [`collect_async`] materialize the whole stream.
//! - [`write_chunked`] writes one line per record into a blocking byte sink.
//! - [`emit_events`] forwards records over a server-sent-event connection.

mod batch;
mod channel;
mod chunked;
mod events;
mod gate;


pub use batch::*;
pub use channel::*;
pub use chunked::*;
pub use events::*;
pub use gate::*;
