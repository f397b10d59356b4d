#![doc = include_str!("../README.md")]

mod error;
mod producer;
mod record;
mod sink;
mod source;

pub use crate::error::*;
pub use crate::producer::*;
pub use crate::record::*;
pub use crate::sink::*;
pub use crate::source::*;
