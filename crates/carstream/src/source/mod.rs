mod cars;
mod interface;
mod scripted;
mod sleep_provider;

pub use cars::*;
pub use interface::*;
pub use scripted::*;
pub use sleep_provider::*;
