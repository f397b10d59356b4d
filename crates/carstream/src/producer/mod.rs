mod event;
mod producer;
mod subscription;


pub use event::*;
pub use producer::*;
pub use subscription::*;
