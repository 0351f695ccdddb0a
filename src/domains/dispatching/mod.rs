pub mod peripheral_callback;
pub mod phase;
pub mod phases;
pub mod pipeline;
pub mod strategy;

pub use peripheral_callback::*;
pub use phase::*;
pub use phases::*;
pub use pipeline::*;
pub use strategy::*;
