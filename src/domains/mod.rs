pub mod dispatching;
pub mod fleet;
pub mod logger;

pub use dispatching::*;
pub use fleet::*;
pub use logger::*;
