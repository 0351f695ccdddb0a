pub mod command_sink;
pub mod console_logger;
pub mod file_logger;
pub mod loopback_adapter;
pub mod multi_logger;
pub mod noop_logger;

pub use command_sink::*;
pub use console_logger::*;
pub use file_logger::*;
pub use loopback_adapter::*;
pub use multi_logger::*;
pub use noop_logger::*;
