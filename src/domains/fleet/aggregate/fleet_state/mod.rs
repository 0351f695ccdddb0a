pub mod event_apply;
pub mod fleet_state;

pub use fleet_state::*;
