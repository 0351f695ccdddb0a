pub mod fleet_state;
pub mod order;
pub mod peripheral;
pub mod resources;
pub mod sequence;
pub mod types;
pub mod vehicle;

// Re-export all public types for convenience
pub use fleet_state::FleetState;
pub use order::*;
pub use peripheral::*;
pub use resources::*;
pub use sequence::*;
pub use types::*;
pub use vehicle::*;
