pub mod assignment;
pub mod continuation;
pub mod idle_vehicles;
pub mod order_intake;
pub mod withdrawal;

pub use assignment::*;
pub use continuation::*;
pub use idle_vehicles::*;
pub use order_intake::*;
pub use withdrawal::*;
