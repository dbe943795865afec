pub mod clock;
pub mod errors;
pub mod order;
pub mod ports;
