pub mod bus;
pub mod bus_builder;
pub mod event;
pub mod header;
pub mod publisher;

pub use bus::*;
pub use bus_builder::*;
pub use event::*;
pub use header::*;
pub use publisher::*;
