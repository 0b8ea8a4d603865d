//! Domain traits - Abstractions for infrastructure implementations

pub mod channel;
pub mod store;

pub use channel::Channel;
pub use store::Brain;
