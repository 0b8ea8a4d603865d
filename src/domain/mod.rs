//! Domain layer - Core business objects and the seams to the outside world
//! 
//! This layer contains:
//! - Entities: Messages, actions, modules, users and groups
//! - Traits: Abstractions for infrastructure (Channel, Brain)

pub mod entities;
pub mod traits;
