//! Application layer - Matching, dispatch and the registries behind them
//! 
//! This layer contains:
//! - Services: Action registry, user/group directory, permission resolver
//! - Messaging: Pattern compiler, channel registry, dispatcher
//! - Errors: Domain-specific errors

pub mod errors;
pub mod services;
pub mod messaging;
