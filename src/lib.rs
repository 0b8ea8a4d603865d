//! Jarvis - a chat-bot command framework
//!
//! Messages from any channel are matched against the actions that loaded
//! modules register, and a matched handler runs only when the sender is
//! allowed to use it.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod plugins;

pub use application::errors::BotError;
pub use application::messaging::{ChannelRegistry, Dispatch, Dispatcher, DropReason};
pub use application::services::{ActionRegistry, Directory};
