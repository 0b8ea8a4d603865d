//! Message handling - Pattern matching and dispatch

pub mod channels;
pub mod dispatcher;
pub mod pattern;

pub use channels::ChannelRegistry;
pub use dispatcher::{Dispatch, Dispatcher, DropReason};
pub use pattern::{CompiledPattern, PatternOptions, PatternSource, SlotKind};
