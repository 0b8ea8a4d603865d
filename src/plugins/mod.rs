//! Plugin system - Module factories and their lifecycle

pub mod builtin;
pub mod manager;
pub mod trait_def;

pub use builtin::CorePlugin;
pub use manager::{PluginInfo, PluginManager};
pub use trait_def::Plugin;
