//! Domain entities - Core business objects

pub mod action;
pub mod group;
pub mod invocation;
pub mod message;
pub mod module;
pub mod permission;
pub mod user;

pub use action::{Action, ActionHandler, ActionInfo, ActionKind, ActionSpec, HandlerResult};
pub use group::Group;
pub use invocation::Invocation;
pub use message::Message;
pub use module::{Module, ModuleHooks, ModuleInfo};
pub use user::User;
