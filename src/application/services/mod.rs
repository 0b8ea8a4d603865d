//! Application services - Registries and decisions shared by the dispatcher
//! and the management surface

pub mod action_registry;
pub mod directory;
pub mod permission_resolver;

pub use action_registry::{ActionRegistry, Loaded, ModuleEntry, RegistryEvent, RegistryListener};
pub use directory::{Collection, Directory, DirectoryEvent, DirectoryListener, DirectorySnapshot};
pub use permission_resolver::PermissionResolver;
