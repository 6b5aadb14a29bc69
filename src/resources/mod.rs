pub mod handle;
pub mod manager;

pub use handle::{HandleId, LifecycleAction, Resource, ResourceKind, ResourceRecord};
pub use manager::ResourceLifecycleManager;
