mod graph;
mod permission;

pub use graph::PermissionGraph;
pub use permission::PermissionNode;
