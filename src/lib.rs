//! Client core for an interactive permission DAG editor.
//!
//! - `layout`: layered placement of the permission graph
//! - `highlight`: selection-driven node styles
//! - `sync`: backend round trips and the reload-after-mutation controller
//! - `output`: render records for the canvas
//! - `wasm`: JavaScript bindings

mod config;
pub mod highlight;
pub mod layout;
pub mod model;
pub mod output;
pub mod sync;
pub mod wasm;

pub use config::{ClientConfig, ConfigError, DEFAULT_BACKEND_URL, DEFAULT_ORG_NAME};
pub use layout::{LayoutConfig, LayoutEdge, LayoutResult, PlacedNode, layout_nodes, layout_permissions};
pub use model::{PermissionGraph, PermissionNode};
pub use output::{DiagramOutput, render_diagram};
pub use sync::{BackendClient, SyncController, SyncError, Transport};
