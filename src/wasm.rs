//! WASM bindings for the permgraph-core library.
//!
//! All functions exposed to JavaScript via wasm-bindgen are defined here.
//! Everything crossing the boundary is a JSON string; async operations return a
//! Promise that resolves with the render snapshot once the operation settles.

use std::future::Future;
use std::rc::Rc;

use js_sys::Promise;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::config::ClientConfig;
use crate::highlight::{HighlightConfig, SelectionState};
use crate::layout::{LayoutConfig, layout_permissions};
use crate::model::{PermissionGraph, PermissionNode};
use crate::output::{DiagramOutput, ErrorInfo, render_diagram};
use crate::sync::{FetchTransport, SyncController, SyncError};

/// Install the console logger and panic hook. Returns whether this call
/// installed the logger; later calls keep the first logger and return false.
#[wasm_bindgen]
pub fn init_logging(level: &str) -> bool {
    console_error_panic_hook::set_once();
    match console_log::init_with_level(log_level(level)) {
        Ok(()) => true,
        Err(e) => {
            debug!("console logger not installed: {}", e);
            false
        }
    }
}

/// Unknown or empty levels fall back to `Info`.
fn log_level(level: &str) -> log::Level {
    level.trim().parse().unwrap_or_else(|_| {
        warn!("unknown log level '{}', using info", level);
        log::Level::Info
    })
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        error!("Error serializing output: {}", e);
        "{\"error\": {\"kind\": \"encode\", \"message\": \"serialization failed\"}}".to_string()
    })
}

#[derive(Deserialize)]
struct PermissionsInput {
    permissions: Vec<PermissionNode>,
}

/// Lay out a `{ "permissions": [...] }` document without any backend.
#[wasm_bindgen]
pub fn layout_permissions_json(input: &str) -> String {
    let parsed: PermissionsInput = match serde_json::from_str(input) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Error parsing permissions: {}", e);
            return to_json(&DiagramOutput::from_error(ErrorInfo {
                kind: "malformed_input".to_string(),
                message: e.to_string(),
            }));
        }
    };

    let graph = PermissionGraph::from_nodes(parsed.permissions);
    let layout = layout_permissions(&graph, &LayoutConfig::default());
    to_json(&render_diagram(
        &graph,
        &layout,
        &SelectionState::default(),
        &HighlightConfig::default(),
    ))
}

/// Stateful client for one page: owns the graph, the layout and the selection.
#[wasm_bindgen]
pub struct PermissionClient {
    controller: Rc<SyncController<FetchTransport>>,
}

#[wasm_bindgen]
impl PermissionClient {
    /// Build a client from a JSON config. An empty string uses the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<PermissionClient, JsValue> {
        let config = ClientConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let controller =
            SyncController::new(&config, FetchTransport).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(PermissionClient { controller: Rc::new(controller) })
    }

    /// Current render snapshot as JSON.
    pub fn render(&self) -> String {
        to_json(&self.controller.render())
    }

    pub fn set_org_name(&self, name: &str) {
        self.controller.set_org_name(name);
    }

    pub fn set_draft_name(&self, name: &str) {
        self.controller.set_draft_name(name);
    }

    pub fn edge_click(&self, source: &str, target: &str) -> String {
        self.controller.select_edge(source, target);
        self.render()
    }

    /// Canvas selection changed; counts of selected nodes and edges.
    pub fn selection_change(&self, node_count: u32, edge_count: u32) -> String {
        self.controller.selection_changed(node_count == 0, edge_count == 0);
        self.render()
    }

    pub fn load_org(&self) -> Promise {
        self.settle(|c| async move { c.load_org().await.map(|_| ()) })
    }

    pub fn create_org(&self) -> Promise {
        self.settle(|c| async move { c.create_org().await })
    }

    /// Create a node named after the current draft name.
    pub fn create_node(&self) -> Promise {
        self.settle(|c| async move {
            let name = c.draft_name();
            if name.trim().is_empty() {
                warn!("ignoring create with an empty name");
                return Ok(());
            }
            c.create_node(&name).await
        })
    }

    pub fn delete_selected_node(&self) -> Promise {
        self.settle(|c| async move { c.delete_selected_node().await })
    }

    pub fn delete_selected_edge(&self) -> Promise {
        self.settle(|c| async move { c.delete_selected_edge().await })
    }

    pub fn node_click(&self, name: String) -> Promise {
        self.settle(move |c| async move { c.select_node(&name).await.map(|_| ()) })
    }

    /// A new connection from a parent handle to a child handle.
    pub fn connect(&self, source: String, target: String) -> Promise {
        self.settle(move |c| async move { c.connect(&source, &target).await })
    }
}

impl PermissionClient {
    /// Run `op` and resolve with the snapshot. Failures are already recorded
    /// in the snapshot's `error` field, so the promise never rejects.
    fn settle<F, Fut>(&self, op: F) -> Promise
    where
        F: FnOnce(Rc<SyncController<FetchTransport>>) -> Fut,
        Fut: Future<Output = Result<(), SyncError>> + 'static,
    {
        let controller = Rc::clone(&self.controller);
        let fut = op(Rc::clone(&controller));
        future_to_promise(async move {
            if let Err(e) = fut.await {
                debug!("{} settled with error {}", e.endpoint(), e.kind());
            }
            Ok(JsValue::from_str(&to_json(&controller.render())))
        })
    }
}
