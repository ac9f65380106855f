// Reload-after-mutation controller.
//
// Owns the client-side graph, its layout and the selection. Every mutation is
// a backend round trip followed by a full reload; nothing is applied locally
// ahead of the backend.
//
// State lives in a RefCell and is only borrowed between awaits, so several
// operations may be in flight at once. Overlapping loads and selection queries
// are sequenced with generation counters: a response is applied only if no
// newer request of the same kind was issued after it.

use std::cell::RefCell;

use log::{debug, error, info, warn};

use super::{BackendClient, SyncError, Transport};
use crate::config::{ClientConfig, ConfigError};
use crate::highlight::{HighlightConfig, SelectionState, inclusion_for};
use crate::layout::{LayoutConfig, LayoutEdge, LayoutResult, layout_permissions};
use crate::model::{PermissionGraph, PermissionNode};
use crate::output::{DiagramOutput, ErrorInfo, render_diagram};

/// Issued by [`SyncController::begin_load`], redeemed by `finish_load`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    org_name: String,
}

impl LoadTicket {
    pub fn org_name(&self) -> &str {
        &self.org_name
    }
}

/// Issued by [`SyncController::begin_selection`], redeemed by `finish_selection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    generation: u64,
    org_name: String,
    node: String,
}

impl SelectionTicket {
    pub fn org_name(&self) -> &str {
        &self.org_name
    }

    pub fn node(&self) -> &str {
        &self.node
    }
}

/// What happened to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer request superseded this one; the response was dropped.
    Stale,
}

#[derive(Debug, Default)]
struct Session {
    org_name: String,
    draft_name: String,
    graph: PermissionGraph,
    layout: LayoutResult,
    selection: SelectionState,
    load_generation: u64,
    selection_generation: u64,
    last_error: Option<SyncError>,
}

pub struct SyncController<T> {
    client: BackendClient<T>,
    layout_config: LayoutConfig,
    highlight_config: HighlightConfig,
    session: RefCell<Session>,
}

impl<T: Transport> SyncController<T> {
    pub fn new(config: &ClientConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            client: BackendClient::new(config.backend_base()?, transport),
            layout_config: config.layout.clone(),
            highlight_config: config.highlight.clone(),
            session: RefCell::new(Session {
                org_name: config.org_name.clone(),
                ..Session::default()
            }),
        })
    }

    pub fn transport(&self) -> &T {
        self.client.transport()
    }

    pub fn org_name(&self) -> String {
        self.session.borrow().org_name.clone()
    }

    /// Switch organization. Takes effect on the next load.
    pub fn set_org_name(&self, name: &str) {
        self.session.borrow_mut().org_name = name.to_string();
    }

    pub fn draft_name(&self) -> String {
        self.session.borrow().draft_name.clone()
    }

    pub fn set_draft_name(&self, name: &str) {
        self.session.borrow_mut().draft_name = name.to_string();
    }

    pub fn graph(&self) -> PermissionGraph {
        self.session.borrow().graph.clone()
    }

    pub fn layout(&self) -> LayoutResult {
        self.session.borrow().layout.clone()
    }

    pub fn selection(&self) -> SelectionState {
        self.session.borrow().selection.clone()
    }

    pub fn last_error(&self) -> Option<SyncError> {
        self.session.borrow().last_error.clone()
    }

    /// Current snapshot for the render surface. Never re-runs layout.
    pub fn render(&self) -> DiagramOutput {
        let session = self.session.borrow();
        let mut out = render_diagram(
            &session.graph,
            &session.layout,
            &session.selection,
            &self.highlight_config,
        );
        out.error = session.last_error.as_ref().map(ErrorInfo::from);
        out
    }

    /// Log and remember a failed request.
    fn record<R>(&self, op: &str, result: Result<R, SyncError>) -> Result<R, SyncError> {
        if let Err(err) = &result {
            error!("{} failed: {}", op, err);
            self.session.borrow_mut().last_error = Some(err.clone());
        }
        result
    }

    // ---- loading ----

    /// Start a load; any load started earlier becomes stale.
    pub fn begin_load(&self) -> LoadTicket {
        let mut session = self.session.borrow_mut();
        session.load_generation += 1;
        LoadTicket {
            generation: session.load_generation,
            org_name: session.org_name.clone(),
        }
    }

    /// Apply a load response if its ticket is still current.
    ///
    /// On success the graph is replaced, laid out again and the selection is
    /// cleared. On failure the previous graph, layout and selection stay.
    pub fn finish_load(
        &self,
        ticket: LoadTicket,
        result: Result<Vec<PermissionNode>, SyncError>,
    ) -> Result<Outcome, SyncError> {
        if ticket.generation != self.session.borrow().load_generation {
            warn!(
                "discarding stale load of '{}' (generation {})",
                ticket.org_name, ticket.generation
            );
            return Ok(Outcome::Stale);
        }

        let nodes = self.record("load", result)?;
        let graph = PermissionGraph::from_nodes(nodes);
        let layout = layout_permissions(&graph, &self.layout_config);
        info!("loaded {} permissions for '{}'", graph.len(), ticket.org_name);

        let mut session = self.session.borrow_mut();
        session.graph = graph;
        session.layout = layout;
        session.selection.clear();
        session.selection_generation += 1;
        session.last_error = None;
        Ok(Outcome::Applied)
    }

    /// Fetch the current organization and replace the local graph.
    pub async fn load_org(&self) -> Result<Outcome, SyncError> {
        let ticket = self.begin_load();
        let result = self.client.load(ticket.org_name()).await;
        self.finish_load(ticket, result)
    }

    // ---- mutations ----

    pub async fn create_org(&self) -> Result<(), SyncError> {
        let org = self.org_name();
        self.record("create org", self.client.init(&org).await)?;
        self.load_org().await.map(|_| ())
    }

    /// Create an empty node and clear the draft name input.
    pub async fn create_node(&self, name: &str) -> Result<(), SyncError> {
        let org = self.org_name();
        self.record("create node", self.client.add(&org, name).await)?;
        self.session.borrow_mut().draft_name.clear();
        self.load_org().await.map(|_| ())
    }

    pub async fn delete_node(&self, name: &str) -> Result<(), SyncError> {
        let org = self.org_name();
        self.record("delete node", self.client.delete(&org, name).await)?;
        {
            let mut session = self.session.borrow_mut();
            if session.selection.selected_node.as_deref() == Some(name) {
                session.selection.clear_node();
                session.selection_generation += 1;
            }
        }
        self.load_org().await.map(|_| ())
    }

    /// Delete the selected node; does nothing without a selection.
    pub async fn delete_selected_node(&self) -> Result<(), SyncError> {
        let selected = self.session.borrow().selection.selected_node.clone();
        match selected {
            Some(name) => self.delete_node(&name).await,
            None => {
                debug!("delete requested without a selected node");
                Ok(())
            }
        }
    }

    pub async fn create_edge(&self, parent: &str, child: &str) -> Result<(), SyncError> {
        let org = self.org_name();
        self.record("create edge", self.client.edit(&org, parent, child, true).await)?;
        self.load_org().await.map(|_| ())
    }

    pub async fn delete_edge(&self, parent: &str, child: &str) -> Result<(), SyncError> {
        let org = self.org_name();
        self.record("delete edge", self.client.edit(&org, parent, child, false).await)?;
        self.session.borrow_mut().selection.selected_edge = None;
        self.load_org().await.map(|_| ())
    }

    /// Delete the selected edge; does nothing without a selection.
    pub async fn delete_selected_edge(&self) -> Result<(), SyncError> {
        let selected = self.session.borrow().selection.selected_edge.clone();
        match selected {
            Some(edge) => self.delete_edge(&edge.source, &edge.target).await,
            None => {
                debug!("delete requested without a selected edge");
                Ok(())
            }
        }
    }

    /// A connection drawn on the canvas, from parent handle to child handle.
    pub async fn connect(&self, source: &str, target: &str) -> Result<(), SyncError> {
        self.create_edge(source, target).await
    }

    // ---- selection ----

    /// Mark `name` selected and start a relevance query for it. The previous
    /// inclusion set is dropped until the new result arrives.
    pub fn begin_selection(&self, name: &str) -> SelectionTicket {
        let mut session = self.session.borrow_mut();
        session.selection.selected_node = Some(name.to_string());
        session.selection.included_nodes.clear();
        session.selection_generation += 1;
        SelectionTicket {
            generation: session.selection_generation,
            org_name: session.org_name.clone(),
            node: name.to_string(),
        }
    }

    /// Turn a relevance response into the inclusion set, if still current.
    pub fn finish_selection(
        &self,
        ticket: SelectionTicket,
        result: Result<Vec<String>, SyncError>,
    ) -> Result<Outcome, SyncError> {
        if ticket.generation != self.session.borrow().selection_generation {
            debug!("discarding stale relevance result for '{}'", ticket.node);
            return Ok(Outcome::Stale);
        }

        let relevant = self.record("view", result)?;
        let mut session = self.session.borrow_mut();
        let included = inclusion_for(&session.graph, &ticket.node, relevant, &self.highlight_config);
        debug!("'{}' selected, {} nodes included", ticket.node, included.len());
        session.selection.included_nodes = included;
        session.last_error = None;
        Ok(Outcome::Applied)
    }

    /// Node click: select it and highlight what is relevant to it.
    pub async fn select_node(&self, name: &str) -> Result<Outcome, SyncError> {
        let ticket = self.begin_selection(name);
        let result = self.client.view(ticket.org_name(), ticket.node()).await;
        self.finish_selection(ticket, result)
    }

    /// Edge click.
    pub fn select_edge(&self, source: &str, target: &str) {
        self.session.borrow_mut().selection.selected_edge = Some(LayoutEdge::new(source, target));
    }

    /// The canvas reported its selection; empty parts clear ours.
    pub fn selection_changed(&self, nodes_empty: bool, edges_empty: bool) {
        let mut session = self.session.borrow_mut();
        if nodes_empty {
            session.selection.clear_node();
            session.selection_generation += 1;
        }
        if edges_empty {
            session.selection.selected_edge = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use futures::executor::block_on;

    use super::*;
    use crate::sync::fake::FakeBackend;

    fn perm(name: &str, parents: &[&str], additions: &[&str]) -> PermissionNode {
        PermissionNode::new(name)
            .with_parents(parents.iter().copied())
            .with_additions(additions.iter().copied())
    }

    fn controller(backend: FakeBackend) -> SyncController<FakeBackend> {
        let config = ClientConfig { org_name: "acme".to_string(), ..ClientConfig::default() };
        SyncController::new(&config, backend).unwrap()
    }

    fn seeded() -> SyncController<FakeBackend> {
        controller(FakeBackend::with_org(
            "acme",
            vec![perm("A", &[], &["read"]), perm("B", &["A"], &["write"])],
        ))
    }

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn edges(ctrl: &SyncController<FakeBackend>) -> Vec<LayoutEdge> {
        ctrl.layout().edges
    }

    #[test]
    fn test_load_lays_out_roots_on_top() {
        let ctrl = seeded();
        assert_eq!(block_on(ctrl.load_org()).unwrap(), Outcome::Applied);

        let layout = ctrl.layout();
        assert!(layout.position_of("A").unwrap().y < layout.position_of("B").unwrap().y);
        assert_eq!(ctrl.render().nodes.len(), 2);
    }

    #[test]
    fn test_load_clears_selection() {
        let ctrl = seeded();
        block_on(ctrl.load_org()).unwrap();
        block_on(ctrl.select_node("B")).unwrap();
        ctrl.select_edge("A", "B");
        assert!(ctrl.selection().selected_node.is_some());

        block_on(ctrl.load_org()).unwrap();
        assert_eq!(ctrl.selection(), SelectionState::default());
    }

    #[test]
    fn test_stale_load_discarded() {
        let ctrl = seeded();
        let first = ctrl.begin_load();
        let second = ctrl.begin_load();

        // The later request resolves first, then the earlier one arrives
        let applied = ctrl.finish_load(second, Ok(vec![perm("new", &[], &["x"])])).unwrap();
        let stale = ctrl.finish_load(first, Ok(vec![perm("old", &[], &["x"])])).unwrap();

        assert_eq!(applied, Outcome::Applied);
        assert_eq!(stale, Outcome::Stale);
        assert!(ctrl.graph().contains("new"));
        assert!(!ctrl.graph().contains("old"));
    }

    #[test]
    fn test_failed_reload_keeps_view() {
        let ctrl = seeded();
        block_on(ctrl.load_org()).unwrap();
        let before = ctrl.layout();

        ctrl.transport().fail_next(SyncError::Transport {
            endpoint: "/load".to_string(),
            message: "offline".to_string(),
        });
        let err = block_on(ctrl.load_org()).unwrap_err();

        assert_eq!(err.kind(), "transport");
        assert_eq!(ctrl.graph().len(), 2);
        assert_eq!(ctrl.layout().nodes, before.nodes);
        let out = ctrl.render();
        assert_eq!(out.error.unwrap().kind, "transport");
        assert_eq!(out.nodes.len(), 2);

        // Next good load clears the error
        block_on(ctrl.load_org()).unwrap();
        assert!(ctrl.last_error().is_none());
    }

    #[test]
    fn test_malformed_load_reported() {
        let ctrl = seeded();
        block_on(ctrl.load_org()).unwrap();
        ctrl.transport().respond_next("{\"oops\": true}");

        let err = block_on(ctrl.load_org()).unwrap_err();
        assert_eq!(err.kind(), "malformed_response");
        assert_eq!(ctrl.graph().len(), 2);
    }

    #[test]
    fn test_create_org_then_node() {
        let ctrl = controller(FakeBackend::default());
        block_on(ctrl.create_org()).unwrap();
        assert!(ctrl.graph().is_empty());
        assert!(ctrl.layout().is_empty());

        ctrl.set_draft_name("fresh");
        block_on(ctrl.create_node("fresh")).unwrap();
        assert!(ctrl.graph().contains("fresh"));
        assert!(ctrl.graph().is_leaf("fresh"));
        assert_eq!(ctrl.draft_name(), "");
    }

    #[test]
    fn test_failed_mutation_does_not_reload() {
        let ctrl = seeded();
        block_on(ctrl.load_org()).unwrap();
        ctrl.set_draft_name("keep");
        let loads_before = ctrl.transport().request_count("/load");

        ctrl.transport().fail_next(SyncError::Rejected { endpoint: "/add".to_string(), status: 500 });
        assert!(block_on(ctrl.create_node("keep")).is_err());

        assert_eq!(ctrl.transport().request_count("/load"), loads_before);
        assert_eq!(ctrl.draft_name(), "keep");
        assert_eq!(ctrl.render().error.unwrap().kind, "rejected");
    }

    #[test]
    fn test_delete_selected_node_clears_selection() {
        let ctrl = seeded();
        block_on(ctrl.load_org()).unwrap();
        block_on(ctrl.select_node("B")).unwrap();

        block_on(ctrl.delete_selected_node()).unwrap();
        assert!(!ctrl.graph().contains("B"));
        assert!(ctrl.selection().selected_node.is_none());
    }

    #[test]
    fn test_delete_without_selection_is_noop() {
        let ctrl = seeded();
        block_on(ctrl.load_org()).unwrap();
        block_on(ctrl.delete_selected_node()).unwrap();
        block_on(ctrl.delete_selected_edge()).unwrap();
        assert_eq!(ctrl.transport().request_count("/delete"), 0);
        assert_eq!(ctrl.transport().request_count("/edit"), 0);
    }

    #[test]
    fn test_edge_round_trip() {
        let ctrl = controller(FakeBackend::with_org(
            "acme",
            vec![perm("P", &[], &["x"]), perm("C", &[], &["y"])],
        ));
        block_on(ctrl.load_org()).unwrap();
        let original = edges(&ctrl);

        block_on(ctrl.connect("P", "C")).unwrap();
        assert_eq!(edges(&ctrl), vec![LayoutEdge::new("P", "C")]);
        assert!(ctrl.layout().position_of("P").unwrap().y < ctrl.layout().position_of("C").unwrap().y);

        ctrl.select_edge("P", "C");
        block_on(ctrl.delete_selected_edge()).unwrap();
        assert_eq!(edges(&ctrl), original);
        assert!(ctrl.selection().selected_edge.is_none());
    }

    #[test]
    fn test_select_capability_node_uses_relevance_only() {
        let ctrl = seeded();
        block_on(ctrl.load_org()).unwrap();
        ctrl.transport().set_relevance("B", &["B"]);

        block_on(ctrl.select_node("B")).unwrap();
        let selection = ctrl.selection();
        assert_eq!(selection.selected_node.as_deref(), Some("B"));
        assert_eq!(selection.included_nodes, set(&["B"]));

        let out = ctrl.render();
        // A dimmed, B selected
        assert_eq!(out.nodes[0].style.background_color, "#d0cece");
        assert_eq!(out.nodes[1].style.background_color, "#c5fdc5");
    }

    #[test]
    fn test_select_grouping_node_unions_ancestors() {
        let ctrl = controller(FakeBackend::with_org(
            "acme",
            vec![perm("A", &[], &["read"]), perm("G", &["A"], &[])],
        ));
        block_on(ctrl.load_org()).unwrap();
        ctrl.transport().set_relevance("G", &["G"]);

        block_on(ctrl.select_node("G")).unwrap();
        assert_eq!(ctrl.selection().included_nodes, set(&["A", "G"]));

        let out = ctrl.render();
        assert_eq!(out.nodes[0].style.background_color, "#faf9f9");
        assert_eq!(out.nodes[1].style.background_color, "#c5fdc5");
    }

    #[test]
    fn test_failed_view_drops_previous_inclusion() {
        let ctrl = controller(FakeBackend::with_org(
            "acme",
            vec![
                perm("A", &[], &["read"]),
                perm("B", &["A"], &["write"]),
                perm("C", &["A"], &["exec"]),
            ],
        ));
        block_on(ctrl.load_org()).unwrap();
        ctrl.transport().set_relevance("B", &["A", "B"]);
        block_on(ctrl.select_node("B")).unwrap();
        assert_eq!(ctrl.selection().included_nodes, set(&["A", "B"]));

        ctrl.transport().fail_next(SyncError::Transport {
            endpoint: "/view".to_string(),
            message: "offline".to_string(),
        });
        assert!(block_on(ctrl.select_node("C")).is_err());

        let selection = ctrl.selection();
        assert_eq!(selection.selected_node.as_deref(), Some("C"));
        assert!(selection.included_nodes.is_empty());
        let out = ctrl.render();
        assert_eq!(out.error.unwrap().kind, "transport");
        assert!(out.nodes.iter().all(|n| n.style.background_color != "#d0cece"));
    }

    #[test]
    fn test_stale_selection_discarded() {
        let ctrl = seeded();
        block_on(ctrl.load_org()).unwrap();

        let first = ctrl.begin_selection("A");
        let second = ctrl.begin_selection("B");
        assert_eq!(ctrl.finish_selection(second, Ok(vec!["B".to_string()])).unwrap(), Outcome::Applied);
        assert_eq!(ctrl.finish_selection(first, Ok(vec!["A".to_string()])).unwrap(), Outcome::Stale);
        assert_eq!(ctrl.selection().selected_node.as_deref(), Some("B"));
        assert_eq!(ctrl.selection().included_nodes, set(&["B"]));
    }

    #[test]
    fn test_selection_cleared_by_canvas() {
        let ctrl = seeded();
        block_on(ctrl.load_org()).unwrap();
        let pending = ctrl.begin_selection("B");
        ctrl.select_edge("A", "B");

        ctrl.selection_changed(true, false);
        assert!(ctrl.selection().selected_node.is_none());
        assert!(ctrl.selection().selected_edge.is_some());
        // The in-flight relevance result no longer applies
        assert_eq!(ctrl.finish_selection(pending, Ok(vec!["B".to_string()])).unwrap(), Outcome::Stale);
        assert!(ctrl.selection().included_nodes.is_empty());

        ctrl.selection_changed(true, true);
        assert!(ctrl.selection().selected_edge.is_none());
        assert!(ctrl.render().nodes.iter().all(|n| n.style.background_color == "#faf9f9"));
    }

    #[test]
    fn test_org_switch() {
        let backend = FakeBackend::with_org("acme", vec![perm("A", &[], &["x"])]);
        backend.seed("other", vec![perm("Z", &[], &["z"])]);
        let ctrl = controller(backend);

        block_on(ctrl.load_org()).unwrap();
        assert!(ctrl.graph().contains("A"));
        ctrl.set_org_name("other");
        block_on(ctrl.load_org()).unwrap();
        assert!(ctrl.graph().contains("Z"));
        assert!(!ctrl.graph().contains("A"));
    }
}
