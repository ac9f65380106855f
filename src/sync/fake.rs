//! In-memory backend for controller tests.

use std::cell::RefCell;
use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Value, json};
use url::Url;

use super::{SyncError, Transport};
use crate::model::PermissionNode;

#[derive(Default)]
struct State {
    orgs: HashMap<String, Vec<PermissionNode>>,
    relevance: HashMap<String, Vec<String>>,
    fail_next: Option<SyncError>,
    respond_next: Option<String>,
    requests: Vec<String>,
}

/// Routes requests by path and mutates its organizations the way the real
/// backend does.
#[derive(Default)]
pub struct FakeBackend {
    state: RefCell<State>,
}

impl FakeBackend {
    pub fn with_org(org: &str, nodes: Vec<PermissionNode>) -> Self {
        let backend = Self::default();
        backend.seed(org, nodes);
        backend
    }

    pub fn seed(&self, org: &str, nodes: Vec<PermissionNode>) {
        self.state.borrow_mut().orgs.insert(org.to_string(), nodes);
    }

    /// Fail the next request with `err`.
    pub fn fail_next(&self, err: SyncError) {
        self.state.borrow_mut().fail_next = Some(err);
    }

    /// Answer the next request with `body` verbatim.
    pub fn respond_next(&self, body: &str) {
        self.state.borrow_mut().respond_next = Some(body.to_string());
    }

    /// Fix the `view` result for `name`. Unset names answer with themselves.
    pub fn set_relevance(&self, name: &str, results: &[&str]) {
        self.state
            .borrow_mut()
            .relevance
            .insert(name.to_string(), results.iter().map(|s| s.to_string()).collect());
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.state.borrow().requests.iter().filter(|p| p.as_str() == path).count()
    }

    fn handle(&self, url: &Url, body: Option<&str>) -> Result<String, SyncError> {
        let path = url.path().to_string();
        let mut state = self.state.borrow_mut();
        state.requests.push(path.clone());

        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        if let Some(canned) = state.respond_next.take() {
            return Ok(canned);
        }

        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        let body: Value = body.map(|b| serde_json::from_str(b).unwrap()).unwrap_or(Value::Null);
        let field = |key: &str| -> String {
            query
                .get(key)
                .cloned()
                .or_else(|| body[key].as_str().map(str::to_string))
                .unwrap_or_default()
        };
        let org = field("org_name");

        let reply = match path.as_str() {
            "/load" => {
                let permissions = state.orgs.get(&org).cloned().unwrap_or_default();
                json!({ "permissions": permissions })
            }
            "/view" => {
                let name = field("name");
                let results = state.relevance.get(&name).cloned().unwrap_or_else(|| vec![name]);
                json!({ "results": results })
            }
            "/init" => {
                state.orgs.entry(org).or_default();
                json!({})
            }
            "/add" => {
                state.orgs.entry(org).or_default().push(PermissionNode::new(field("name")));
                json!({})
            }
            "/delete" => {
                let name = field("name");
                let nodes = state.orgs.entry(org).or_default();
                nodes.retain(|n| n.name != name);
                for node in nodes.iter_mut() {
                    node.parents.retain(|p| *p != name);
                }
                json!({})
            }
            "/edit" => {
                let (child, parent) = (field("from"), field("to"));
                let create = body["is_create"].as_bool().unwrap_or(false);
                let nodes = state.orgs.entry(org).or_default();
                if let Some(node) = nodes.iter_mut().find(|n| n.name == child) {
                    if create {
                        if !node.parents.contains(&parent) {
                            node.parents.push(parent);
                        }
                    } else {
                        node.parents.retain(|p| *p != parent);
                    }
                }
                json!({})
            }
            other => {
                return Err(SyncError::Rejected { endpoint: other.to_string(), status: 404 });
            }
        };
        Ok(reply.to_string())
    }
}

#[async_trait(?Send)]
impl Transport for FakeBackend {
    async fn get(&self, url: &Url) -> Result<String, SyncError> {
        self.handle(url, None)
    }

    async fn post_json(&self, url: &Url, body: &str) -> Result<String, SyncError> {
        self.handle(url, Some(body))
    }
}
