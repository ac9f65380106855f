// Typed client for the permission backend.
//
// Endpoints (org always passed as `org_name`):
//   GET  load?org_name=          -> { permissions: [PermissionNode] }
//   GET  view?org_name=&name=    -> { results: [name] }
//   POST init   { org_name }
//   POST add    { org_name, name, additions, subtractions }
//   POST delete { org_name, name }
//   POST edit   { org_name, from: child, to: parent, is_addition, is_create }

use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{SyncError, Transport};
use crate::model::PermissionNode;

/// Sent with every edge mutation. The backend has never been observed to use
/// any other value.
pub const IS_ADDITION: bool = true;

#[derive(Debug, Serialize)]
pub struct InitRequest<'a> {
    pub org_name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct AddRequest<'a> {
    pub org_name: &'a str,
    pub name: &'a str,
    pub additions: Vec<String>,
    pub subtractions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteRequest<'a> {
    pub org_name: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct EditRequest<'a> {
    pub org_name: &'a str,
    /// The child side of the relationship.
    pub from: &'a str,
    /// The parent side of the relationship.
    pub to: &'a str,
    pub is_addition: bool,
    pub is_create: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoadResponse {
    pub permissions: Vec<PermissionNode>,
}

#[derive(Debug, Deserialize)]
pub struct ViewResponse {
    pub results: Vec<String>,
}

pub struct BackendClient<T> {
    /// Base URL; its path always ends with `/` so endpoints join under it.
    base: Url,
    transport: T,
}

impl<T: Transport> BackendClient<T> {
    pub fn new(base: Url, transport: T) -> Self {
        Self { base, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, SyncError> {
        let mut url = self.base.join(path).map_err(|e| SyncError::InvalidUrl {
            endpoint: format!("/{path}"),
            message: e.to_string(),
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    async fn post<B: Serialize>(&self, path: &str, body: &B) -> Result<(), SyncError> {
        let url = self.endpoint(path, &[])?;
        let body = serde_json::to_string(body).map_err(|e| SyncError::Encode {
            endpoint: url.path().to_string(),
            message: e.to_string(),
        })?;
        debug!("POST {} {}", url, body);
        self.transport.post_json(&url, &body).await?;
        Ok(())
    }

    /// Fetch the full permission set of an organization.
    pub async fn load(&self, org_name: &str) -> Result<Vec<PermissionNode>, SyncError> {
        let url = self.endpoint("load", &[("org_name", org_name)])?;
        debug!("GET {}", url);
        let body = self.transport.get(&url).await?;
        parse::<LoadResponse>(url.path(), &body).map(|r| r.permissions)
    }

    /// Ask the backend which nodes are linked to `name`.
    pub async fn view(&self, org_name: &str, name: &str) -> Result<Vec<String>, SyncError> {
        let url = self.endpoint("view", &[("org_name", org_name), ("name", name)])?;
        debug!("GET {}", url);
        let body = self.transport.get(&url).await?;
        parse::<ViewResponse>(url.path(), &body).map(|r| r.results)
    }

    pub async fn init(&self, org_name: &str) -> Result<(), SyncError> {
        self.post("init", &InitRequest { org_name }).await
    }

    /// Create a node that grants and revokes nothing.
    pub async fn add(&self, org_name: &str, name: &str) -> Result<(), SyncError> {
        let request = AddRequest {
            org_name,
            name,
            additions: Vec::new(),
            subtractions: Vec::new(),
        };
        self.post("add", &request).await
    }

    pub async fn delete(&self, org_name: &str, name: &str) -> Result<(), SyncError> {
        self.post("delete", &DeleteRequest { org_name, name }).await
    }

    /// Create or remove the parent -> child relationship.
    pub async fn edit(&self, org_name: &str, parent: &str, child: &str, is_create: bool) -> Result<(), SyncError> {
        let request = EditRequest {
            org_name,
            from: child,
            to: parent,
            is_addition: IS_ADDITION,
            is_create,
        };
        self.post("edit", &request).await
    }
}

fn parse<R: DeserializeOwned>(endpoint: &str, body: &str) -> Result<R, SyncError> {
    serde_json::from_str(body).map_err(|e| SyncError::MalformedResponse {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}
