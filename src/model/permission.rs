use serde::{Deserialize, Serialize};

/// A single permission definition as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionNode {
    /// Unique identifier within an organization.
    pub name: String,
    /// Names of the nodes this one derives from, in backend order.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Capabilities granted relative to the parents.
    #[serde(default)]
    pub additions: Vec<String>,
    /// Capabilities revoked relative to the parents.
    #[serde(default)]
    pub subtractions: Vec<String>,
}

impl PermissionNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            additions: Vec::new(),
            subtractions: Vec::new(),
        }
    }

    pub fn with_parents<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parents = parents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_additions<I, S>(mut self, additions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additions = additions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_subtractions<I, S>(mut self, subtractions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subtractions = subtractions.into_iter().map(Into::into).collect();
        self
    }

    /// A leaf changes nothing itself: it only passes inherited grants through.
    ///
    /// Note that this is about capability content, not graph position.
    pub fn is_leaf(&self) -> bool {
        self.additions.is_empty() && self.subtractions.is_empty()
    }

    /// A root anchors the hierarchy: no parents, and it grants or revokes
    /// something. Parentless grouping nodes are not roots.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty() && !self.is_leaf()
    }
}
