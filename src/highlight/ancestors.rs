// Ancestor walk over `parents` links.
//
// Emits, for every parent of the current node, the current node's name
// followed by the walk of that parent. The result is not
// deduplicated: a node reached through several parents appears once per path
// step. Callers fold it into a set.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use log::warn;

use crate::model::PermissionGraph;

/// What the walk yields for a node without parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncestorPolicy {
    /// `[name]`: the walk of A <- B <- C from C is `[C, B, A]`.
    #[default]
    SelfInclusive,
    /// `[]`: the walk of A <- B <- C from C is `[C, B]`.
    Exclusive,
}

pub const DEFAULT_ANCESTOR_POLICY: AncestorPolicy = AncestorPolicy::SelfInclusive;

/// Walk from `name` up through its parents, using an explicit stack.
///
/// Unknown start names yield nothing. A parent name without a node counts as
/// a node without parents. A parent already on the current path is skipped.
pub fn ancestors_of(graph: &PermissionGraph, name: &str, policy: AncestorPolicy) -> Vec<String> {
    let mut out = Vec::new();
    if !graph.contains(name) {
        return out;
    }

    // (node, index of the next parent to visit)
    let mut stack: Vec<(&str, usize)> = vec![(name, 0)];
    let mut on_path: HashSet<&str> = HashSet::from([name]);

    while let Some(frame) = stack.last_mut() {
        let (node, next) = *frame;
        let parents = graph.parents_of(node);

        if parents.is_empty() {
            if policy == AncestorPolicy::SelfInclusive {
                out.push(node.to_string());
            }
            on_path.remove(node);
            stack.pop();
            continue;
        }

        match parents.get(next) {
            Some(parent) => {
                frame.1 += 1;
                if on_path.contains(parent.as_str()) {
                    warn!("cycle through '{}' while walking ancestors of '{}'", parent, name);
                    continue;
                }
                out.push(node.to_string());
                on_path.insert(parent.as_str());
                stack.push((parent.as_str(), 0));
            }
            None => {
                on_path.remove(node);
                stack.pop();
            }
        }
    }

    out
}
