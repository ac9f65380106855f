// Layout graph built from a permission list.
//
// Edges run from each node to each of its parents (child -> parent); that is
// the graph the layered layout ranks. Render edges are reported the other way
// round, parent -> child.

use std::collections::HashMap;

use log::warn;

use super::LayoutEdge;
use crate::model::PermissionGraph;

/// Index-based child -> parent adjacency.
#[derive(Debug, Clone)]
pub struct LayerGraph {
    /// Node names, in backend order. Index = position in this vector.
    names: Vec<String>,
    /// For each node, resolved parent indices (first occurrence order, no repeats).
    parents: Vec<Vec<usize>>,
    /// Parent references that did not resolve.
    missing: Vec<LayoutEdge>,
}

impl LayerGraph {
    pub fn from_graph(graph: &PermissionGraph) -> Self {
        let index: HashMap<&str, usize> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name.as_str(), i))
            .collect();

        let n = graph.len();
        let mut parents: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut missing = Vec::new();

        for (child, node) in graph.nodes().iter().enumerate() {
            for parent_name in &node.parents {
                match index.get(parent_name.as_str()) {
                    Some(&parent) => {
                        if !parents[child].contains(&parent) {
                            parents[child].push(parent);
                        }
                    }
                    None => {
                        warn!("'{}' references unknown parent '{}'", node.name, parent_name);
                        missing.push(LayoutEdge::new(parent_name.clone(), node.name.clone()));
                    }
                }
            }
        }

        Self {
            names: graph.nodes().iter().map(|n| n.name.clone()).collect(),
            parents,
            missing,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Resolved parents of a node, or empty slice if none.
    pub fn parents_of(&self, node: usize) -> &[usize] {
        self.parents.get(node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }

    pub fn missing_edges(&self) -> &[LayoutEdge] {
        &self.missing
    }

    /// Parent -> child edges between resolved nodes, in backend order.
    pub fn render_edges(&self) -> Vec<LayoutEdge> {
        self.parents
            .iter()
            .enumerate()
            .flat_map(|(child, ps)| {
                ps.iter()
                    .map(move |&parent| LayoutEdge::new(self.names[parent].clone(), self.names[child].clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PermissionNode;

    fn make_test_graph() -> PermissionGraph {
        // A <- B <- C, C also points at a missing node and repeats B
        PermissionGraph::from_nodes([
            PermissionNode::new("A"),
            PermissionNode::new("B").with_parents(["A"]),
            PermissionNode::new("C").with_parents(["B", "missing", "B"]),
        ])
    }

    #[test]
    fn test_resolved_parents() {
        let g = LayerGraph::from_graph(&make_test_graph());
        assert_eq!(g.len(), 3);
        assert_eq!(g.name(2), "C");
        assert_eq!(g.parents_of(1), &[0]);
        // Repeated and missing parents are dropped
        assert_eq!(g.parents_of(2), &[1]);
        assert!(g.parents_of(0).is_empty());
    }

    #[test]
    fn test_missing_and_render_edges() {
        let g = LayerGraph::from_graph(&make_test_graph());
        assert_eq!(g.missing_edges(), &[LayoutEdge::new("missing", "C")]);
        assert_eq!(
            g.render_edges(),
            vec![LayoutEdge::new("A", "B"), LayoutEdge::new("B", "C")]
        );
    }
}
