// Layered (Sugiyama-style) placement.
//
// Phases:
//   1. Rank assignment: longest path from the sinks of the child -> parent graph
//   2. Virtual nodes on edges spanning more than one rank
//   3. Crossing reduction: alternating barycenter sweeps, best ordering kept
//   4. Coordinate assignment: packing plus neighbour-averaging passes
//
// Rank 0 is the top row of the raw layout. Children always rank above their
// parents here; orientation correction runs afterwards.

use std::collections::HashSet;

use super::adjacency::LayerGraph;
use super::{LayoutConfig, PointI};

#[derive(Debug, Clone)]
pub struct Ranking {
    /// Rank per real node.
    pub rank: Vec<usize>,
    pub rank_count: usize,
    /// Child -> parent edges closing a cycle; ignored for ranking.
    back_edges: HashSet<(usize, usize)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Rank nodes by longest path to a sink, iteratively.
///
/// A node without resolved parents has height 0 and lands on the last rank;
/// every other node is one rank above its highest parent.
pub fn assign_ranks(graph: &LayerGraph) -> Ranking {
    let n = graph.len();
    let mut height = vec![0usize; n];
    let mut state = vec![Visit::New; n];
    let mut back_edges = HashSet::new();

    for start in 0..n {
        if state[start] != Visit::New {
            continue;
        }
        state[start] = Visit::Active;
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            if let Some(&parent) = graph.parents_of(node).get(next) {
                frame.1 += 1;
                match state[parent] {
                    Visit::New => {
                        state[parent] = Visit::Active;
                        stack.push((parent, 0));
                    }
                    Visit::Active => {
                        back_edges.insert((node, parent));
                    }
                    Visit::Done => {}
                }
            } else {
                height[node] = graph
                    .parents_of(node)
                    .iter()
                    .filter(|&&p| !back_edges.contains(&(node, p)))
                    .map(|&p| height[p] + 1)
                    .max()
                    .unwrap_or(0);
                state[node] = Visit::Done;
                stack.pop();
            }
        }
    }

    let max_height = height.iter().copied().max().unwrap_or(0);
    Ranking {
        rank: height.iter().map(|h| max_height - h).collect(),
        rank_count: if n == 0 { 0 } else { max_height + 1 },
        back_edges,
    }
}

/// A real or virtual node placed in a rank.
#[derive(Debug, Clone)]
pub struct LayerNode {
    /// Index of the real node, None for virtual nodes.
    pub real: Option<usize>,
    pub rank: usize,
    pub width: f64,
    /// Neighbours on the rank above.
    pub up: Vec<usize>,
    /// Neighbours on the rank below.
    pub down: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Layers {
    /// Real nodes first (same indices as the layout graph), then virtual nodes.
    pub nodes: Vec<LayerNode>,
    /// Node indices per rank, in current left-to-right order.
    pub ranks: Vec<Vec<usize>>,
    pub real_count: usize,
}

impl Layers {
    /// Position of every node within its rank.
    fn positions(&self) -> Vec<usize> {
        let mut pos = vec![0; self.nodes.len()];
        for rank in &self.ranks {
            for (i, &v) in rank.iter().enumerate() {
                pos[v] = i;
            }
        }
        pos
    }

    fn link(&mut self, upper: usize, lower: usize) {
        self.nodes[upper].down.push(lower);
        self.nodes[lower].up.push(upper);
    }
}

/// Materialize ranks, splitting long edges with virtual nodes.
/// Initial order within a rank is backend order, then virtual nodes by creation.
pub fn build_layers(graph: &LayerGraph, ranking: &Ranking, cfg: &LayoutConfig) -> Layers {
    let mut layers = Layers {
        nodes: (0..graph.len())
            .map(|i| LayerNode {
                real: Some(i),
                rank: ranking.rank[i],
                width: cfg.node_size(graph.name(i)).w as f64,
                up: Vec::new(),
                down: Vec::new(),
            })
            .collect(),
        ranks: vec![Vec::new(); ranking.rank_count],
        real_count: graph.len(),
    };

    for child in 0..graph.len() {
        for &parent in graph.parents_of(child) {
            if ranking.back_edges.contains(&(child, parent)) {
                continue;
            }
            let (top, bottom) = (ranking.rank[child], ranking.rank[parent]);
            let mut prev = child;
            for rank in top + 1..bottom {
                let virt = layers.nodes.len();
                layers.nodes.push(LayerNode {
                    real: None,
                    rank,
                    width: 0.0,
                    up: Vec::new(),
                    down: Vec::new(),
                });
                layers.link(prev, virt);
                prev = virt;
            }
            layers.link(prev, parent);
        }
    }

    for (v, node) in layers.nodes.iter().enumerate() {
        layers.ranks[node.rank].push(v);
    }
    layers
}

/// Reduce crossings with alternating barycenter sweeps.
/// The ordering with the fewest crossings seen wins; ties keep the earlier one.
pub fn order_layers(layers: &mut Layers, sweeps: usize) {
    if layers.ranks.len() < 2 {
        return;
    }

    let mut best = layers.ranks.clone();
    let mut best_crossings = count_crossings(layers);

    for sweep in 0..sweeps {
        if best_crossings == 0 {
            break;
        }
        if sweep % 2 == 0 {
            for r in 1..layers.ranks.len() {
                reorder_rank(layers, r, true);
            }
        } else {
            for r in (0..layers.ranks.len() - 1).rev() {
                reorder_rank(layers, r, false);
            }
        }

        let crossings = count_crossings(layers);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.ranks.clone();
        }
    }

    layers.ranks = best;
}

/// Sort one rank by the mean position of its neighbours on the adjacent rank.
/// Nodes without neighbours there keep their current index as key.
fn reorder_rank(layers: &mut Layers, r: usize, use_up: bool) {
    let pos = layers.positions();
    let mut keyed: Vec<(f64, usize, usize)> = layers.ranks[r]
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let node = &layers.nodes[v];
            let neighbours = if use_up { &node.up } else { &node.down };
            let key = if neighbours.is_empty() {
                i as f64
            } else {
                neighbours.iter().map(|&u| pos[u] as f64).sum::<f64>() / neighbours.len() as f64
            };
            (key, i, v)
        })
        .collect();

    keyed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    layers.ranks[r] = keyed.into_iter().map(|(_, _, v)| v).collect();
}

/// Count pairwise segment crossings between every pair of adjacent ranks.
pub fn count_crossings(layers: &Layers) -> usize {
    let pos = layers.positions();
    let mut total = 0;

    for rank in &layers.ranks {
        let mut segments: Vec<(usize, usize)> = Vec::new();
        for &u in rank {
            for &w in &layers.nodes[u].down {
                segments.push((pos[u], pos[w]));
            }
        }
        for i in 0..segments.len() {
            for j in i + 1..segments.len() {
                let (a1, b1) = segments[i];
                let (a2, b2) = segments[j];
                if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                    total += 1;
                }
            }
        }
    }
    total
}

fn half_sep(node: &LayerNode, cfg: &LayoutConfig) -> f64 {
    if node.real.is_some() {
        cfg.node_sep as f64 / 2.0
    } else {
        cfg.edge_sep as f64 / 2.0
    }
}

/// Minimum distance between the centres of two horizontally adjacent nodes.
fn min_gap(layers: &Layers, cfg: &LayoutConfig, left: usize, right: usize) -> f64 {
    let (a, b) = (&layers.nodes[left], &layers.nodes[right]);
    a.width / 2.0 + b.width / 2.0 + half_sep(a, cfg) + half_sep(b, cfg)
}

/// Centre coordinates for every real node, indexed like the layout graph.
pub fn assign_coordinates(layers: &Layers, cfg: &LayoutConfig) -> Vec<PointI> {
    let mut x = vec![0.0f64; layers.nodes.len()];

    // Initial packing, left to right
    for rank in &layers.ranks {
        for (i, &v) in rank.iter().enumerate() {
            x[v] = if i == 0 {
                layers.nodes[v].width / 2.0
            } else {
                x[rank[i - 1]] + min_gap(layers, cfg, rank[i - 1], v)
            };
        }
    }

    let rank_count = layers.ranks.len();
    if rank_count > 1 {
        for pass in 0..cfg.position_passes {
            if pass % 2 == 0 {
                for r in 1..rank_count {
                    align_rank(layers, cfg, r, true, &mut x);
                }
            } else {
                for r in (0..rank_count - 1).rev() {
                    align_rank(layers, cfg, r, false, &mut x);
                }
            }
        }
    }

    let min_left = (0..layers.real_count)
        .map(|v| x[v] - layers.nodes[v].width / 2.0)
        .fold(f64::INFINITY, f64::min);
    let min_left = if min_left.is_finite() { min_left } else { 0.0 };
    let row_height = cfg.node_height + cfg.rank_sep;

    (0..layers.real_count)
        .map(|v| PointI {
            x: (x[v] - min_left).round() as i32,
            y: layers.nodes[v].rank as i32 * row_height + cfg.node_height / 2,
        })
        .collect()
}

/// Pull a rank towards its neighbours on the adjacent rank while keeping order
/// and spacing: clamp left to right, then shift the whole rank by the mean
/// remaining offset.
fn align_rank(layers: &Layers, cfg: &LayoutConfig, r: usize, use_up: bool, x: &mut [f64]) {
    let rank = &layers.ranks[r];
    if rank.is_empty() {
        return;
    }

    let desired: Vec<f64> = rank
        .iter()
        .map(|&v| {
            let node = &layers.nodes[v];
            let neighbours = if use_up { &node.up } else { &node.down };
            if neighbours.is_empty() {
                x[v]
            } else {
                neighbours.iter().map(|&u| x[u]).sum::<f64>() / neighbours.len() as f64
            }
        })
        .collect();

    let mut placed: Vec<f64> = Vec::with_capacity(rank.len());
    for (i, &v) in rank.iter().enumerate() {
        let pos = if i == 0 {
            desired[0]
        } else {
            desired[i].max(placed[i - 1] + min_gap(layers, cfg, rank[i - 1], v))
        };
        placed.push(pos);
    }

    let shift = desired.iter().zip(&placed).map(|(d, p)| d - p).sum::<f64>() / rank.len() as f64;
    for (i, &v) in rank.iter().enumerate() {
        x[v] = placed[i] + shift;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PermissionGraph, PermissionNode};

    fn make_graph(nodes: &[(&str, &[&str])]) -> LayerGraph {
        LayerGraph::from_graph(&PermissionGraph::from_nodes(
            nodes
                .iter()
                .map(|(name, parents)| PermissionNode::new(*name).with_parents(parents.iter().copied())),
        ))
    }

    #[test]
    fn test_ranks_chain() {
        // A <- B <- C: C has the longest path to the sink A
        let g = make_graph(&[("A", &[]), ("B", &["A"]), ("C", &["B"])]);
        let ranking = assign_ranks(&g);
        assert_eq!(ranking.rank, vec![2, 1, 0]);
        assert_eq!(ranking.rank_count, 3);
    }

    #[test]
    fn test_ranks_use_longest_path() {
        // D has parents at two depths, it sits above the deeper one
        let g = make_graph(&[("A", &[]), ("B", &["A"]), ("D", &["A", "B"])]);
        let ranking = assign_ranks(&g);
        assert_eq!(ranking.rank, vec![2, 1, 0]);
    }

    #[test]
    fn test_long_edge_gets_virtual_node() {
        let g = make_graph(&[("A", &[]), ("B", &["A"]), ("D", &["A", "B"])]);
        let ranking = assign_ranks(&g);
        let layers = build_layers(&g, &ranking, &LayoutConfig::default());
        // D -> A spans two ranks: one virtual node on rank 1
        assert_eq!(layers.nodes.len(), 4);
        assert_eq!(layers.nodes[3].real, None);
        assert_eq!(layers.nodes[3].rank, 1);
        assert_eq!(layers.ranks[1], vec![1, 3]);
    }

    #[test]
    fn test_cycle_ranks_terminate() {
        let g = make_graph(&[("A", &["B"]), ("B", &["A"])]);
        let ranking = assign_ranks(&g);
        assert_eq!(ranking.rank.len(), 2);
        assert_eq!(ranking.back_edges.len(), 1);
    }

    #[test]
    fn test_sweeps_remove_crossing() {
        // C1 -> P2 and C2 -> P1 cross in the initial backend order
        let g = make_graph(&[("P1", &[]), ("P2", &[]), ("C1", &["P2"]), ("C2", &["P1"])]);
        let ranking = assign_ranks(&g);
        let mut layers = build_layers(&g, &ranking, &LayoutConfig::default());
        assert_eq!(count_crossings(&layers), 1);

        order_layers(&mut layers, 4);
        assert_eq!(count_crossings(&layers), 0);
    }

    #[test]
    fn test_coordinates_row_spacing() {
        let g = make_graph(&[("A", &[]), ("B", &["A"])]);
        let cfg = LayoutConfig::default();
        let ranking = assign_ranks(&g);
        let layers = build_layers(&g, &ranking, &cfg);
        let points = assign_coordinates(&layers, &cfg);
        // B on rank 0, A on rank 1
        assert_eq!(points[1].y, 50);
        assert_eq!(points[0].y, 200);
        // Single chain is vertically aligned
        assert_eq!(points[0].x, points[1].x);
    }
}
