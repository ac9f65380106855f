// Orientation correction.
//
// The layered pass puts descendants on top. When the topmost node (the apex)
// is not a true root the whole layout is flipped vertically so that roots end
// up on the topmost row.

use std::collections::HashSet;

use super::PlacedNode;
use crate::model::PermissionNode;

/// Names of nodes with no parents that grant or revoke something.
pub fn find_roots(nodes: &[PermissionNode]) -> HashSet<String> {
    nodes
        .iter()
        .filter(|n| n.is_root())
        .map(|n| n.name.clone())
        .collect()
}

/// Flip `nodes` vertically if the apex is not a root.
///
/// The apex is the first node, in order, with the smallest y. Flipping maps
/// `y` to `max_y - y + min_y`, so the occupied vertical range is unchanged.
/// Returns whether the layout was flipped; empty input is never flipped.
pub fn correct_orientation(nodes: &mut [PlacedNode], roots: &HashSet<String>) -> bool {
    let Some(apex) = nodes.iter().reduce(|best, n| {
        if n.position.y < best.position.y { n } else { best }
    }) else {
        return false;
    };

    if roots.contains(&apex.id) {
        return false;
    }

    let min_y = apex.position.y;
    let max_y = nodes.iter().map(|n| n.position.y).max().unwrap_or(min_y);
    for node in nodes.iter_mut() {
        node.position.y = max_y - node.position.y + min_y;
    }
    true
}
