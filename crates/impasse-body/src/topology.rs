//! Edge topology derived from faces.

use std::collections::BTreeSet;

/// Unique undirected edges of a triangle list, as `(v_min, v_max)` pairs.
///
/// The output is sorted, so the edge numbering is deterministic for a
/// given face list.
pub fn unique_edges(faces: &[[u32; 3]]) -> Vec<[u32; 2]> {
    let mut set = BTreeSet::new();
    for &[a, b, c] in faces {
        for (v0, v1) in [(a, b), (b, c), (c, a)] {
            let key = if v0 < v1 { [v0, v1] } else { [v1, v0] };
            set.insert(key);
        }
    }
    set.into_iter().collect()
}

/// Returns the number of edges used by exactly one face.
pub fn boundary_edge_count(faces: &[[u32; 3]]) -> usize {
    let mut counts = std::collections::BTreeMap::new();
    for &[a, b, c] in faces {
        for (v0, v1) in [(a, b), (b, c), (c, a)] {
            let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
            *counts.entry(key).or_insert(0usize) += 1;
        }
    }
    counts.values().filter(|&&n| n == 1).count()
}

/// Returns true if the face list is closed (no boundary edges).
pub fn is_closed(faces: &[[u32; 3]]) -> bool {
    !faces.is_empty() && boundary_edge_count(faces) == 0
}
