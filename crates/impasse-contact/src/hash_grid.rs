//! Spatial hash broad phase over a uniform grid.
//!
//! Partitions space into a uniform grid and bins each primitive's swept
//! box into every cell it touches. Candidate pairs are generated from
//! primitives sharing a cell and then filtered by exact box overlap, so
//! the output equals [`BruteForceBroadPhase`](crate::broad::BruteForceBroadPhase).

use std::collections::HashMap;

use impasse_body::{Pose, RigidBodyAssembler};
use impasse_types::ImpasseResult;

use crate::broad::{Aabb, BroadPhase, PrimitiveBoxes};
use crate::candidates::{Candidates, CollisionKinds};

/// Upper bound on cells spanned along one axis by the largest primitive.
const MAX_CELLS_PER_AXIS: f64 = 8.0;

type CellKey = (i64, i64, i64);

#[derive(Default)]
struct Cell {
    vertices: Vec<usize>,
    edges: Vec<usize>,
    faces: Vec<usize>,
}

/// Spatial hash broad phase using a uniform grid.
///
/// With no explicit cell size, the cell is the mean primitive extent,
/// enlarged when needed so no primitive spans more than a few cells.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashGrid {
    cell_size: Option<f64>,
}

impl HashGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hash grid with a fixed cell size.
    pub fn with_cell_size(cell_size: f64) -> Self {
        Self {
            cell_size: Some(cell_size.max(1e-6)),
        }
    }

    fn choose_cell_size(&self, boxes: &PrimitiveBoxes) -> f64 {
        if let Some(size) = self.cell_size {
            return size;
        }
        let primitives = if boxes.edges.is_empty() {
            &boxes.vertices
        } else {
            &boxes.edges
        };
        let (sum, max) = primitives
            .iter()
            .map(Aabb::extent)
            .fold((0.0, 0.0_f64), |(s, m), e| (s + e, m.max(e)));
        let mean = sum / primitives.len().max(1) as f64;
        let size = mean.max(max / MAX_CELLS_PER_AXIS);
        if size.is_finite() && size > 0.0 {
            size
        } else {
            1.0
        }
    }
}

fn cell_range(bbox: &Aabb, inv_cell_size: f64) -> impl Iterator<Item = CellKey> {
    let lo = (bbox.min * inv_cell_size).floor();
    let hi = (bbox.max * inv_cell_size).floor();
    let (x0, y0, z0) = (lo.x as i64, lo.y as i64, lo.z as i64);
    let (x1, y1, z1) = (hi.x as i64, hi.y as i64, hi.z as i64);
    (x0..=x1).flat_map(move |x| (y0..=y1).flat_map(move |y| (z0..=z1).map(move |z| (x, y, z))))
}

impl BroadPhase for HashGrid {
    fn detect_candidates(
        &self,
        bodies: &RigidBodyAssembler,
        poses_t0: &[Pose],
        poses_t1: &[Pose],
        kinds: CollisionKinds,
        inflation_radius: f64,
    ) -> ImpasseResult<Candidates> {
        let boxes = PrimitiveBoxes::build(bodies, poses_t0, poses_t1, inflation_radius)?;
        let inv_cell_size = 1.0 / self.choose_cell_size(&boxes);

        let mut grid: HashMap<CellKey, Cell> = HashMap::new();
        let needs_vertices = kinds.edge_vertex || kinds.face_vertex;
        if needs_vertices {
            for (v, bbox) in boxes.vertices.iter().enumerate() {
                for key in cell_range(bbox, inv_cell_size) {
                    grid.entry(key).or_default().vertices.push(v);
                }
            }
        }
        if kinds.edge_vertex || kinds.edge_edge {
            for (e, bbox) in boxes.edges.iter().enumerate() {
                for key in cell_range(bbox, inv_cell_size) {
                    grid.entry(key).or_default().edges.push(e);
                }
            }
        }
        if kinds.face_vertex {
            for (f, bbox) in boxes.faces.iter().enumerate() {
                for key in cell_range(bbox, inv_cell_size) {
                    grid.entry(key).or_default().faces.push(f);
                }
            }
        }

        let mut candidates = Candidates::new();
        for cell in grid.values() {
            if kinds.edge_vertex {
                for &e in &cell.edges {
                    candidates
                        .ev
                        .extend(cell.vertices.iter().filter_map(|&v| boxes.edge_vertex(e, v)));
                }
            }
            if kinds.edge_edge {
                for (i, &e0) in cell.edges.iter().enumerate() {
                    let rest = &cell.edges[i + 1..];
                    candidates
                        .ee
                        .extend(rest.iter().filter_map(|&e1| boxes.edge_edge(e0, e1)));
                }
            }
            if kinds.face_vertex {
                for &f in &cell.faces {
                    candidates
                        .fv
                        .extend(cell.vertices.iter().filter_map(|&v| boxes.face_vertex(f, v)));
                }
            }
        }

        // Pairs sharing several cells are found once per cell.
        candidates.sort_and_dedup();
        Ok(candidates)
    }

    fn name(&self) -> &str {
        "hash_grid"
    }
}
