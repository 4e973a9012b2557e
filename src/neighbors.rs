use log::info;
use rayon::prelude::*;

use crate::partition::Cell;

/// one edge of the anti-repetition graph, stored in the owning cell's list.
/// `weight` is the cost of this pair sharing a template.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Neighbor {
    pub cell: usize,
    pub weight: u64,
}

/// edge-to-edge gap between two cells, summed over both axes and
/// normalized by the smaller cell size. overlapping projections
/// contribute zero on that axis, so touching cells are at distance 0.
pub fn cell_distance(a: &Cell, b: &Cell) -> u32 {
    let mut dx = 0;
    if a.x > b.x + b.size {
        dx = a.x - b.x - b.size;
    } else if b.x > a.x + a.size {
        dx = b.x - a.x - a.size;
    }
    let mut dy = 0;
    if a.y > b.y + b.size {
        dy = a.y - b.y - b.size;
    } else if b.y > a.y + a.size {
        dy = b.y - a.y - a.size;
    }
    (dx + dy) / a.size.min(b.size)
}

/// build the per-cell adjacency lists. cells closer than `max_distance`
/// get a symmetric edge weighted (max_distance - distance)^2 * 10000, so
/// the repetition penalty grows quadratically as the gap shrinks and is
/// exactly zero at or beyond the threshold. each row only depends on the
/// immutable cell geometry, so rows build in parallel.
pub fn build_neighbors(cells: &[Cell], max_distance: u32) -> Vec<Vec<Neighbor>> {
    profiling::scope!("build_neighbors");
    let lists: Vec<Vec<Neighbor>> = (0..cells.len())
        .into_par_iter()
        .map(|i| {
            let mut row = Vec::new();
            for (j, other) in cells.iter().enumerate() {
                if i == j {
                    continue;
                }
                let distance = cell_distance(&cells[i], other);
                if distance < max_distance {
                    let d = (max_distance - distance) as u64;
                    row.push(Neighbor { cell: j, weight: d * d * 10000 });
                }
            }
            row
        })
        .collect();

    let edge_count: usize = lists.iter().map(Vec::len).sum();
    info!("neighbor edges: {}", edge_count / 2);
    lists
}
