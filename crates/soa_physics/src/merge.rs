use crate::bodies::Bodies;
use crate::spatial::SpatialGrid;
use rayon::prelude::*;
use soa_core::constants::collision::DOMAIN_EXTENT;

/// Whether body `j` absorbs body `i` when the two meet: heavier wins, equal
/// masses go to the higher index.
fn outranks(mass: &[f32], j: usize, i: usize) -> bool {
    mass[j] > mass[i] || (mass[j] == mass[i] && j > i)
}

/// For every body, the nearest outranking body within `threshold`, if any
pub fn find_merge_targets(bodies: &Bodies, threshold: f32) -> Vec<Option<u32>> {
    let grid = SpatialGrid::build(&bodies.pos_x, &bodies.pos_y, DOMAIN_EXTENT, threshold);
    let threshold_sq = threshold * threshold;

    (0..bodies.len())
        .into_par_iter()
        .map(|i| {
            let [x, y] = bodies.pos(i);
            let mut best: Option<(f32, u32)> = None;
            for j in grid.query(x, y) {
                let ju = j as usize;
                if ju == i || !outranks(&bodies.mass, ju, i) {
                    continue;
                }
                let dx = bodies.pos_x[ju] - x;
                let dy = bodies.pos_y[ju] - y;
                let d2 = dx * dx + dy * dy;
                if d2 >= threshold_sq {
                    continue;
                }
                let closer = match best {
                    None => true,
                    Some((bd, bj)) => d2 < bd || (d2 == bd && j < bj),
                };
                if closer {
                    best = Some((d2, j));
                }
            }
            best.map(|(_, j)| j)
        })
        .collect()
}

/// Fold bodies into their targets. A body only merges when its target has
/// no target of its own this round, so every merge lands on a body that
/// survives. Returns the number of bodies removed.
pub fn apply_merges(bodies: &mut Bodies, targets: &[Option<u32>]) -> usize {
    let n = bodies.len();
    let mut keep = vec![true; n];
    let mut merged = 0;

    for i in 0..n {
        let Some(t) = targets[i] else { continue };
        let t = t as usize;
        if targets[t].is_some() {
            continue;
        }

        let m_i = bodies.mass[i];
        let m_t = bodies.mass[t];
        let total = m_i + m_t;

        bodies.vel_x[t] = (bodies.vel_x[i] * m_i + bodies.vel_x[t] * m_t) / total;
        bodies.vel_y[t] = (bodies.vel_y[i] * m_i + bodies.vel_y[t] * m_t) / total;
        bodies.pos_x[t] = (bodies.pos_x[i] * m_i + bodies.pos_x[t] * m_t) / total;
        bodies.pos_y[t] = (bodies.pos_y[i] * m_i + bodies.pos_y[t] * m_t) / total;
        bodies.mass[t] = total;

        keep[i] = false;
        merged += 1;
    }

    if merged > 0 {
        bodies.retain(&keep);
    }
    merged
}

/// Detect and perform one round of merges
pub fn merge_bodies(bodies: &mut Bodies, threshold: f32) -> usize {
    let targets = find_merge_targets(bodies, threshold);
    apply_merges(bodies, &targets)
}
