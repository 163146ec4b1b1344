use crate::bodies::Bodies;
use rayon::prelude::*;

/// Gravitational force exerted by body j on body i
/// Returns [fx, fy]
pub fn gravity_force(
    pos_i: [f32; 2],
    mass_i: f32,
    pos_j: [f32; 2],
    mass_j: f32,
    gravity_constant: f32,
    softening: f32,
) -> [f32; 2] {
    let dx = pos_j[0] - pos_i[0];
    let dy = pos_j[1] - pos_i[1];

    let r2 = dx * dx + dy * dy + softening * softening;
    if r2 == 0.0 {
        return [0.0, 0.0];
    }
    let r = r2.sqrt();
    let r3 = r2 * r;

    let f = gravity_constant * mass_i * mass_j / r3;

    [f * dx, f * dy]
}

/// All-pairs force accumulation. Each body sums its own row, so results do
/// not depend on how rayon splits the work.
pub fn compute_forces(bodies: &mut Bodies, gravity_constant: f32, softening: f32) {
    let Bodies {
        pos_x,
        pos_y,
        mass,
        force_x,
        force_y,
        ..
    } = bodies;
    let (pos_x, pos_y, mass) = (&*pos_x, &*pos_y, &*mass);
    let n = pos_x.len();

    force_x
        .par_iter_mut()
        .zip(force_y.par_iter_mut())
        .enumerate()
        .for_each(|(i, (fx, fy))| {
            let pos_i = [pos_x[i], pos_y[i]];
            let mut sum = [0.0f32; 2];
            for j in 0..n {
                if j == i {
                    continue;
                }
                let f = gravity_force(
                    pos_i,
                    mass[i],
                    [pos_x[j], pos_y[j]],
                    mass[j],
                    gravity_constant,
                    softening,
                );
                sum[0] += f[0];
                sum[1] += f[1];
            }
            *fx = sum[0];
            *fy = sum[1];
        });
}
