//! Per-triangle aerodynamic drag and lift.
//!
//! Each triangle sees the air through its average Verlet velocity relative
//! to the wind. Drag acts along the triangle normal against the relative
//! flow; lift acts perpendicular to the flow in the plane spanned by the
//! flow and the normal. The resulting force is split evenly over the three
//! corners and applied as a position offset.

use loom_math::Vec3;

/// Applies one iteration of aerodynamic forces.
#[allow(clippy::too_many_arguments)]
pub fn apply_aerodynamics(
    positions: &mut [Vec3],
    prev_positions: &[Vec3],
    inv_masses: &[f32],
    indices: &[u32],
    wind: Vec3,
    drag: f32,
    lift: f32,
    iteration_dt: f32,
) {
    if drag == 0.0 && lift == 0.0 {
        return;
    }
    let inv_dt = 1.0 / iteration_dt;
    let dt2 = iteration_dt * iteration_dt;

    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let cross = (positions[b] - positions[a]).cross(positions[c] - positions[a]);
        let double_area = cross.length();
        if double_area < 1e-12 {
            continue;
        }
        let normal = cross / double_area;
        let area = 0.5 * double_area;

        let velocity = (positions[a] - prev_positions[a]
            + positions[b] - prev_positions[b]
            + positions[c] - prev_positions[c])
            * (inv_dt / 3.0);
        let relative = velocity - wind;
        let speed2 = relative.length_squared();
        if speed2 < 1e-12 {
            continue;
        }
        let flow = relative / speed2.sqrt();
        let cos = flow.dot(normal);

        let mut force = -normal * (drag * area * speed2 * cos);
        if lift != 0.0 {
            let lift_dir = (normal - flow * cos).normalize_or_zero();
            let sin = (1.0 - cos * cos).max(0.0).sqrt();
            force -= lift_dir * (lift * area * speed2 * cos * sin);
        }

        let offset = force * (dt2 / 3.0);
        for i in [a, b, c] {
            positions[i] += offset * inv_masses[i];
        }
    }
}
