use bevy::math::Isometry2d;
use bevy::prelude::*;
use soa_sim::CollisionSim;

/// Screen pixels per domain unit
const VIEW_SCALE: f32 = 450.0;

/// Largest rendered body radius in pixels
const MAX_RADIUS_PX: f32 = 6.0;

/// Draw every body as a circle sized by mass
pub fn draw_bodies(sim: Res<CollisionSim>, mut gizmos: Gizmos) {
    let bodies = &sim.bodies;
    // Merged bodies grow past max_mass; scale against the heaviest one
    let heaviest = bodies.mass.iter().copied().fold(sim.config.max_mass, f32::max);

    gizmos.rect_2d(
        Isometry2d::IDENTITY,
        Vec2::splat(2.0 * VIEW_SCALE),
        Color::srgba(0.3, 0.3, 0.4, 0.6),
    );

    for i in 0..bodies.len() {
        let [x, y] = bodies.pos(i);
        let weight = (bodies.mass[i] / heaviest).sqrt();
        let radius = (weight * MAX_RADIUS_PX).max(0.75);
        gizmos.circle_2d(
            Isometry2d::from_translation(Vec2::new(x, y) * VIEW_SCALE),
            radius,
            body_color(weight),
        );
    }
}

fn body_color(weight: f32) -> Color {
    // Light bodies blue, heavy ones warm
    Color::srgb(0.4 + 0.6 * weight, 0.6, 1.0 - 0.7 * weight)
}
