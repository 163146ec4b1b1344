use bevy::prelude::*;

use super::bodies;
use super::grid;
use super::ui;

/// Viewer for the collision simulation
pub struct CollisionRenderPlugin;

impl Plugin for CollisionRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ui::HudThrottle>()
            .add_systems(Startup, (spawn_camera, ui::spawn_hud))
            .add_systems(
                Update,
                (
                    bodies::draw_bodies,
                    ui::update_collision_hud,
                    ui::collision_pause_system,
                ),
            );
    }
}

/// Viewer for the Wa-Tor simulation
pub struct WatorRenderPlugin;

impl Plugin for WatorRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ui::HudThrottle>()
            .add_systems(
                Startup,
                (spawn_camera, ui::spawn_hud, grid::spawn_grid_sprite),
            )
            .add_systems(
                Update,
                (
                    grid::update_grid_texture,
                    ui::update_wator_hud,
                    ui::wator_pause_system,
                ),
            );
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
