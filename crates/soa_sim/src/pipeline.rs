use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;

use super::collision::CollisionSim;
use super::wator::WatorSim;

/// Bevy plugin stepping whichever simulation resource is present, one
/// iteration per frame
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                collision_tick.run_if(resource_exists::<CollisionSim>),
                wator_tick.run_if(resource_exists::<WatorSim>),
            ),
        );
    }
}

fn collision_tick(mut sim: ResMut<CollisionSim>) {
    if sim.paused {
        return;
    }
    if sim.is_finished() {
        let stats = sim.stats();
        info!(
            "Collision run finished after {} iterations: {} bodies, checksum {:.6}",
            stats.iteration, stats.bodies, stats.checksum
        );
        sim.paused = true;
        return;
    }
    sim.step();
}

fn wator_tick(mut sim: ResMut<WatorSim>) {
    if sim.paused {
        return;
    }
    if sim.is_finished() {
        let stats = sim.stats();
        info!(
            "Wa-Tor run finished after {} iterations: {} fish, {} sharks",
            stats.iteration, stats.fish, stats.sharks
        );
        sim.paused = true;
        return;
    }
    sim.step();
}

/// Install bevy's log subscriber for runs without a window. Windowed runs
/// get it from `DefaultPlugins` instead.
///
/// `LogPlugin` sets the process-wide tracing subscriber while the app is
/// built, so logging keeps working after this throwaway `App` is dropped.
pub fn init_headless_logging(level: Level) {
    App::new().add_plugins((
        MinimalPlugins,
        LogPlugin {
            level,
            ..default()
        },
    ));
}
