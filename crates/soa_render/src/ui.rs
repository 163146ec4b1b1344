use bevy::prelude::*;
use soa_sim::{CollisionSim, WatorSim};

/// Marker for the HUD text
#[derive(Component)]
pub struct HudText;

/// HUD frame counter for throttling
#[derive(Resource, Default)]
pub struct HudThrottle {
    pub frame: u32,
}

impl HudThrottle {
    /// True on every 10th frame
    fn tick(&mut self) -> bool {
        self.frame = self.frame.wrapping_add(1);
        self.frame % 10 == 0
    }
}

pub fn spawn_hud(mut commands: Commands) {
    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgba(0.9, 0.9, 1.0, 0.9)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(10.0),
            left: Val::Px(10.0),
            ..default()
        },
        HudText,
    ));
}

fn status(paused: bool, finished: bool) -> &'static str {
    if finished {
        "finished"
    } else if paused {
        "paused (space)"
    } else {
        "running (space to pause)"
    }
}

pub fn update_collision_hud(
    sim: Res<CollisionSim>,
    mut throttle: ResMut<HudThrottle>,
    mut query: Query<&mut Text, With<HudText>>,
) {
    if !throttle.tick() {
        return;
    }
    let stats = sim.stats();
    for mut text in query.iter_mut() {
        **text = format!(
            "Collision  iteration {}/{}\nbodies {}  merged {}\ntotal mass {:.1}\n{}",
            stats.iteration,
            sim.config.iterations,
            stats.bodies,
            stats.merged,
            stats.total_mass,
            status(sim.paused, sim.is_finished()),
        );
    }
}

pub fn update_wator_hud(
    sim: Res<WatorSim>,
    mut throttle: ResMut<HudThrottle>,
    mut query: Query<&mut Text, With<HudText>>,
) {
    if !throttle.tick() {
        return;
    }
    let stats = sim.stats();
    for mut text in query.iter_mut() {
        **text = format!(
            "Wa-Tor {}x{}  iteration {}/{}\nfish {}  sharks {}\n{}",
            sim.torus.size_x,
            sim.torus.size_y,
            stats.iteration,
            sim.config.num_iterations,
            stats.fish,
            stats.sharks,
            status(sim.paused, sim.is_finished()),
        );
    }
}

pub fn collision_pause_system(keyboard: Res<ButtonInput<KeyCode>>, mut sim: ResMut<CollisionSim>) {
    if keyboard.just_pressed(KeyCode::Space) && !sim.is_finished() {
        sim.paused = !sim.paused;
    }
}

pub fn wator_pause_system(keyboard: Res<ButtonInput<KeyCode>>, mut sim: ResMut<WatorSim>) {
    if keyboard.just_pressed(KeyCode::Space) && !sim.is_finished() {
        sim.paused = !sim.paused;
    }
}
