use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use soa_core::{CollisionConfig, CollisionStats, ConfigError};
use soa_physics::{forces, merge, Bodies};

/// N-body collision state, tracked as a Bevy Resource
#[derive(Resource)]
pub struct CollisionSim {
    pub config: CollisionConfig,
    pub bodies: Bodies,
    pub iteration: u32,
    /// Bodies absorbed by merges since t = 0
    pub merged: usize,
    /// Whether the viewer should stop stepping
    pub paused: bool,
}

impl CollisionSim {
    pub fn new(config: CollisionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let bodies = Bodies::generate(&config, &mut rng);
        info!(
            "Generated {} bodies (seed {}, max mass {})",
            bodies.len(),
            config.seed,
            config.max_mass
        );
        Ok(Self::from_parts(config, bodies, 0, 0))
    }

    pub fn from_parts(config: CollisionConfig, bodies: Bodies, iteration: u32, merged: usize) -> Self {
        Self {
            config,
            bodies,
            iteration,
            merged,
            paused: false,
        }
    }

    /// Forces, integration, then one round of merges
    pub fn step(&mut self) {
        forces::compute_forces(
            &mut self.bodies,
            self.config.gravity_constant,
            self.config.softening,
        );
        self.bodies
            .integrate(self.config.time_interval, self.config.dampening_factor);

        let removed = merge::merge_bodies(&mut self.bodies, self.config.merge_threshold);
        if removed > 0 {
            debug!(
                "iteration {}: merged {} bodies, {} left",
                self.iteration,
                removed,
                self.bodies.len()
            );
        }
        self.merged += removed;
        self.iteration += 1;
    }

    /// Run `iterations` steps and report the final state
    pub fn run(&mut self, iterations: u32) -> CollisionStats {
        for _ in 0..iterations {
            self.step();
            if self.iteration % 100 == 0 {
                info!(
                    "iteration {}/{}: {} bodies",
                    self.iteration,
                    self.config.iterations,
                    self.bodies.len()
                );
            }
        }
        self.stats()
    }

    pub fn is_finished(&self) -> bool {
        self.iteration >= self.config.iterations
    }

    pub fn stats(&self) -> CollisionStats {
        CollisionStats {
            iteration: self.iteration,
            bodies: self.bodies.len(),
            total_mass: self.bodies.total_mass(),
            momentum: self.bodies.momentum(),
            checksum: self.bodies.checksum(),
            merged: self.merged,
        }
    }
}
