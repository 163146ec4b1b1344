use rand::Rng;
use serde::{Deserialize, Serialize};
use soa_core::constants::collision::DOMAIN_EXTENT;
use soa_core::CollisionConfig;

/// Structure-of-arrays body storage. All vectors always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bodies {
    pub pos_x: Vec<f32>,
    pub pos_y: Vec<f32>,
    pub vel_x: Vec<f32>,
    pub vel_y: Vec<f32>,
    pub force_x: Vec<f32>,
    pub force_y: Vec<f32>,
    pub mass: Vec<f32>,
}

impl Bodies {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            pos_x: Vec::with_capacity(n),
            pos_y: Vec::with_capacity(n),
            vel_x: Vec::with_capacity(n),
            vel_y: Vec::with_capacity(n),
            force_x: Vec::with_capacity(n),
            force_y: Vec::with_capacity(n),
            mass: Vec::with_capacity(n),
        }
    }

    /// Generate the initial body distribution
    pub fn generate(config: &CollisionConfig, rng: &mut impl Rng) -> Self {
        let n = config.num_bodies as usize;
        let mut bodies = Self::with_capacity(n);
        let speed = config.max_initial_speed;

        for _ in 0..n {
            let pos = [
                rng.gen_range(-DOMAIN_EXTENT..DOMAIN_EXTENT),
                rng.gen_range(-DOMAIN_EXTENT..DOMAIN_EXTENT),
            ];
            let vel = if speed > 0.0 {
                [rng.gen_range(-speed..speed), rng.gen_range(-speed..speed)]
            } else {
                [0.0, 0.0]
            };
            let mass = rng.gen_range(config.max_mass * 0.5..config.max_mass);
            bodies.push(pos, vel, mass);
        }

        bodies
    }

    pub fn push(&mut self, pos: [f32; 2], vel: [f32; 2], mass: f32) {
        self.pos_x.push(pos[0]);
        self.pos_y.push(pos[1]);
        self.vel_x.push(vel[0]);
        self.vel_y.push(vel[1]);
        self.force_x.push(0.0);
        self.force_y.push(0.0);
        self.mass.push(mass);
    }

    pub fn len(&self) -> usize {
        self.mass.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mass.is_empty()
    }

    pub fn pos(&self, i: usize) -> [f32; 2] {
        [self.pos_x[i], self.pos_y[i]]
    }

    pub fn vel(&self, i: usize) -> [f32; 2] {
        [self.vel_x[i], self.vel_y[i]]
    }

    /// Apply accumulated forces, damp velocities and advance positions.
    /// Bodies leaving the domain bounce off its walls.
    pub fn integrate(&mut self, dt: f32, dampening: f32) {
        let damping = (1.0 - dampening * dt).max(0.0);

        for i in 0..self.len() {
            let m = self.mass[i];
            self.vel_x[i] += self.force_x[i] / m * dt;
            self.vel_y[i] += self.force_y[i] / m * dt;

            self.vel_x[i] *= damping;
            self.vel_y[i] *= damping;

            self.pos_x[i] += self.vel_x[i] * dt;
            self.pos_y[i] += self.vel_y[i] * dt;

            reflect(&mut self.pos_x[i], &mut self.vel_x[i]);
            reflect(&mut self.pos_y[i], &mut self.vel_y[i]);
        }
    }

    /// Drop every body whose `keep` flag is false, preserving order
    pub fn retain(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.len());

        retain_by(&mut self.pos_x, keep);
        retain_by(&mut self.pos_y, keep);
        retain_by(&mut self.vel_x, keep);
        retain_by(&mut self.vel_y, keep);
        retain_by(&mut self.force_x, keep);
        retain_by(&mut self.force_y, keep);
        retain_by(&mut self.mass, keep);
    }

    pub fn total_mass(&self) -> f64 {
        self.mass.iter().map(|&m| m as f64).sum()
    }

    pub fn momentum(&self) -> [f64; 2] {
        let mut p = [0.0f64; 2];
        for i in 0..self.len() {
            p[0] += self.mass[i] as f64 * self.vel_x[i] as f64;
            p[1] += self.mass[i] as f64 * self.vel_y[i] as f64;
        }
        p
    }

    /// Sum of all coordinates
    pub fn checksum(&self) -> f64 {
        self.pos_x
            .iter()
            .chain(self.pos_y.iter())
            .map(|&v| v as f64)
            .sum()
    }
}

fn retain_by(values: &mut Vec<f32>, mask: &[bool]) {
    let mut i = 0;
    values.retain(|_| {
        // Missing flags keep the body
        let keep = mask.get(i).copied().unwrap_or(true);
        i += 1;
        keep
    });
}

fn reflect(pos: &mut f32, vel: &mut f32) {
    if *pos > DOMAIN_EXTENT {
        *pos = 2.0 * DOMAIN_EXTENT - *pos;
        *vel = -*vel;
    } else if *pos < -DOMAIN_EXTENT {
        *pos = -2.0 * DOMAIN_EXTENT - *pos;
        *vel = -*vel;
    }
    *pos = pos.clamp(-DOMAIN_EXTENT, DOMAIN_EXTENT);
}
