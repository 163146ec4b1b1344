use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use soa_core::{AgentKind, AgentRef, ConfigError, Direction, WatorConfig, WatorStats};

use crate::pool::AgentPool;
use crate::torus::Torus;

/// Wa-Tor predator-prey world, tracked as a Bevy Resource
///
/// Each iteration runs a fish phase and then a shark phase. Inside a phase
/// every agent first requests a neighbouring cell, then every requested cell
/// grants exactly one requester, then granted agents move. Requests only see
/// the grid as it was at the start of the phase.
#[derive(Resource)]
pub struct WatorSim {
    pub config: WatorConfig,
    pub torus: Torus,
    /// Occupant of each cell
    pub cells: Vec<Option<AgentRef>>,
    /// Per-cell bitmask of directions (seen from the cell) that asked to move in
    requests: Vec<u8>,
    pub fish: AgentPool,
    pub sharks: AgentPool,
    pub iteration: u32,
    rng: ChaCha8Rng,
    /// Whether the viewer should stop stepping
    pub paused: bool,
}

impl WatorSim {
    /// Seeded world populated according to the configured densities
    pub fn new(config: WatorConfig) -> Result<Self, ConfigError> {
        let mut sim = Self::empty(config)?;

        for cell in 0..sim.torus.cell_count() as u32 {
            if sim.rng.gen_bool(sim.config.fish_density) {
                sim.place(cell, AgentKind::Fish);
            } else if sim.rng.gen_bool(sim.config.shark_density) {
                sim.place(cell, AgentKind::Shark);
            }
        }

        info!(
            "Wa-Tor {}x{} seeded with {} fish and {} sharks",
            sim.torus.size_x,
            sim.torus.size_y,
            sim.fish.live_count(),
            sim.sharks.live_count()
        );
        Ok(sim)
    }

    /// World with no agents
    pub fn empty(config: WatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let torus = Torus::new(config.size_x, config.size_y);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            torus,
            cells: vec![None; torus.cell_count()],
            requests: vec![0; torus.cell_count()],
            fish: AgentPool::default(),
            sharks: AgentPool::default(),
            iteration: 0,
            rng,
            paused: false,
            config,
        })
    }

    /// Rebuild a world from saved state
    pub fn from_parts(
        config: WatorConfig,
        cells: Vec<Option<AgentRef>>,
        fish: AgentPool,
        sharks: AgentPool,
        iteration: u32,
        rng: ChaCha8Rng,
    ) -> Result<Self, ConfigError> {
        let mut sim = Self::empty(config)?;
        if cells.len() != sim.torus.cell_count() {
            return Err(ConfigError::Invalid {
                field: "cells",
                reason: format!(
                    "{} cells saved for a {}x{} grid",
                    cells.len(),
                    sim.torus.size_x,
                    sim.torus.size_y
                ),
            });
        }
        for (field, pool) in [("fish", &fish), ("sharks", &sharks)] {
            if !pool.is_well_formed() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "agent pool columns or free-list are corrupt".into(),
                });
            }
        }
        sim.cells = cells;
        sim.fish = fish;
        sim.sharks = sharks;
        sim.iteration = iteration;
        sim.rng = rng;
        if !sim.is_consistent() {
            return Err(ConfigError::Invalid {
                field: "cells",
                reason: "grid and agent pools disagree".into(),
            });
        }
        Ok(sim)
    }

    /// Put a new agent on a free cell. Returns false if the cell is taken.
    pub fn place(&mut self, cell: u32, kind: AgentKind) -> bool {
        let idx = cell as usize;
        if idx >= self.cells.len() || self.cells[idx].is_some() {
            return false;
        }
        let agent = self.spawn(cell, kind);
        self.cells[idx] = Some(agent);
        true
    }

    fn spawn(&mut self, cell: u32, kind: AgentKind) -> AgentRef {
        match kind {
            AgentKind::Fish => AgentRef::fish(self.fish.allocate(cell, 0)),
            AgentKind::Shark => {
                AgentRef::shark(self.sharks.allocate(cell, self.config.energy_start))
            }
        }
    }

    pub fn rng_state(&self) -> &ChaCha8Rng {
        &self.rng
    }

    pub fn kind_at(&self, cell: u32) -> Option<AgentKind> {
        self.cells
            .get(cell as usize)
            .copied()
            .flatten()
            .map(|agent| agent.kind)
    }

    /// Current population counts
    pub fn stats(&self) -> WatorStats {
        WatorStats {
            iteration: self.iteration,
            fish: self.fish.live_count(),
            sharks: self.sharks.live_count(),
        }
    }

    /// Whether the configured iteration count has been reached
    pub fn is_finished(&self) -> bool {
        self.iteration >= self.config.num_iterations
    }

    /// Advance the world by one iteration
    pub fn step(&mut self) {
        self.fish_phase();
        self.shark_phase();

        if self.config.option_defrag {
            self.defrag();
        }

        self.iteration += 1;
        debug_assert!(self.is_consistent());

        if self.config.option_print_stats {
            let stats = self.stats();
            info!(
                "iteration {}: {} fish, {} sharks",
                stats.iteration, stats.fish, stats.sharks
            );
        }
    }

    /// Run `iterations` steps and report the final population
    pub fn run(&mut self, iterations: u32) -> WatorStats {
        for _ in 0..iterations {
            self.step();
            if self.iteration % 100 == 0 {
                debug!("Wa-Tor reached iteration {}", self.iteration);
            }
        }
        self.stats()
    }

    fn fish_phase(&mut self) {
        self.requests.fill(0);
        let slots = self.fish.live_slots();

        for &slot in &slots {
            let i = slot as usize;
            self.fish.egg_timer[i] += 1;
            let pos = self.fish.position[i];
            let dir = pick_neighbor(&self.torus, &self.cells, &mut self.rng, pos, |c| {
                c.is_none()
            });
            self.request(pos, dir);
            self.fish.target[i] = dir;
        }

        self.grant_requests();

        for &slot in &slots {
            let i = slot as usize;
            let Some(dir) = self.fish.target[i].take() else {
                continue;
            };
            let old = self.fish.position[i];
            let new = self.torus.neighbor(old, dir);
            if !self.is_granted(new, dir) {
                continue;
            }

            self.cells[old as usize] = None;
            self.cells[new as usize] = Some(AgentRef::fish(slot));
            self.fish.position[i] = new;

            if self.config.option_fish_spawn && self.fish.egg_timer[i] > self.config.spawn_threshold
            {
                let child = self.spawn(old, AgentKind::Fish);
                self.cells[old as usize] = Some(child);
                self.fish.egg_timer[i] = 0;
            }
        }
    }

    fn shark_phase(&mut self) {
        self.requests.fill(0);

        // Starvation runs to completion before any shark looks around, so
        // cells freed here stay free for the whole phase.
        for slot in self.sharks.live_slots() {
            let i = slot as usize;
            self.sharks.egg_timer[i] += 1;
            self.sharks.energy[i] = self.sharks.energy[i].saturating_sub(1);
            if self.config.option_shark_die && self.sharks.energy[i] == 0 {
                let pos = self.sharks.position[i];
                self.cells[pos as usize] = None;
                self.sharks.release(slot);
            }
        }

        let slots = self.sharks.live_slots();
        for &slot in &slots {
            let i = slot as usize;
            let pos = self.sharks.position[i];
            let prey = pick_neighbor(&self.torus, &self.cells, &mut self.rng, pos, |c| {
                matches!(c, Some(AgentRef { kind: AgentKind::Fish, .. }))
            });
            let dir = match prey {
                Some(dir) => Some(dir),
                None => pick_neighbor(&self.torus, &self.cells, &mut self.rng, pos, |c| {
                    c.is_none()
                }),
            };
            self.request(pos, dir);
            self.sharks.target[i] = dir;
        }

        self.grant_requests();

        for &slot in &slots {
            let i = slot as usize;
            let Some(dir) = self.sharks.target[i].take() else {
                continue;
            };
            let old = self.sharks.position[i];
            let new = self.torus.neighbor(old, dir);
            if !self.is_granted(new, dir) {
                continue;
            }

            if let Some(AgentRef {
                kind: AgentKind::Fish,
                slot: fish_slot,
            }) = self.cells[new as usize]
            {
                self.fish.release(fish_slot);
                let boosted = self.sharks.energy[i].saturating_add(self.config.energy_boost);
                self.sharks.energy[i] = boosted;
            }

            self.cells[old as usize] = None;
            self.cells[new as usize] = Some(AgentRef::shark(slot));
            self.sharks.position[i] = new;

            if self.config.option_shark_spawn
                && self.sharks.egg_timer[i] > self.config.spawn_threshold
            {
                let child = self.spawn(old, AgentKind::Shark);
                self.cells[old as usize] = Some(child);
                self.sharks.egg_timer[i] = 0;
            }
        }
    }

    fn request(&mut self, from: u32, dir: Option<Direction>) {
        if let Some(dir) = dir {
            let target = self.torus.neighbor(from, dir);
            self.requests[target as usize] |= dir.opposite().bit();
        }
    }

    /// Reduce every request mask to the single direction that won the cell
    fn grant_requests(&mut self) {
        for mask in self.requests.iter_mut() {
            if *mask == 0 || mask.count_ones() == 1 {
                continue;
            }
            let mut candidates = [0u8; 4];
            let mut n = 0;
            for dir in Direction::ALL {
                if *mask & dir.bit() != 0 {
                    candidates[n] = dir.bit();
                    n += 1;
                }
            }
            *mask = candidates[self.rng.gen_range(0..n)];
        }
    }

    /// Whether the agent that moved in `dir` won cell `target`
    fn is_granted(&self, target: u32, dir: Direction) -> bool {
        self.requests[target as usize] == dir.opposite().bit()
    }

    /// Compact both agent pools and rewrite the grid's references
    pub fn defrag(&mut self) {
        let fish_map = self.fish.defrag();
        let shark_map = self.sharks.defrag();

        for agent in self.cells.iter_mut().flatten() {
            let map = match agent.kind {
                AgentKind::Fish => &fish_map,
                AgentKind::Shark => &shark_map,
            };
            if let Some(new) = map.get(agent.slot as usize).copied().flatten() {
                agent.slot = new;
            }
        }
    }

    /// Every live agent sits on a cell that points back at it, and every
    /// occupied cell points at a live agent.
    pub fn is_consistent(&self) -> bool {
        let pool_ok = |pool: &AgentPool, make: fn(u32) -> AgentRef| {
            pool.live_slots().into_iter().all(|slot| {
                let pos = pool.position[slot as usize] as usize;
                self.cells.get(pos).copied().flatten() == Some(make(slot))
            })
        };
        if !pool_ok(&self.fish, AgentRef::fish) || !pool_ok(&self.sharks, AgentRef::shark) {
            return false;
        }

        let occupied = self.cells.iter().filter(|c| c.is_some()).count();
        occupied == self.fish.live_count() + self.sharks.live_count()
    }
}

/// Random direction whose neighbouring cell satisfies `accept`
fn pick_neighbor(
    torus: &Torus,
    cells: &[Option<AgentRef>],
    rng: &mut ChaCha8Rng,
    cell: u32,
    accept: impl Fn(Option<AgentRef>) -> bool,
) -> Option<Direction> {
    let mut candidates = [Direction::North; 4];
    let mut n = 0;
    for dir in Direction::ALL {
        let neighbor = torus.neighbor(cell, dir);
        if neighbor != cell && accept(cells[neighbor as usize]) {
            candidates[n] = dir;
            n += 1;
        }
    }
    match n {
        0 => None,
        1 => Some(candidates[0]),
        _ => Some(candidates[rng.gen_range(0..n)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config(size_x: u32, size_y: u32) -> WatorConfig {
        WatorConfig {
            size_x,
            size_y,
            ..WatorConfig::default()
        }
    }

    #[test]
    fn test_same_seed_same_world() {
        let mut a = WatorSim::new(small_config(32, 24)).unwrap();
        let mut b = WatorSim::new(small_config(32, 24)).unwrap();
        a.run(20);
        b.run(20);
        assert_eq!(a.cells, b.cells);
        assert_eq!(a.stats(), b.stats());
    }

    #[test]
    fn test_initial_density() {
        let sim = WatorSim::new(small_config(64, 64)).unwrap();
        let cells = 64.0 * 64.0;
        let fish = sim.fish.live_count() as f64 / cells;
        assert!((0.35..0.45).contains(&fish), "fish density {fish}");
        assert!(sim.sharks.live_count() > 0);
        assert!(sim.is_consistent());
    }

    #[test]
    fn test_fish_spawns_behind_itself() {
        let config = WatorConfig {
            spawn_threshold: 0,
            ..small_config(2, 1)
        };
        let mut sim = WatorSim::empty(config).unwrap();
        assert!(sim.place(0, AgentKind::Fish));
        sim.step();

        assert_eq!(sim.stats().fish, 2);
        assert_eq!(sim.kind_at(0), Some(AgentKind::Fish));
        assert_eq!(sim.kind_at(1), Some(AgentKind::Fish));
    }

    #[test]
    fn test_fish_count_constant_without_spawning() {
        let config = WatorConfig {
            option_fish_spawn: false,
            shark_density: 0.0,
            ..small_config(16, 16)
        };
        let mut sim = WatorSim::new(config).unwrap();
        let before = sim.stats().fish;
        sim.run(25);
        assert_eq!(sim.stats().fish, before);
        assert!(sim.is_consistent());
    }

    #[test]
    fn test_shark_eats_adjacent_fish() {
        let mut sim = WatorSim::empty(small_config(2, 1)).unwrap();
        sim.place(0, AgentKind::Shark);
        sim.place(1, AgentKind::Fish);
        sim.step();

        assert_eq!(sim.stats().fish, 0);
        assert_eq!(sim.stats().sharks, 1);
        assert_eq!(sim.kind_at(1), Some(AgentKind::Shark));
        let slot = sim.sharks.live_slots()[0] as usize;
        // energy_start 2, one spent, one fish eaten
        assert_eq!(sim.sharks.energy[slot], 2 - 1 + 4);
    }

    #[test]
    fn test_sharks_starve_without_fish() {
        let config = WatorConfig {
            fish_density: 0.0,
            shark_density: 0.3,
            ..small_config(16, 16)
        };
        let mut sim = WatorSim::new(config).unwrap();
        assert!(sim.stats().sharks > 0);
        sim.step();
        assert!(sim.stats().sharks > 0);
        sim.step();
        assert_eq!(sim.stats().sharks, 0);
        assert!(sim.cells.iter().all(|c| c.is_none()));
    }

    #[test]
    fn test_immortal_sharks_survive() {
        let config = WatorConfig {
            fish_density: 0.0,
            shark_density: 0.3,
            option_shark_die: false,
            option_shark_spawn: false,
            ..small_config(16, 16)
        };
        let mut sim = WatorSim::new(config).unwrap();
        let before = sim.stats().sharks;
        sim.run(10);
        assert_eq!(sim.stats().sharks, before);
    }

    #[test]
    fn test_defrag_keeps_world_consistent() {
        let config = WatorConfig {
            option_defrag: true,
            ..small_config(32, 32)
        };
        let mut sim = WatorSim::new(config).unwrap();
        for _ in 0..15 {
            sim.step();
            assert!(sim.is_consistent());
            assert_eq!(sim.fish.free_count(), 0);
            assert_eq!(sim.sharks.free_count(), 0);
        }
    }

    #[test]
    fn test_single_cell_world_is_static() {
        let mut sim = WatorSim::empty(small_config(1, 1)).unwrap();
        sim.place(0, AgentKind::Fish);
        sim.run(5);
        assert_eq!(sim.stats().fish, 1);
        assert_eq!(sim.stats().iteration, 5);
    }

    #[test]
    fn test_shark_spawns_behind_itself() {
        let config = WatorConfig {
            spawn_threshold: 0,
            ..small_config(2, 1)
        };
        let mut sim = WatorSim::empty(config).unwrap();
        sim.place(0, AgentKind::Shark);
        sim.step();

        assert_eq!(sim.stats().sharks, 2);
        assert_eq!(sim.kind_at(0), Some(AgentKind::Shark));
        assert_eq!(sim.kind_at(1), Some(AgentKind::Shark));
        let child = sim.cells[0].unwrap().slot as usize;
        assert_eq!(sim.sharks.energy[child], sim.config.energy_start);
        assert_eq!(sim.sharks.egg_timer[child], 0);
    }

    #[test]
    fn test_egg_timer_must_exceed_threshold() {
        let config = WatorConfig {
            spawn_threshold: 1,
            ..small_config(2, 1)
        };
        let mut sim = WatorSim::empty(config).unwrap();
        sim.place(0, AgentKind::Fish);

        // timer == threshold after the first move
        sim.step();
        assert_eq!(sim.stats().fish, 1);
        sim.step();
        assert_eq!(sim.stats().fish, 2);
    }

    #[test]
    fn test_contested_cell_grants_one_requester() {
        for seed in 0..16 {
            let config = WatorConfig {
                seed,
                option_fish_spawn: false,
                ..small_config(3, 1)
            };
            let mut sim = WatorSim::empty(config).unwrap();
            // both fish can only reach cell 1
            sim.place(0, AgentKind::Fish);
            sim.place(2, AgentKind::Fish);
            sim.step();

            assert_eq!(sim.stats().fish, 2);
            assert_eq!(sim.kind_at(1), Some(AgentKind::Fish));
            assert!(sim.kind_at(0).is_some() ^ sim.kind_at(2).is_some());
            assert!(sim.is_consistent());
        }
    }

    #[test]
    fn test_energy_boost_saturates() {
        let config = WatorConfig {
            energy_boost: u32::MAX,
            ..small_config(2, 1)
        };
        let mut sim = WatorSim::empty(config).unwrap();
        sim.place(0, AgentKind::Shark);
        sim.place(1, AgentKind::Fish);
        sim.step();

        let slot = sim.sharks.live_slots()[0] as usize;
        assert_eq!(sim.sharks.energy[slot], u32::MAX);
    }

    #[test]
    fn test_from_parts_rejects_corrupt_pools() {
        let sim = WatorSim::new(small_config(8, 8)).unwrap();
        let rebuild = |fish: AgentPool| {
            WatorSim::from_parts(
                small_config(8, 8),
                sim.cells.clone(),
                fish,
                sim.sharks.clone(),
                0,
                sim.rng_state().clone(),
            )
        };

        let mut short = sim.fish.clone();
        short.position.truncate(1);
        assert!(matches!(
            rebuild(short),
            Err(ConfigError::Invalid { field: "fish", .. })
        ));

        let mut short_target = sim.fish.clone();
        short_target.target.pop();
        assert!(rebuild(short_target).is_err());
    }

    #[test]
    fn test_from_parts_rejects_mismatched_grid() {
        let sim = WatorSim::new(small_config(8, 8)).unwrap();
        let err = WatorSim::from_parts(
            small_config(4, 4),
            sim.cells.clone(),
            sim.fish.clone(),
            sim.sharks.clone(),
            0,
            sim.rng_state().clone(),
        );
        assert!(err.is_err());

        let ok = WatorSim::from_parts(
            small_config(8, 8),
            sim.cells.clone(),
            sim.fish.clone(),
            sim.sharks.clone(),
            3,
            sim.rng_state().clone(),
        )
        .unwrap();
        assert_eq!(ok.iteration, 3);
        assert_eq!(ok.stats().fish, sim.stats().fish);
    }
}
