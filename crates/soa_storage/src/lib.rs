use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use soa_core::{AgentRef, CollisionConfig, ConfigError, WatorConfig};
use soa_physics::Bodies;
use soa_sim::{AgentPool, CollisionSim, WatorSim};
use std::fs;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot encoding failed: {0}")]
    Encode(#[source] bincode::Error),
    #[error("snapshot {path} is not readable: {source}")]
    Decode {
        path: String,
        #[source]
        source: bincode::Error,
    },
    #[error("snapshot does not describe a valid run: {0}")]
    Invalid(#[from] ConfigError),
}

/// Complete collision state for save/resume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionSnapshot {
    pub run_id: Uuid,
    pub config: CollisionConfig,
    pub iteration: u32,
    pub merged: usize,
    pub bodies: Bodies,
}

impl CollisionSnapshot {
    pub fn capture(sim: &CollisionSim, run_id: Uuid) -> Self {
        Self {
            run_id,
            config: sim.config.clone(),
            iteration: sim.iteration,
            merged: sim.merged,
            bodies: sim.bodies.clone(),
        }
    }

    pub fn restore(self) -> Result<CollisionSim, StorageError> {
        self.config.validate()?;
        let n = self.bodies.len();
        let b = &self.bodies;
        let aligned = [
            b.pos_x.len(),
            b.pos_y.len(),
            b.vel_x.len(),
            b.vel_y.len(),
            b.force_x.len(),
            b.force_y.len(),
        ]
        .iter()
        .all(|&len| len == n);
        if !aligned {
            return Err(StorageError::Invalid(ConfigError::Invalid {
                field: "bodies",
                reason: "body columns have different lengths".into(),
            }));
        }
        Ok(CollisionSim::from_parts(
            self.config,
            self.bodies,
            self.iteration,
            self.merged,
        ))
    }
}

/// Complete Wa-Tor state, RNG included, so a resumed run continues exactly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatorSnapshot {
    pub run_id: Uuid,
    pub config: WatorConfig,
    pub iteration: u32,
    pub cells: Vec<Option<AgentRef>>,
    pub fish: AgentPool,
    pub sharks: AgentPool,
    pub rng: ChaCha8Rng,
}

impl WatorSnapshot {
    pub fn capture(sim: &WatorSim, run_id: Uuid) -> Self {
        Self {
            run_id,
            config: sim.config.clone(),
            iteration: sim.iteration,
            cells: sim.cells.clone(),
            fish: sim.fish.clone(),
            sharks: sim.sharks.clone(),
            rng: sim.rng_state().clone(),
        }
    }

    pub fn restore(self) -> Result<WatorSim, StorageError> {
        let sim = WatorSim::from_parts(
            self.config,
            self.cells,
            self.fish,
            self.sharks,
            self.iteration,
            self.rng,
        )?;
        Ok(sim)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Snapshot {
    Collision(CollisionSnapshot),
    Wator(WatorSnapshot),
}

impl Snapshot {
    pub fn run_id(&self) -> Uuid {
        match self {
            Self::Collision(s) => s.run_id,
            Self::Wator(s) => s.run_id,
        }
    }

    pub fn iteration(&self) -> u32 {
        match self {
            Self::Collision(s) => s.iteration,
            Self::Wator(s) => s.iteration,
        }
    }
}

/// Save a snapshot to disk as bincode
pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    let data = bincode::serialize(snapshot).map_err(StorageError::Encode)?;
    fs::write(path, data).map_err(io_err)?;
    Ok(())
}

/// Load a snapshot from disk
pub fn load_snapshot(path: &Path) -> Result<Snapshot, StorageError> {
    let data = fs::read(path).map_err(|source| StorageError::Io {
        path: path.display().to_string(),
        source,
    })?;
    bincode::deserialize(&data).map_err(|source| StorageError::Decode {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("soa_storage_{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_wator_resume_matches_uninterrupted_run() {
        let config = WatorConfig {
            size_x: 24,
            size_y: 20,
            ..WatorConfig::default()
        };
        let mut straight = WatorSim::new(config.clone()).unwrap();
        let mut interrupted = WatorSim::new(config).unwrap();
        straight.run(12);
        interrupted.run(5);

        let path = temp_path("wator.bin");
        let run_id = Uuid::new_v4();
        save_snapshot(
            &Snapshot::Wator(WatorSnapshot::capture(&interrupted, run_id)),
            &path,
        )
        .unwrap();

        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.run_id(), run_id);
        assert_eq!(loaded.iteration(), 5);
        let Snapshot::Wator(snapshot) = loaded else {
            panic!("expected a Wa-Tor snapshot");
        };
        let mut resumed = snapshot.restore().unwrap();
        resumed.run(7);

        assert_eq!(resumed.stats(), straight.stats());
        assert_eq!(resumed.cells, straight.cells);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_collision_snapshot_restores_bodies() {
        let config = CollisionConfig {
            num_bodies: 50,
            ..CollisionConfig::default()
        };
        let mut sim = CollisionSim::new(config).unwrap();
        sim.run(3);

        let path = temp_path("collision.bin");
        save_snapshot(
            &Snapshot::Collision(CollisionSnapshot::capture(&sim, Uuid::new_v4())),
            &path,
        )
        .unwrap();

        let Snapshot::Collision(snapshot) = load_snapshot(&path).unwrap() else {
            panic!("expected a collision snapshot");
        };
        let restored = snapshot.restore().unwrap();
        assert_eq!(restored.bodies, sim.bodies);
        assert_eq!(restored.iteration, 3);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_restore_rejects_misaligned_columns() {
        let sim = CollisionSim::new(CollisionConfig {
            num_bodies: 4,
            ..CollisionConfig::default()
        })
        .unwrap();
        let mut snapshot = CollisionSnapshot::capture(&sim, Uuid::new_v4());
        snapshot.bodies.vel_y.pop();
        assert!(matches!(snapshot.restore(), Err(StorageError::Invalid(_))));
    }

    #[test]
    fn test_wator_restore_rejects_misaligned_pools() {
        let sim = WatorSim::new(WatorConfig {
            size_x: 8,
            size_y: 8,
            ..WatorConfig::default()
        })
        .unwrap();
        let mut snapshot = WatorSnapshot::capture(&sim, Uuid::new_v4());
        snapshot.fish.position.truncate(1);
        assert!(matches!(snapshot.restore(), Err(StorageError::Invalid(_))));
    }

    #[test]
    fn test_load_garbage_fails() {
        let path = temp_path("garbage.bin");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"\xff\xff\xff\xff").unwrap();
        assert!(matches!(
            load_snapshot(&path),
            Err(StorageError::Decode { .. })
        ));
        fs::remove_file(&path).unwrap();

        assert!(matches!(
            load_snapshot(&temp_path("missing.bin")),
            Err(StorageError::Io { .. })
        ));
    }
}
