use crate::constants::{collision, wator};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })
}

/// N-body collision configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Open a viewer window instead of running headless
    pub option_render: bool,
    /// Distance below which two bodies merge
    pub merge_threshold: f32,
    /// Number of bodies at t = 0
    pub num_bodies: u32,
    /// Upper bound on initial body mass
    pub max_mass: f32,
    /// Random seed for deterministic simulation
    pub seed: u64,
    /// Time step per iteration
    pub time_interval: f32,
    /// Number of iterations for a full run
    pub iterations: u32,
    /// Velocity damping coefficient
    pub dampening_factor: f32,
    /// Gravitational constant
    pub gravity_constant: f32,
    /// Softening length for the gravity denominator
    pub softening: f32,
    /// Bound on each initial velocity component
    pub max_initial_speed: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            option_render: collision::OPTION_RENDER,
            merge_threshold: collision::MERGE_THRESHOLD,
            num_bodies: collision::NUM_BODIES,
            max_mass: collision::MAX_MASS,
            seed: collision::SEED,
            time_interval: collision::TIME_INTERVAL,
            iterations: collision::ITERATIONS,
            dampening_factor: collision::DAMPENING_FACTOR,
            gravity_constant: collision::GRAVITY_CONSTANT,
            softening: collision::SOFTENING,
            max_initial_speed: collision::MAX_INITIAL_SPEED,
        }
    }
}

impl CollisionConfig {
    /// Load a JSON override; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot sample or integrate with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_bodies == 0 {
            return Err(invalid("num_bodies", "must be at least 1"));
        }
        positive_finite("max_mass", self.max_mass)?;
        positive_finite("time_interval", self.time_interval)?;
        positive_finite("merge_threshold", self.merge_threshold)?;
        if !(0.0..1.0).contains(&self.dampening_factor) {
            return Err(invalid(
                "dampening_factor",
                format!("{} is outside [0, 1)", self.dampening_factor),
            ));
        }
        non_negative_finite("gravity_constant", self.gravity_constant)?;
        non_negative_finite("softening", self.softening)?;
        // velocities are sampled from -speed..speed, so the span must be finite too
        non_negative_finite("max_initial_speed", self.max_initial_speed)?;
        if !(2.0 * self.max_initial_speed).is_finite() {
            return Err(invalid(
                "max_initial_speed",
                format!("{} is too large", self.max_initial_speed),
            ));
        }
        Ok(())
    }
}

fn positive_finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is not a positive finite number")))
    }
}

fn non_negative_finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is negative or not finite")))
    }
}

/// Wa-Tor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatorConfig {
    pub seed: u64,
    /// Grid width in cells
    pub size_x: u32,
    /// Grid height in cells
    pub size_y: u32,
    /// Egg timer value an agent must exceed to reproduce
    pub spawn_threshold: u32,
    /// Energy gained per fish eaten
    pub energy_boost: u32,
    /// Energy of a new shark
    pub energy_start: u32,
    pub option_shark_die: bool,
    pub option_fish_spawn: bool,
    pub option_shark_spawn: bool,
    /// Compact agent pools after each iteration
    pub option_defrag: bool,
    /// Log population counts after each iteration
    pub option_print_stats: bool,
    pub num_iterations: u32,
    /// Initial fish probability per cell
    pub fish_density: f64,
    /// Initial shark probability per non-fish cell
    pub shark_density: f64,
}

impl Default for WatorConfig {
    fn default() -> Self {
        Self {
            seed: wator::SEED,
            size_x: wator::SIZE_X,
            size_y: wator::SIZE_Y,
            spawn_threshold: wator::SPAWN_THRESHOLD,
            energy_boost: wator::ENERGY_BOOST,
            energy_start: wator::ENERGY_START,
            option_shark_die: wator::OPTION_SHARK_DIE,
            option_fish_spawn: wator::OPTION_FISH_SPAWN,
            option_shark_spawn: wator::OPTION_SHARK_SPAWN,
            option_defrag: wator::OPTION_DEFRAG,
            option_print_stats: wator::OPTION_PRINT_STATS,
            num_iterations: wator::NUM_ITERATIONS,
            fish_density: wator::FISH_DENSITY,
            shark_density: wator::SHARK_DENSITY,
        }
    }
}

impl WatorConfig {
    /// Load a JSON override; missing fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject grids and rates the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_x == 0 || self.size_y == 0 {
            return Err(invalid(
                "size_x/size_y",
                format!("grid {}x{} is empty", self.size_x, self.size_y),
            ));
        }
        if (self.size_x as u64) * (self.size_y as u64) > u32::MAX as u64 {
            return Err(invalid("size_x/size_y", "grid has more than u32::MAX cells"));
        }
        if !(0.0..=1.0).contains(&self.fish_density) {
            return Err(invalid(
                "fish_density",
                format!("{} is outside [0, 1]", self.fish_density),
            ));
        }
        if !(0.0..=1.0).contains(&self.shark_density) {
            return Err(invalid(
                "shark_density",
                format!("{} is outside [0, 1]", self.shark_density),
            ));
        }
        if self.option_shark_die && self.energy_start == 0 {
            return Err(invalid("energy_start", "sharks would starve on creation"));
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        self.size_x as usize * self.size_y as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let c = CollisionConfig::default();
        assert_eq!(c.num_bodies, collision::NUM_BODIES);
        assert_eq!(c.seed, 42);
        assert!(c.validate().is_ok());

        let w = WatorConfig::default();
        assert_eq!((w.size_x, w.size_y), (2048, 1792));
        assert_eq!(w.cell_count(), 2048 * 1792);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let c: CollisionConfig = serde_json::from_str(r#"{ "num_bodies": 10 }"#).unwrap();
        assert_eq!(c.num_bodies, 10);
        assert_eq!(c.iterations, collision::ITERATIONS);

        let w: WatorConfig =
            serde_json::from_str(r#"{ "size_x": 8, "option_defrag": true }"#).unwrap();
        assert_eq!(w.size_x, 8);
        assert_eq!(w.size_y, wator::SIZE_Y);
        assert!(w.option_defrag);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let c = CollisionConfig {
            dampening_factor: 1.5,
            ..CollisionConfig::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::Invalid { field: "dampening_factor", .. })
        ));

        let c = CollisionConfig {
            time_interval: f32::NAN,
            ..CollisionConfig::default()
        };
        assert!(c.validate().is_err());

        let w = WatorConfig {
            size_y: 0,
            ..WatorConfig::default()
        };
        assert!(w.validate().is_err());

        let w = WatorConfig {
            fish_density: 1.2,
            ..WatorConfig::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unsampleable_floats() {
        let cases: [(&str, fn(&mut CollisionConfig)); 8] = [
            ("max_mass", |c| c.max_mass = f32::INFINITY),
            ("max_mass", |c| c.max_mass = f32::NAN),
            ("max_initial_speed", |c| c.max_initial_speed = 3e38),
            ("max_initial_speed", |c| c.max_initial_speed = f32::INFINITY),
            ("time_interval", |c| c.time_interval = f32::INFINITY),
            ("merge_threshold", |c| c.merge_threshold = f32::INFINITY),
            ("gravity_constant", |c| c.gravity_constant = f32::INFINITY),
            ("softening", |c| c.softening = f32::NAN),
        ];
        for (field, edit) in cases {
            let mut c = CollisionConfig::default();
            edit(&mut c);
            match c.validate() {
                Err(ConfigError::Invalid { field: got, .. }) => assert_eq!(got, field),
                other => panic!("{field}: expected rejection, got {other:?}"),
            }
        }

        let c: CollisionConfig =
            serde_json::from_str(r#"{ "num_bodies": 4, "max_initial_speed": 3e38 }"#).unwrap();
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("soa_core_cfg_{}.json", std::process::id()));
        fs::write(&path, r#"{ "size_x": 16, "size_y": 12, "seed": 7 }"#).unwrap();
        let w = WatorConfig::from_json_file(&path).unwrap();
        assert_eq!((w.size_x, w.size_y, w.seed), (16, 12, 7));
        fs::remove_file(&path).unwrap();

        let missing = WatorConfig::from_json_file(Path::new("/nonexistent/wator.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
