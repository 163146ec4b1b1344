pub mod config;
pub mod constants;
pub mod types;

pub use config::{CollisionConfig, ConfigError, WatorConfig};
pub use types::*;
