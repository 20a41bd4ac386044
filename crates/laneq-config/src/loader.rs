//! Configuration loader with layered sources.

use crate::{format_validation_errors, AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use laneq_core::LaneqError;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Environment variable prefix for overrides, e.g.
/// `LANEQ_JOBS__WORKER__CONCURRENCY=4`.
pub const ENV_PREFIX: &str = "LANEQ";

/// Loaded, validated configuration.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<AppConfig>,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `LANEQ_` prefix
    pub fn new(config_dir: impl AsRef<Path>) -> Result<Self, LaneqError> {
        let config = Self::load_config(config_dir.as_ref())?;

        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, LaneqError> {
        Self::new("./config")
    }

    /// Returns the loaded configuration.
    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    fn load_config(config_dir: &Path) -> Result<AppConfig, LaneqError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("LANEQ_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        info!("Loading configuration for environment: {}", environment);

        Self::load_from(config_dir, &environment)
    }

    /// Loads and validates configuration for `environment` from `config_dir`.
    pub fn load_from(config_dir: &Path, environment: &str) -> Result<AppConfig, LaneqError> {
        let mut builder = Config::builder();

        for name in ["default", environment, "local"] {
            let path = config_dir.join(format!("{}.toml", name));
            if path.exists() {
                debug!("Loading config from: {}", path.display());
                builder = builder.add_source(File::from(path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(config_error_to_laneq_error)?;

        ConfigValidator::validate(&app_config)
            .map_err(|errors| LaneqError::Configuration(format_validation_errors(&errors)))?;

        Ok(app_config)
    }
}

fn config_error_to_laneq_error(err: ConfigError) -> LaneqError {
    LaneqError::Configuration(err.to_string())
}
