//! Configuration for processes hosting the predictor

use crate::errors::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_MODEL_PATH: &str = "models/box_forest.json";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Predictor host configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PredictorConfig {
    /// Path to the forest model artifact
    pub model_path: PathBuf,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl PredictorConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let config: PredictorConfig = toml::from_str(&content)
            .map_err(|e| PredictorError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Override fields from `BOX_PREDICTOR_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("BOX_PREDICTOR_MODEL_PATH") {
            self.model_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("BOX_PREDICTOR_LOG_LEVEL") {
            self.log_level = val.to_lowercase();
        }

        if let Ok(val) = std::env::var("BOX_PREDICTOR_LOG_JSON") {
            match val.parse() {
                Ok(flag) => self.log_json = flag,
                Err(_) => warn!("Ignoring BOX_PREDICTOR_LOG_JSON={}: expected true or false", val),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_path.as_os_str().is_empty() {
            return Err(PredictorError::Config("model_path must not be empty".into()));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(PredictorError::Config(format!(
                "unknown log level '{}', expected one of {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| PredictorError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
