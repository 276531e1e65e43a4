use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::defaults;
use crate::ml_engine::BoosterParams;
use crate::preprocessing::MissingValueStrategy;

/// Top-level service configuration, one TOML table per section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Boosting hyperparameters
    #[serde(default)]
    pub model: BoosterParams,

    /// Dataset preparation
    #[serde(default)]
    pub data: DataConfig,

    /// Filesystem layout
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: defaults::DEFAULT_ADDR.to_string(),
            max_body_bytes: defaults::DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Held-out fraction in (0, 1)
    pub test_size: f64,
    pub random_state: u64,
    /// Standardize augmented columns
    pub scaling: bool,
    /// Rows generated for the bootstrap demo model
    pub demo_samples: usize,
    /// `mean`, `median` or `drop`
    pub missing_values: String,
    /// Binary label column in the retraining CSV
    pub target_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            test_size: defaults::DEFAULT_TEST_SIZE,
            random_state: defaults::DEFAULT_RANDOM_STATE,
            scaling: true,
            demo_samples: defaults::DEMO_BOOTSTRAP_SAMPLES,
            missing_values: "mean".to_string(),
            target_column: defaults::DEFAULT_TARGET_COLUMN.to_string(),
        }
    }
}

impl DataConfig {
    /// Parsed missing-value strategy; `validate` guarantees this succeeds.
    pub fn missing_value_strategy(&self) -> MissingValueStrategy {
        self.missing_values.parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    pub results_dir: PathBuf,
    pub model_file: String,
    /// CSV used by `/api/retrain`, relative to `data_dir`
    pub training_data: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DEFAULT_DATA_DIR),
            model_dir: PathBuf::from(defaults::DEFAULT_MODEL_DIR),
            results_dir: PathBuf::from(defaults::DEFAULT_RESULTS_DIR),
            model_file: defaults::DEFAULT_MODEL_FILE.to_string(),
            training_data: defaults::DEFAULT_TRAINING_DATA_FILE.to_string(),
        }
    }
}

impl PathsConfig {
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn training_data_path(&self) -> PathBuf {
        self.data_dir.join(&self.training_data)
    }
}

impl ServiceConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ONCO_CONFIG` environment variable
    /// 2. `./service_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded service config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded service config from ./{}", defaults::LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", defaults::LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load and validate a specific TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Reject inconsistent values, collecting every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if let Err(e) = self.model.validate() {
            errors.push(format!("model: {e}"));
        }
        if self.model.max_depth == 0 {
            errors.push("model.max_depth must be at least 1".to_string());
        }
        if self.model.early_stopping_rounds == Some(0) {
            errors.push("model.early_stopping_rounds must be at least 1 when set".to_string());
        }

        let test_size = self.data.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            errors.push(format!("data.test_size must be in (0, 1), got {test_size}"));
        }
        if self.data.demo_samples < 10 {
            errors.push(format!(
                "data.demo_samples must be at least 10, got {}",
                self.data.demo_samples
            ));
        }
        if let Err(e) = self.data.missing_values.parse::<MissingValueStrategy>() {
            errors.push(format!("data.missing_values: {e}"));
        }

        if self.server.addr.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!("server.addr '{}' is not a socket address", self.server.addr));
        }
        if self.server.max_body_bytes == 0 {
            errors.push("server.max_body_bytes must be positive".to_string());
        }
        if self.paths.model_file.trim().is_empty() {
            errors.push("paths.model_file must not be empty".to_string());
        }
        if self.paths.training_data.trim().is_empty() {
            errors.push("paths.training_data must not be empty".to_string());
        }
        if self.data.target_column.trim().is_empty() {
            errors.push("data.target_column must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.addr, "0.0.0.0:5000");
        assert_eq!(config.model.max_depth, 5);
        assert_eq!(config.model.n_estimators, 100);
        assert_eq!(config.data.test_size, 0.2);
        assert_eq!(config.paths.model_path(), PathBuf::from("models/gbt_model.json"));
        assert_eq!(config.paths.training_data_path(), PathBuf::from("data/training_data.csv"));
        assert_eq!(config.data.target_column, "target");
    }

    #[test]
    fn test_partial_file_keeps_section_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model]\nn_estimators = 25\n\n[data]\nscaling = false").unwrap();

        let config = ServiceConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.model.n_estimators, 25);
        assert_eq!(config.model.learning_rate, 0.1);
        assert!(!config.data.scaling);
        assert_eq!(config.data.random_state, 42);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = ServiceConfig::default();
        config.model.learning_rate = 0.0;
        config.data.test_size = 1.5;
        config.data.missing_values = "interpolate".into();
        config.server.addr = "nowhere".into();
        config.data.target_column = " ".into();

        match config.validate() {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 5, "{errors:?}"),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[model\nbroken").unwrap();
        assert!(matches!(
            ServiceConfig::load_from_file(file.path()),
            Err(ConfigError::Parse(..))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ServiceConfig::default();
        let text = config.to_toml().unwrap();
        let back: ServiceConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
