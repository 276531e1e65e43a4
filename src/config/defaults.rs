//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Configuration discovery
// ============================================================================

/// Environment variable pointing at a TOML config file.
pub const CONFIG_ENV_VAR: &str = "ONCO_CONFIG";

/// Config file looked up in the current working directory.
pub const LOCAL_CONFIG_FILE: &str = "service_config.toml";

// ============================================================================
// HTTP server
// ============================================================================

pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";

/// Request body cap (16 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Entries in the `top_10` importance view.
pub const TOP_IMPORTANCE_COUNT: usize = 10;

// ============================================================================
// Data
// ============================================================================

pub const DEFAULT_TEST_SIZE: f64 = 0.2;

pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Share of the training partition held back for early stopping.
pub const EARLY_STOPPING_VALIDATION_FRACTION: f64 = 0.2;

/// Target column read from the retraining CSV.
pub const DEFAULT_TARGET_COLUMN: &str = "target";

/// Synthetic rows generated when the service bootstraps a demo model.
pub const DEMO_BOOTSTRAP_SAMPLES: usize = 300;

/// Synthetic rows and columns for the `demo` CLI pipeline.
pub const DEMO_PIPELINE_SAMPLES: usize = 500;
pub const DEMO_PIPELINE_FEATURES: usize = 15;

/// Validation patience used by the `demo` CLI pipeline.
pub const DEMO_EARLY_STOPPING_ROUNDS: usize = 10;

/// Ensemble shape for the `demo` CLI pipeline.
pub const DEMO_PIPELINE_MAX_DEPTH: usize = 6;
pub const DEMO_PIPELINE_ESTIMATORS: usize = 150;

// ============================================================================
// Paths
// ============================================================================

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_MODEL_DIR: &str = "models";
pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_MODEL_FILE: &str = "gbt_model.json";

/// Retraining data, relative to the data directory.
pub const DEFAULT_TRAINING_DATA_FILE: &str = "training_data.csv";
