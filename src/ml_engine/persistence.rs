//! Model artifacts on disk.
//!
//! An artifact is a JSON document holding the fitted ensemble, the
//! preprocessor it was trained behind and its evaluation metrics. The payload
//! carries an MD5 checksum so truncated or hand-edited files are rejected.
//! Saves are atomic (temp file, then rename).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::booster::BoosterParams;
use super::engine::TrainedModel;
use crate::preprocessing::FeaturePreprocessor;
use crate::types::ClassificationMetrics;

pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch in {path}: expected {expected}, computed {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Unsupported artifact version {found} (expected {ARTIFACT_VERSION})")]
    VersionMismatch { found: u32 },

    #[error("Corrupt model in artifact: {0}")]
    Corrupt(String),
}

/// Where a model's training rows came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainingSource {
    /// Generated by `Dataset::synthetic` with this seed.
    Synthetic { seed: u64 },
    Csv { path: PathBuf },
}

impl TrainingSource {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactPayload {
    pub params: BoosterParams,
    pub model: TrainedModel,
    /// Absent for engine-only saves
    pub preprocessor: Option<FeaturePreprocessor>,
    pub metrics: ClassificationMetrics,
    /// Unknown for engine-only saves and older artifacts
    #[serde(default)]
    pub source: Option<TrainingSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    /// Hex MD5 of the serialized payload
    pub checksum: String,
    pub payload: ArtifactPayload,
}

fn checksum(payload: &ArtifactPayload) -> Result<String, PersistenceError> {
    let bytes = serde_json::to_vec(payload)?;
    Ok(format!("{:x}", md5::compute(bytes)))
}

/// Serialize `payload` and write it atomically to `path`.
pub fn save(path: &Path, payload: ArtifactPayload) -> Result<ModelArtifact, PersistenceError> {
    let artifact = ModelArtifact {
        version: ARTIFACT_VERSION,
        created_at: Utc::now(),
        checksum: checksum(&payload)?,
        payload,
    };
    let json = serde_json::to_vec_pretty(&artifact)?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PersistenceError::Io(parent.to_path_buf(), e))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &json).map_err(|e| PersistenceError::Io(tmp_path.clone(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| PersistenceError::Io(path.to_path_buf(), e))?;

    info!(path = %path.display(), bytes = json.len(), checksum = %artifact.checksum, "Model artifact saved");
    Ok(artifact)
}

/// Read and verify an artifact.
pub fn load(path: &Path) -> Result<ModelArtifact, PersistenceError> {
    let data = std::fs::read(path).map_err(|e| PersistenceError::Io(path.to_path_buf(), e))?;
    let artifact: ModelArtifact = serde_json::from_slice(&data)?;

    if artifact.version != ARTIFACT_VERSION {
        return Err(PersistenceError::VersionMismatch {
            found: artifact.version,
        });
    }
    let actual = checksum(&artifact.payload)?;
    if actual != artifact.checksum {
        return Err(PersistenceError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: artifact.checksum,
            actual,
        });
    }

    let payload = &artifact.payload;
    payload
        .model
        .booster
        .validate_structure()
        .map_err(|e| PersistenceError::Corrupt(e.to_string()))?;
    if payload.model.feature_names.len() != payload.model.booster.n_features() {
        return Err(PersistenceError::Corrupt(format!(
            "{} feature names for a {}-feature model",
            payload.model.feature_names.len(),
            payload.model.booster.n_features()
        )));
    }
    if let Some(pre) = &payload.preprocessor {
        if pre.output_width() != payload.model.booster.n_features() {
            return Err(PersistenceError::Corrupt(format!(
                "preprocessor emits {} columns, model expects {}",
                pre.output_width(),
                payload.model.booster.n_features()
            )));
        }
    }

    debug!(path = %path.display(), created_at = %artifact.created_at, "Model artifact verified");
    Ok(artifact)
}
