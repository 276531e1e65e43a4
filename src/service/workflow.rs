//! Offline training workflows behind the `demo` and `train` commands.
//!
//! Both produce a [`TrainingReport`]; the binary decides how to print it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use super::ModelBundle;
use crate::config::{defaults, ServiceConfig};
use crate::ml_engine::TrainingSource;
use crate::preprocessing::{prepare, Dataset};
use crate::types::{ClassProbabilities, ClassificationMetrics, FeatureImportance, NUM_RAW_FEATURES};

/// Sample predictions printed by the demo.
const SAMPLE_PREDICTIONS: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct SampleOutcome {
    pub actual: u8,
    pub predicted: u8,
    pub probabilities: ClassProbabilities,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub features: usize,
    pub n_trees: usize,
    pub best_iteration: Option<usize>,
    pub metrics: ClassificationMetrics,
    pub top_features: FeatureImportance,
    pub samples_scored: Vec<SampleOutcome>,
    pub model_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<PathBuf>,
}

/// Synthetic end-to-end run: generate, impute, split, train a 150-tree,
/// depth-6 ensemble with early stopping, evaluate, score a few held-out rows
/// and save everything under `results_dir`.
pub fn run_demo(config: &ServiceConfig) -> Result<TrainingReport> {
    let mut config = config.clone();
    config.model.max_depth = defaults::DEMO_PIPELINE_MAX_DEPTH;
    config.model.n_estimators = defaults::DEMO_PIPELINE_ESTIMATORS;
    if config.model.early_stopping_rounds.is_none() {
        config.model.early_stopping_rounds = Some(defaults::DEMO_EARLY_STOPPING_ROUNDS);
    }

    let dataset = Dataset::synthetic(
        defaults::DEMO_PIPELINE_SAMPLES,
        defaults::DEMO_PIPELINE_FEATURES,
        config.data.random_state,
    )
    .handle_missing_values(config.data.missing_value_strategy());

    let data = &config.data;
    let prepared = prepare(&dataset, data.test_size, data.random_state, data.scaling)?;
    let source = TrainingSource::Synthetic {
        seed: config.data.random_state,
    };
    let bundle = ModelBundle::from_prepared(&prepared, &config, source)?;

    let positive = bundle
        .engine
        .predict_proba(&prepared.x_test[..prepared.x_test.len().min(SAMPLE_PREDICTIONS)])?;
    let samples_scored = positive
        .into_iter()
        .zip(&prepared.y_test)
        .map(|(probabilities, &actual)| SampleOutcome {
            actual,
            predicted: u8::from(probabilities.class_1 > 0.5),
            probabilities,
        })
        .collect();

    let results_dir = &config.paths.results_dir;
    let model_path = results_dir.join(format!("demo_{}", config.paths.model_file));
    bundle.save(&model_path)?;

    let metrics_path = results_dir.join("demo_metrics.json");
    write_json(&metrics_path, &bundle.metrics)?;

    Ok(report(&dataset, &bundle, samples_scored, model_path, Some(metrics_path)))
}

/// Train on a CSV file and save the bundle. Ten-feature models go to the
/// serving path; any other width lands in `results_dir` so it cannot
/// shadow the served model.
pub fn run_csv(config: &ServiceConfig, csv: &Path, target: &str) -> Result<TrainingReport> {
    let dataset = Dataset::load_csv(csv, target)?.handle_missing_values(config.data.missing_value_strategy());
    info!(rows = dataset.len(), features = dataset.n_features(), "Dataset loaded");

    let source = TrainingSource::Csv { path: csv.to_path_buf() };
    let bundle = ModelBundle::train(&dataset, config, source)?;

    let model_path = if dataset.n_features() == NUM_RAW_FEATURES {
        config.paths.model_path()
    } else {
        warn!(
            features = dataset.n_features(),
            "Model width differs from the serving schema, saving under results"
        );
        config.paths.results_dir.join(&config.paths.model_file)
    };
    bundle.save(&model_path)?;

    Ok(report(&dataset, &bundle, Vec::new(), model_path, None))
}

fn report(
    dataset: &Dataset,
    bundle: &ModelBundle,
    samples_scored: Vec<SampleOutcome>,
    model_path: PathBuf,
    metrics_path: Option<PathBuf>,
) -> TrainingReport {
    let booster = bundle.engine.model().map(|m| &m.booster);
    TrainingReport {
        samples: dataset.len(),
        features: dataset.n_features(),
        n_trees: booster.map_or(0, |b| b.n_trees()),
        best_iteration: booster.and_then(|b| b.best_iteration()),
        metrics: bundle.metrics,
        top_features: bundle.importance.top(defaults::TOP_IMPORTANCE_COUNT),
        samples_scored,
        model_path,
        metrics_path,
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
