//! The published unit of serving state: a fitted engine and the preprocessor
//! it was trained behind, built and replaced together.

use std::path::Path;

use tracing::{info, warn};

use crate::config::{defaults, ServiceConfig};
use crate::ml_engine::{persistence, ArtifactPayload, InferenceEngine, PersistenceError, TrainingSource};
use crate::preprocessing::{prepare, Dataset, FeaturePreprocessor, PreparedData};
use crate::types::{ClassificationMetrics, FeatureImportance, PredictionError, NUM_RAW_FEATURES};

#[derive(Debug, Clone)]
pub struct ModelBundle {
    pub engine: InferenceEngine,
    pub preprocessor: FeaturePreprocessor,
    /// Held-out evaluation from the training run (zero when not evaluated)
    pub metrics: ClassificationMetrics,
    /// Gain importance over augmented columns, in column order
    pub importance: FeatureImportance,
    /// `None` for artifacts that predate provenance tracking
    pub source: Option<TrainingSource>,
}

impl ModelBundle {
    fn assemble(
        engine: InferenceEngine,
        preprocessor: FeaturePreprocessor,
        metrics: ClassificationMetrics,
        source: Option<TrainingSource>,
    ) -> Result<Self, PredictionError> {
        let importance = engine.feature_importance()?;
        Ok(Self {
            engine,
            preprocessor,
            metrics,
            importance,
            source,
        })
    }

    /// Prepare `dataset`, train on the training partition and evaluate on the
    /// held-out partition.
    pub fn train(dataset: &Dataset, config: &ServiceConfig, source: TrainingSource) -> Result<Self, PredictionError> {
        let data = &config.data;
        let prepared = prepare(dataset, data.test_size, data.random_state, data.scaling)?;
        Self::from_prepared(&prepared, config, source)
    }

    /// Train on already prepared partitions. With early stopping configured
    /// the validation rows are carved out of the training partition, so the
    /// held-out metrics stay unbiased.
    pub fn from_prepared(
        prepared: &PreparedData,
        config: &ServiceConfig,
        source: TrainingSource,
    ) -> Result<Self, PredictionError> {
        let mut engine = InferenceEngine::new(config.model.clone());
        let names = Some(prepared.feature_names.clone());
        let carved = config.model.early_stopping_rounds.and_then(|_| {
            prepared.validation_split(defaults::EARLY_STOPPING_VALIDATION_FRACTION, config.data.random_state)
        });
        match &carved {
            Some(split) => engine.train(
                &split.x_fit,
                &split.y_fit,
                names,
                Some((split.x_val.as_slice(), split.y_val.as_slice())),
            )?,
            None => engine.train(&prepared.x_train, &prepared.y_train, names, None)?,
        };

        let metrics = if prepared.x_test.is_empty() {
            ClassificationMetrics::default()
        } else {
            engine.evaluate(&prepared.x_test, &prepared.y_test)?
        };
        info!(accuracy = metrics.accuracy, f1 = metrics.f1, "Model evaluated on held-out split");

        Self::assemble(engine, prepared.preprocessor.clone(), metrics, Some(source))
    }

    /// Synthetic ten-feature model generated from `seed`.
    pub fn synthetic(config: &ServiceConfig, seed: u64) -> Result<Self, PredictionError> {
        info!(
            samples = config.data.demo_samples,
            features = NUM_RAW_FEATURES,
            seed,
            "Training demo model on synthetic data"
        );
        let dataset = Dataset::synthetic(config.data.demo_samples, NUM_RAW_FEATURES, seed);
        Self::train(&dataset, config, TrainingSource::Synthetic { seed })
    }

    /// Synthetic demo model seeded from `data.random_state`.
    pub fn bootstrap_demo(config: &ServiceConfig) -> Result<Self, PredictionError> {
        Self::synthetic(config, config.data.random_state)
    }

    /// Train a serving model from the CSV at `path`.
    pub fn from_csv(config: &ServiceConfig, path: &Path) -> Result<Self, PredictionError> {
        let dataset = Dataset::load_csv(path, &config.data.target_column)
            .map_err(|e| PredictionError::InvalidTrainingData(e.to_string()))?
            .handle_missing_values(config.data.missing_value_strategy());
        if dataset.n_features() != NUM_RAW_FEATURES {
            return Err(PredictionError::DimensionMismatch {
                expected: NUM_RAW_FEATURES,
                actual: dataset.n_features(),
            });
        }
        Self::train(&dataset, config, TrainingSource::Csv { path: path.to_path_buf() })
    }

    /// Build the replacement for `current`.
    ///
    /// The configured training CSV wins when it exists. Otherwise only a
    /// synthetic model (or no model at all) is regenerated, with a fresh seed;
    /// a model trained on real data is never swapped for synthetic noise.
    pub fn retrain(config: &ServiceConfig, current: Option<&ModelBundle>) -> Result<Self, PredictionError> {
        let csv = config.paths.training_data_path();
        if csv.exists() {
            info!(path = %csv.display(), "Retraining from configured training data");
            return Self::from_csv(config, &csv);
        }

        if let Some(bundle) = current {
            match &bundle.source {
                Some(source) if source.is_synthetic() => {}
                Some(TrainingSource::Csv { path }) => {
                    return Err(PredictionError::RetrainRejected(format!(
                        "serving model was trained on {} and {} does not exist",
                        path.display(),
                        csv.display()
                    )));
                }
                _ => {
                    return Err(PredictionError::RetrainRejected(format!(
                        "serving model has unknown provenance and {} does not exist",
                        csv.display()
                    )));
                }
            }
        }
        Self::synthetic(config, rand::random())
    }

    pub fn raw_width(&self) -> usize {
        self.preprocessor.raw_width()
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let Some(model) = self.engine.model() else {
            return Err(PersistenceError::Corrupt("bundle holds no trained model".into()));
        };
        persistence::save(
            path,
            ArtifactPayload {
                params: self.engine.params().clone(),
                model: model.clone(),
                preprocessor: Some(self.preprocessor.clone()),
                metrics: self.metrics,
                source: self.source.clone(),
            },
        )?;
        Ok(())
    }

    /// Load an artifact. Artifacts saved without a preprocessor get an
    /// unscaled one matching the model width.
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let artifact = persistence::load(path)?;
        let payload = artifact.payload;
        let preprocessor = payload.preprocessor.unwrap_or_else(|| {
            warn!(path = %path.display(), "Artifact has no preprocessor, assuming unscaled inputs");
            FeaturePreprocessor::unscaled(payload.model.booster.n_features() / 2)
        });
        let engine = InferenceEngine::from_trained(payload.params, payload.model);
        Self::assemble(engine, preprocessor, payload.metrics, payload.source)
            .map_err(|e| PersistenceError::Corrupt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.model.n_estimators = 15;
        config.data.demo_samples = 120;
        config
    }

    #[test]
    fn test_demo_bundle_is_evaluated() {
        let bundle = ModelBundle::bootstrap_demo(&small_config()).unwrap();
        assert_eq!(bundle.raw_width(), NUM_RAW_FEATURES);
        assert_eq!(bundle.importance.len(), 20);
        assert!(bundle.metrics.accuracy > 0.0);
        assert_eq!(bundle.importance.iter().next().map(|(n, _)| n.as_str()), Some("feature_0"));
    }

    fn write_csv(path: &Path, dataset: &Dataset) {
        let mut text = format!("{},target\n", dataset.feature_names.join(","));
        for (row, y) in dataset.rows.iter().zip(&dataset.targets) {
            let cells: Vec<String> = row.iter().map(f64::to_string).collect();
            text.push_str(&format!("{},{}\n", cells.join(","), y));
        }
        std::fs::write(path, text).unwrap();
    }

    #[test]
    fn test_early_stopping_never_sees_test_rows() {
        let mut config = small_config();
        config.model.early_stopping_rounds = Some(3);
        let prepared = prepare(&Dataset::synthetic(120, 4, 11), 0.25, 42, true).unwrap();
        let bundle = ModelBundle::from_prepared(&prepared, &config, TrainingSource::Synthetic { seed: 11 }).unwrap();

        let split = prepared
            .validation_split(defaults::EARLY_STOPPING_VALIDATION_FRACTION, config.data.random_state)
            .unwrap();
        for row in &split.x_val {
            assert!(!prepared.x_test.contains(row));
        }

        let mut manual = InferenceEngine::new(config.model.clone());
        manual
            .train(
                &split.x_fit,
                &split.y_fit,
                Some(prepared.feature_names.clone()),
                Some((split.x_val.as_slice(), split.y_val.as_slice())),
            )
            .unwrap();
        let a = bundle.engine.predict_proba(&prepared.x_test).unwrap();
        let b = manual.predict_proba(&prepared.x_test).unwrap();
        for (pa, pb) in a.iter().zip(&b) {
            assert_eq!(pa.class_1.to_bits(), pb.class_1.to_bits());
        }
    }

    #[test]
    fn test_retrain_keeps_csv_model_without_training_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config();
        config.paths.data_dir = dir.path().to_path_buf();
        let csv = dir.path().join("patients.csv");
        write_csv(&csv, &Dataset::synthetic(120, NUM_RAW_FEATURES, 4));

        let real = ModelBundle::from_csv(&config, &csv).unwrap();
        assert_eq!(real.source, Some(TrainingSource::Csv { path: csv.clone() }));
        assert!(matches!(
            ModelBundle::retrain(&config, Some(&real)),
            Err(PredictionError::RetrainRejected(_))
        ));

        let mut unknown = real.clone();
        unknown.source = None;
        assert!(matches!(
            ModelBundle::retrain(&config, Some(&unknown)),
            Err(PredictionError::RetrainRejected(_))
        ));
    }

    #[test]
    fn test_retrain_prefers_configured_training_data() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config();
        config.paths.data_dir = dir.path().to_path_buf();
        write_csv(&config.paths.training_data_path(), &Dataset::synthetic(120, NUM_RAW_FEATURES, 4));

        let demo = ModelBundle::bootstrap_demo(&config).unwrap();
        let rebuilt = ModelBundle::retrain(&config, Some(&demo)).unwrap();
        assert_eq!(
            rebuilt.source,
            Some(TrainingSource::Csv {
                path: config.paths.training_data_path()
            })
        );
    }

    #[test]
    fn test_retrain_reseeds_synthetic_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config();
        config.paths.data_dir = dir.path().to_path_buf();

        let demo = ModelBundle::bootstrap_demo(&config).unwrap();
        assert_eq!(demo.source, Some(TrainingSource::Synthetic { seed: 42 }));
        let rebuilt = ModelBundle::retrain(&config, Some(&demo)).unwrap();
        assert!(rebuilt.source.as_ref().is_some_and(TrainingSource::is_synthetic));
        assert!(ModelBundle::retrain(&config, None).is_ok());
    }

    #[test]
    fn test_wrong_width_csv_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("narrow.csv");
        write_csv(&csv, &Dataset::synthetic(60, 4, 4));
        assert!(matches!(
            ModelBundle::from_csv(&small_config(), &csv),
            Err(PredictionError::DimensionMismatch { actual: 4, .. })
        ));
    }

    #[test]
    fn test_save_load_preserves_predictions() {
        let bundle = ModelBundle::bootstrap_demo(&small_config()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.json");
        bundle.save(&path).unwrap();

        let loaded = ModelBundle::load(&path).unwrap();
        assert_eq!(loaded.preprocessor, bundle.preprocessor);
        assert_eq!(loaded.metrics, bundle.metrics);
        assert_eq!(loaded.source, bundle.source);

        let raw = [0.3, -1.2, 0.8, 2.0, -0.1, 0.0, 1.1, -0.7, 0.4, 0.9];
        let x = vec![bundle.preprocessor.transform(&raw).unwrap()];
        let a = bundle.engine.predict_proba(&x).unwrap();
        let b = loaded.engine.predict_proba(&x).unwrap();
        assert_eq!(a[0].class_1.to_bits(), b[0].class_1.to_bits());
    }

    #[test]
    fn test_engine_only_artifact_gets_unscaled_preprocessor() {
        let bundle = ModelBundle::bootstrap_demo(&small_config()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        bundle.engine.save(&path).unwrap();

        let loaded = ModelBundle::load(&path).unwrap();
        assert_eq!(loaded.raw_width(), NUM_RAW_FEATURES);
        assert!(loaded.preprocessor.scaling().is_none());
    }
}
