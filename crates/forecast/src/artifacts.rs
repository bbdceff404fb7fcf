//! Durable storage for the trained artifact triple.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::ForecastResult;
use crate::features::FeatureSchema;
use crate::forest::{RandomForestClassifier, RandomForestRegressor};
use crate::trainer::{TrainerConfig, TrainingReport, train};

/// Serialized classifier file name.
pub const CLASSIFIER_FILE: &str = "demand_classifier.json";
/// Serialized regressor file name.
pub const REGRESSOR_FILE: &str = "demand_regressor.json";
/// Serialized ordered column-name list.
pub const COLUMNS_FILE: &str = "model_columns.json";

/// Immutable (classifier, regressor, column-schema) triple.
///
/// Created by training, consumed read-only by prediction. Retraining builds
/// a replacement triple; an existing one is never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifacts {
    pub classifier: RandomForestClassifier,
    pub regressor: RandomForestRegressor,
    pub schema: FeatureSchema,
}

/// File-backed artifact store: three independent files under one directory.
///
/// Each file is replaced via temp-file-plus-rename, so a concurrent reader
/// observes either the previous artifact or the new one, never a torn write.
/// There is no version field; compatibility is exact column-list equality at
/// reindex time.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Whether a complete triple is present on disk.
    pub fn exists(&self) -> bool {
        [CLASSIFIER_FILE, REGRESSOR_FILE, COLUMNS_FILE]
            .iter()
            .all(|file| self.path(file).exists())
    }

    /// Load the persisted triple; `Ok(None)` when any file is missing.
    pub fn load(&self) -> ForecastResult<Option<ModelArtifacts>> {
        if !self.exists() {
            return Ok(None);
        }
        let classifier: RandomForestClassifier = self.read_json(CLASSIFIER_FILE)?;
        let regressor: RandomForestRegressor = self.read_json(REGRESSOR_FILE)?;
        let schema: FeatureSchema = self.read_json(COLUMNS_FILE)?;
        Ok(Some(ModelArtifacts {
            classifier,
            regressor,
            schema,
        }))
    }

    /// Persist the triple, overwriting any previous one.
    pub fn save(&self, artifacts: &ModelArtifacts) -> ForecastResult<()> {
        fs::create_dir_all(&self.dir)?;
        self.write_json(CLASSIFIER_FILE, &artifacts.classifier)?;
        self.write_json(REGRESSOR_FILE, &artifacts.regressor)?;
        self.write_json(COLUMNS_FILE, &artifacts.schema)?;
        Ok(())
    }

    /// One-time startup initialization: load the persisted triple, or train
    /// and persist a fresh one.
    ///
    /// Callers run this once before constructing a predictor; the predict
    /// path itself never trains.
    pub fn initialize(&self, config: &TrainerConfig) -> ForecastResult<ModelArtifacts> {
        if let Some(artifacts) = self.load()? {
            info!(dir = %self.dir.display(), "loaded persisted demand models");
            return Ok(artifacts);
        }
        info!(dir = %self.dir.display(), "no persisted demand models; training");
        self.retrain(config).map(|(artifacts, _)| artifacts)
    }

    /// Train a replacement triple and persist it.
    pub fn retrain(&self, config: &TrainerConfig) -> ForecastResult<(ModelArtifacts, TrainingReport)> {
        let (artifacts, report) = train(config)?;
        self.save(&artifacts)?;
        Ok((artifacts, report))
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> ForecastResult<T> {
        let raw = fs::read_to_string(self.path(file))?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> ForecastResult<()> {
        let tmp = self.path(&format!("{file}.tmp"));
        fs::write(&tmp, serde_json::to_vec(value)?)?;
        fs::rename(&tmp, self.path(file))?;
        Ok(())
    }
}
