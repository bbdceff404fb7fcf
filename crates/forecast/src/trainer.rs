//! Training: synthetic corpus in, fitted artifact triple out.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifacts::ModelArtifacts;
use crate::error::{ForecastError, ForecastResult};
use crate::features::{FeatureSchema, feature_row};
use crate::forest::{FeatureSubsample, ForestParams, RandomForestClassifier, RandomForestRegressor};
use crate::observation::DemandClass;
use crate::synthetic::{DEFAULT_NUM_SAMPLES, generate};

/// Tunables for one training run. Defaults mirror production use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub num_samples: usize,
    pub num_trees: usize,
    pub max_depth: usize,
    /// Holdout fraction, stratified on demand class.
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_samples: DEFAULT_NUM_SAMPLES,
            num_trees: 100,
            max_depth: 12,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Per-sample weight compensating for class rarity in the synthetic rules.
pub fn class_weight(class: DemandClass) -> f64 {
    match class {
        DemandClass::Decrease => 3.0,
        DemandClass::Neutral => 1.0,
        DemandClass::Increase => 1.2,
    }
}

/// Holdout metrics for a completed training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingReport {
    pub samples_train: usize,
    pub samples_test: usize,
    pub classifier_accuracy: f64,
    pub regressor_r2: f64,
    pub trained_at: DateTime<Utc>,
}

/// Fit the classifier/regressor pair on a fresh synthetic corpus.
///
/// Deterministic for a given config: the corpus, the split and every tree
/// derive from `config.seed`.
pub fn train(config: &TrainerConfig) -> ForecastResult<(ModelArtifacts, TrainingReport)> {
    if config.num_samples < 10 {
        return Err(ForecastError::training(
            "num_samples must be at least 10 to fit and evaluate",
        ));
    }
    if !(config.test_fraction > 0.0 && config.test_fraction < 1.0) {
        return Err(ForecastError::training(
            "test_fraction must lie strictly between 0 and 1",
        ));
    }
    if config.num_trees == 0 {
        return Err(ForecastError::training("num_trees must be positive"));
    }

    let corpus = generate(config.num_samples, config.seed);
    let schema = FeatureSchema::canonical();

    let rows: Vec<Vec<f64>> = corpus
        .iter()
        .map(|labeled| feature_row(&labeled.observation, &schema))
        .collect();
    let class_targets: Vec<usize> = corpus
        .iter()
        .map(|labeled| labeled.demand_class.index())
        .collect();
    let quantity_targets: Vec<f64> = corpus
        .iter()
        .map(|labeled| labeled.quantity_delta as f64)
        .collect();

    let (train_at, test_at) = stratified_split(&class_targets, config.test_fraction, config.seed);

    let train_rows = select(&rows, &train_at);
    let train_classes = select(&class_targets, &train_at);
    let train_quantities = select(&quantity_targets, &train_at);
    let weights: Vec<f64> = train_classes
        .iter()
        .map(|&index| class_weight(DemandClass::ALL[index]))
        .collect();

    let classifier_params = ForestParams {
        num_trees: config.num_trees,
        max_depth: config.max_depth,
        min_samples_leaf: 1,
        feature_subsample: FeatureSubsample::Sqrt,
    };
    let regressor_params = ForestParams {
        feature_subsample: FeatureSubsample::All,
        ..classifier_params.clone()
    };

    let classifier = RandomForestClassifier::fit(
        &train_rows,
        &train_classes,
        &weights,
        DemandClass::ALL.len(),
        &classifier_params,
        config.seed,
    );
    let regressor = RandomForestRegressor::fit(
        &train_rows,
        &train_quantities,
        &regressor_params,
        config.seed.wrapping_add(1),
    );

    let test_rows = select(&rows, &test_at);
    let test_classes = select(&class_targets, &test_at);
    let test_quantities = select(&quantity_targets, &test_at);

    let report = TrainingReport {
        samples_train: train_at.len(),
        samples_test: test_at.len(),
        classifier_accuracy: accuracy(&classifier, &test_rows, &test_classes),
        regressor_r2: r_squared(&regressor, &test_rows, &test_quantities),
        trained_at: Utc::now(),
    };
    info!(
        classifier_accuracy = report.classifier_accuracy,
        regressor_r2 = report.regressor_r2,
        samples_train = report.samples_train,
        samples_test = report.samples_test,
        "demand models trained"
    );

    let artifacts = ModelArtifacts {
        classifier,
        regressor,
        schema,
    };
    Ok((artifacts, report))
}

/// Per-class shuffle-and-cut. Every class keeps roughly `test_fraction` of
/// its members in the holdout, and at least one member in training.
fn stratified_split(targets: &[usize], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (at, &target) in targets.iter().enumerate() {
        by_class.entry(target).or_default().push(at);
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (_, mut members) in by_class {
        members.shuffle(&mut rng);
        let cut = ((members.len() as f64) * test_fraction).round() as usize;
        let cut = cut.min(members.len().saturating_sub(1));
        test.extend_from_slice(&members[..cut]);
        train.extend_from_slice(&members[cut..]);
    }
    (train, test)
}

fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&at| items[at].clone()).collect()
}

fn accuracy(classifier: &RandomForestClassifier, rows: &[Vec<f64>], targets: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let hits = rows
        .iter()
        .zip(targets)
        .filter(|&(row, &target)| classifier.predict_with_confidence(row).0 == target)
        .count();
    hits as f64 / rows.len() as f64
}

fn r_squared(regressor: &RandomForestRegressor, rows: &[Vec<f64>], targets: &[f64]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let mean = targets.iter().sum::<f64>() / targets.len() as f64;
    let ss_total: f64 = targets.iter().map(|y| (y - mean).powi(2)).sum();
    if ss_total <= f64::EPSILON {
        return 0.0;
    }
    let ss_residual: f64 = rows
        .iter()
        .zip(targets)
        .map(|(row, y)| (y - regressor.predict(row)).powi(2))
        .sum();
    1.0 - ss_residual / ss_total
}
