//! Feature encoding aligned to a named column schema.

use serde::{Deserialize, Serialize};

use crate::observation::{Category, Observation};

/// Ordered feature-column list.
///
/// The column set used at inference time must exactly match the set recorded
/// at training time, in the same order; this list is the single source of
/// that ordering and is persisted alongside the fitted models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Canonical training-time schema: scalar/boolean columns followed by
    /// one-hot category columns, with the reference category dropped.
    pub fn canonical() -> Self {
        let mut columns = vec![
            "temperature".to_string(),
            "is_raining".to_string(),
            "is_hot_wave".to_string(),
            "has_festival".to_string(),
            "has_concert".to_string(),
        ];
        columns.extend(Category::ALL.iter().skip(1).map(|c| c.column_name()));
        Self { columns }
    }

    pub fn from_columns(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Encode one observation against `schema`.
///
/// Schema columns the observation does not produce fill with 0.0; observation
/// values without a matching schema column are dropped. Reindexing therefore
/// never fails, whatever category is present.
pub fn feature_row(observation: &Observation, schema: &FeatureSchema) -> Vec<f64> {
    let category_column = observation.category.column_name();
    schema
        .columns
        .iter()
        .map(|column| match column.as_str() {
            "temperature" => observation.temperature_c,
            "is_raining" => flag(observation.is_raining),
            "is_hot_wave" => flag(observation.is_hot_wave()),
            "has_festival" => flag(observation.has_festival),
            "has_concert" => flag(observation.has_concert),
            name if name == category_column => 1.0,
            _ => 0.0,
        })
        .collect()
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
