//! Read-only demand prediction over a fitted artifact triple.

use core::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::artifacts::ModelArtifacts;
use crate::features::feature_row;
use crate::observation::{Category, DemandClass, EventSignals, Observation, WeatherReading};

/// One demand forecast, ready for display.
///
/// Fields are public so callers can consume the raw class/probability/delta;
/// `Display` renders the user-facing sentence.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandForecast {
    pub demand: DemandClass,
    /// Probability of `demand`, rounded to the nearest ten percent.
    pub confidence_percent: u8,
    /// Expected stock movement, rounded to the nearest unit.
    pub quantity_delta: i64,
}

impl fmt::Display for DemandForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}% confidence of {} ({:+} units expected)",
            self.confidence_percent, self.demand, self.quantity_delta
        )
    }
}

/// Predictor over shared, read-only artifacts.
///
/// Cloning is cheap (the triple sits behind an `Arc`), and concurrent use
/// needs no locking: the artifacts are never mutated after load. Prediction
/// is pure computation; training and artifact I/O happen elsewhere.
#[derive(Debug, Clone)]
pub struct DemandPredictor {
    artifacts: Arc<ModelArtifacts>,
}

impl DemandPredictor {
    pub fn new(artifacts: Arc<ModelArtifacts>) -> Self {
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &ModelArtifacts {
        &self.artifacts
    }

    /// Forecast demand for one category under the given conditions.
    pub fn predict(
        &self,
        category: Category,
        weather: &WeatherReading,
        events: &EventSignals,
    ) -> DemandForecast {
        let observation = Observation::from_inputs(category, weather, events);
        let row = feature_row(&observation, &self.artifacts.schema);

        let (class_at, probability) = self.artifacts.classifier.predict_with_confidence(&row);
        let demand = DemandClass::from_index(class_at).unwrap_or(DemandClass::Neutral);
        let quantity = self.artifacts.regressor.predict(&row);

        DemandForecast {
            demand,
            confidence_percent: round_to_ten_percent(probability),
            quantity_delta: round_quantity(quantity),
        }
    }
}

/// Round a probability in [0, 1] to the nearest multiple of ten percent.
fn round_to_ten_percent(probability: f64) -> u8 {
    (((probability * 10.0).round() * 10.0).clamp(0.0, 100.0)) as u8
}

fn round_quantity(raw: f64) -> i64 {
    raw.round() as i64
}
