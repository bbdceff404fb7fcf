//! `stockcast-forecast` — demand-forecasting pipeline.
//!
//! **Responsibility:** turn current weather/event conditions plus an item
//! category into a demand-direction probability and an expected stock
//! movement.
//!
//! The crate is pure computation plus artifact file I/O:
//! - synthetic corpus generation and model fitting ([`synthetic`], [`trainer`]),
//! - the durable (classifier, regressor, column-schema) triple ([`artifacts`]),
//! - read-only prediction over loaded artifacts ([`predictor`]).
//!
//! Network collaborators (weather client, local-event lookup) stay outside;
//! they feed the input contracts in [`observation`].

pub mod artifacts;
pub mod error;
pub mod features;
pub mod forest;
pub mod observation;
pub mod predictor;
pub mod synthetic;
pub mod trainer;

pub use artifacts::{ArtifactStore, ModelArtifacts};
pub use error::{ForecastError, ForecastResult};
pub use features::{FeatureSchema, feature_row};
pub use forest::{RandomForestClassifier, RandomForestRegressor};
pub use observation::{
    Category, DemandClass, EventSignals, HOT_WAVE_THRESHOLD_C, LabeledObservation, Observation,
    WeatherReading,
};
pub use predictor::{DemandForecast, DemandPredictor};
pub use synthetic::generate;
pub use trainer::{TrainerConfig, TrainingReport, class_weight, train};
