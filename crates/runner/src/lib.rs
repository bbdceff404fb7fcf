//! `stockcast-runner` — periodic demand forecasting.
//!
//! **Responsibility:** drive the forecast pipeline on a schedule and hand
//! the results to whoever displays or stores them.
//!
//! The crate owns no state beyond what it is constructed with:
//! - inventory rows arrive through [`SnapshotSource`],
//! - weather/event state arrives through [`ConditionSource`],
//! - results leave through [`InsightSink`],
//! - periodic execution comes from an explicitly constructed [`Scheduler`]
//!   (tests use [`ManualScheduler`] and tick by hand).

pub mod error;
pub mod insight;
pub mod runner;
pub mod scheduler;
pub mod snapshot;

pub use error::RunnerError;
pub use insight::{ForecastInsight, InMemoryInsightSink, InsightSink};
pub use runner::ForecastRunner;
pub use scheduler::{
    DEFAULT_INTERVAL_SECS, ManualScheduler, ScheduleConfig, Scheduler, Task, TaskHandle,
    ThreadScheduler,
};
pub use snapshot::{
    ConditionSource, InventoryItemSnapshot, InventorySnapshot, LocalConditions, OwnerId,
    SnapshotSource,
};
