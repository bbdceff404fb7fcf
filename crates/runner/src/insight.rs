//! Forecast insights and their delivery seam.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockcast_forecast::{Category, DemandForecast};

use crate::snapshot::OwnerId;

/// One periodic forecast for one inventory row.
///
/// An insight is advisory output, not inventory state; sinks may persist or
/// display it without touching stock levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInsight {
    pub owner_id: OwnerId,
    pub item_id: String,
    pub item_name: String,
    pub category: Category,
    pub forecast: DemandForecast,
    /// Rendered notification line, e.g. for a mailbox message body.
    pub message: String,
    pub generated_at: DateTime<Utc>,
}

/// Receives insights produced by the runner (mailbox, UI, log, ...).
pub trait InsightSink: Send + Sync + 'static {
    fn deliver(&self, insight: ForecastInsight);
}

/// Collecting sink for tests and development.
#[derive(Debug, Default)]
pub struct InMemoryInsightSink {
    inner: std::sync::Mutex<Vec<ForecastInsight>>,
}

impl InMemoryInsightSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<ForecastInsight> {
        self.inner.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InsightSink for InMemoryInsightSink {
    fn deliver(&self, insight: ForecastInsight) {
        self.inner.lock().unwrap().push(insight);
    }
}
