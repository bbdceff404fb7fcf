//! Read-only inventory views the runner forecasts over.
//!
//! Storage is an external collaborator; it supplies these snapshots through
//! [`SnapshotSource`]. The runner never writes inventory state.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockcast_forecast::{Category, EventSignals, WeatherReading};

use crate::error::RunnerError;

/// Identifier of an inventory owner (account holder).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// New time-ordered identifier. Prefer fixed UUIDs in tests.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One inventory row, as the storage layer last saw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemSnapshot {
    pub item_id: String,
    pub name: String,
    pub category: Category,
    pub quantity: i64,
}

/// All rows belonging to one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub owner_id: OwnerId,
    pub items: Vec<InventoryItemSnapshot>,
}

/// Current weather and local-event state, fetched by external clients.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalConditions {
    pub weather: WeatherReading,
    pub events: EventSignals,
}

/// Supplies inventory snapshots to the runner.
pub trait SnapshotSource: Send + Sync + 'static {
    fn snapshots(&self) -> Result<Vec<InventorySnapshot>, RunnerError>;
}

/// Supplies current local conditions (weather plus events).
pub trait ConditionSource: Send + Sync + 'static {
    fn current(&self) -> Result<LocalConditions, RunnerError>;
}
