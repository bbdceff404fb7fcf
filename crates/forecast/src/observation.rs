//! Observation model: what the pipeline sees about one item at one moment.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ForecastError;

/// Temperature (°C) at and above which an observation counts as a hot wave.
pub const HOT_WAVE_THRESHOLD_C: f64 = 30.0;

/// Item category.
///
/// The first entry of [`Category::ALL`] is the reference level dropped from
/// one-hot encoding.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Stationery,
    Household,
    Electronics,
    Beverage,
    Food,
    Other,
}

impl Category {
    /// All categories, in canonical encoding order.
    pub const ALL: [Category; 6] = [
        Category::Stationery,
        Category::Household,
        Category::Electronics,
        Category::Beverage,
        Category::Food,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Stationery => "stationery",
            Category::Household => "household",
            Category::Electronics => "electronics",
            Category::Beverage => "beverage",
            Category::Food => "food",
            Category::Other => "other",
        }
    }

    /// One-hot feature column name for this category.
    pub(crate) fn column_name(&self) -> String {
        format!("category_{}", self.as_str())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| ForecastError::UnknownCategory(s.to_string()))
    }
}

/// Predicted demand direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandClass {
    Decrease,
    Neutral,
    Increase,
}

impl DemandClass {
    /// Class order shared by training targets and classifier outputs.
    pub const ALL: [DemandClass; 3] = [
        DemandClass::Decrease,
        DemandClass::Neutral,
        DemandClass::Increase,
    ];

    pub fn index(&self) -> usize {
        match self {
            DemandClass::Decrease => 0,
            DemandClass::Neutral => 1,
            DemandClass::Increase => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DemandClass::Decrease => "decrease",
            DemandClass::Neutral => "neutral",
            DemandClass::Increase => "increase",
        }
    }
}

impl fmt::Display for DemandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weather input contract.
///
/// Raw reports come from an external weather client as loose JSON; absent
/// keys default to zero/false, a non-numeric temperature is the caller's
/// error to handle.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_c: f64,
    pub is_raining: bool,
}

impl WeatherReading {
    pub fn new(temperature_c: f64, is_raining: bool) -> Self {
        Self {
            temperature_c,
            is_raining,
        }
    }

    pub fn from_report(report: &JsonValue) -> Result<Self, ForecastError> {
        let temperature_c = match report.get("temperature") {
            None | Some(JsonValue::Null) => 0.0,
            Some(value) => value.as_f64().ok_or_else(|| {
                ForecastError::validation(format!("non-numeric temperature: {value}"))
            })?,
        };
        let is_raining = report.get("is_raining").map(truthy).unwrap_or(false);
        Ok(Self {
            temperature_c,
            is_raining,
        })
    }
}

/// Local-event input contract: truthy `festival` / `concert` entries flag
/// the respective event types, anything absent means no event.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventSignals {
    pub has_festival: bool,
    pub has_concert: bool,
}

impl EventSignals {
    pub fn new(has_festival: bool, has_concert: bool) -> Self {
        Self {
            has_festival,
            has_concert,
        }
    }

    pub fn from_report(report: &JsonValue) -> Self {
        Self {
            has_festival: report.get("festival").map(truthy).unwrap_or(false),
            has_concert: report.get("concert").map(truthy).unwrap_or(false),
        }
    }

    pub fn any(&self) -> bool {
        self.has_festival || self.has_concert
    }
}

fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
    }
}

/// One pipeline input: current conditions for one item category.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub temperature_c: f64,
    pub is_raining: bool,
    pub has_festival: bool,
    pub has_concert: bool,
    pub category: Category,
}

impl Observation {
    pub fn from_inputs(category: Category, weather: &WeatherReading, events: &EventSignals) -> Self {
        Self {
            temperature_c: weather.temperature_c,
            is_raining: weather.is_raining,
            has_festival: events.has_festival,
            has_concert: events.has_concert,
            category,
        }
    }

    /// Derived, never supplied by callers.
    pub fn is_hot_wave(&self) -> bool {
        self.temperature_c >= HOT_WAVE_THRESHOLD_C
    }
}

/// Training row: an observation plus its labels.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledObservation {
    pub observation: Observation,
    pub demand_class: DemandClass,
    pub quantity_delta: i64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn category_parses_known_names() {
        assert_eq!("beverage".parse::<Category>().unwrap(), Category::Beverage);
        assert_eq!(" Food ".parse::<Category>().unwrap(), Category::Food);
    }

    #[test]
    fn category_rejects_unknown_names() {
        let err = "furniture".parse::<Category>().unwrap_err();
        match err {
            ForecastError::UnknownCategory(name) => assert_eq!(name, "furniture"),
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn weather_reading_defaults_absent_keys() {
        let reading = WeatherReading::from_report(&json!({})).unwrap();
        assert_eq!(reading.temperature_c, 0.0);
        assert!(!reading.is_raining);
    }

    #[test]
    fn weather_reading_reads_present_keys() {
        let reading =
            WeatherReading::from_report(&json!({"temperature": 31.5, "is_raining": true})).unwrap();
        assert_eq!(reading.temperature_c, 31.5);
        assert!(reading.is_raining);
    }

    #[test]
    fn weather_reading_rejects_non_numeric_temperature() {
        let err = WeatherReading::from_report(&json!({"temperature": "warm"})).unwrap_err();
        match err {
            ForecastError::Validation(_) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn event_signals_follow_truthiness() {
        let events = EventSignals::from_report(&json!({"festival": ["lantern parade"]}));
        assert!(events.has_festival);
        assert!(!events.has_concert);

        let none = EventSignals::from_report(&json!({"festival": [], "concert": 0}));
        assert!(!none.any());
    }

    #[test]
    fn hot_wave_is_derived_at_the_threshold() {
        let mut obs = Observation::from_inputs(
            Category::Beverage,
            &WeatherReading::new(29.9, false),
            &EventSignals::default(),
        );
        assert!(!obs.is_hot_wave());

        obs.temperature_c = 30.0;
        assert!(obs.is_hot_wave());

        obs.temperature_c = 33.0;
        assert!(obs.is_hot_wave());
    }

    #[test]
    fn demand_class_index_round_trips() {
        for class in DemandClass::ALL {
            assert_eq!(DemandClass::from_index(class.index()), Some(class));
        }
        assert_eq!(DemandClass::from_index(3), None);
    }
}
