//! Periodic demand forecasting over inventory snapshots.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use stockcast_forecast::DemandPredictor;

use crate::error::RunnerError;
use crate::insight::{ForecastInsight, InsightSink};
use crate::scheduler::{Scheduler, Task};
use crate::snapshot::{ConditionSource, InventorySnapshot, SnapshotSource};

/// Walks inventory snapshots and emits one forecast insight per item.
///
/// Construction is explicit: the caller owns the predictor, the sources, the
/// sink, the scheduler and the returned schedule handle. Nothing here is
/// process-global.
pub struct ForecastRunner {
    predictor: DemandPredictor,
    snapshots: Arc<dyn SnapshotSource>,
    conditions: Arc<dyn ConditionSource>,
    sink: Arc<dyn InsightSink>,
}

impl ForecastRunner {
    pub fn new(
        predictor: DemandPredictor,
        snapshots: Arc<dyn SnapshotSource>,
        conditions: Arc<dyn ConditionSource>,
        sink: Arc<dyn InsightSink>,
    ) -> Self {
        Self {
            predictor,
            snapshots,
            conditions,
            sink,
        }
    }

    /// One forecasting pass: fetch conditions once, forecast every item,
    /// deliver the insights. Returns how many insights were delivered.
    ///
    /// Source failures propagate; prediction itself cannot fail.
    pub fn run_once(&self) -> Result<usize, RunnerError> {
        let conditions = self.conditions.current()?;
        let snapshots = self.snapshots.snapshots()?;
        let generated_at = Utc::now();

        let mut delivered = 0;
        for InventorySnapshot { owner_id, items } in snapshots {
            for item in items {
                let forecast =
                    self.predictor
                        .predict(item.category, &conditions.weather, &conditions.events);
                let message = format!("{}: {}", item.name, forecast);
                self.sink.deliver(ForecastInsight {
                    owner_id,
                    item_id: item.item_id,
                    item_name: item.name,
                    category: item.category,
                    forecast,
                    message,
                    generated_at,
                });
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Schedule periodic passes on an owned scheduler.
    ///
    /// A failed pass is logged and the schedule keeps running; the handle
    /// stops it.
    pub fn spawn<S: Scheduler>(self, scheduler: &S, interval: Duration) -> S::Handle {
        info!(interval_secs = interval.as_secs(), "starting forecast runner");
        let task: Task = Box::new(move || match self.run_once() {
            Ok(delivered) => info!(delivered, "forecast pass complete"),
            Err(error) => warn!(%error, "forecast pass failed"),
        });
        scheduler.repeat(interval, task)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use uuid::Uuid;

    use stockcast_forecast::{
        Category, EventSignals, TrainerConfig, WeatherReading, train,
    };

    use super::*;
    use crate::insight::InMemoryInsightSink;
    use crate::scheduler::{ManualScheduler, TaskHandle};
    use crate::snapshot::{InventoryItemSnapshot, LocalConditions, OwnerId};

    struct FixedSnapshots(Vec<InventorySnapshot>);

    impl SnapshotSource for FixedSnapshots {
        fn snapshots(&self) -> Result<Vec<InventorySnapshot>, RunnerError> {
            Ok(self.0.clone())
        }
    }

    struct FixedConditions(LocalConditions);

    impl ConditionSource for FixedConditions {
        fn current(&self) -> Result<LocalConditions, RunnerError> {
            Ok(self.0)
        }
    }

    struct FailingConditions;

    impl ConditionSource for FailingConditions {
        fn current(&self) -> Result<LocalConditions, RunnerError> {
            Err(RunnerError::source("weather client offline"))
        }
    }

    /// Condition source that swaps its answer after the first call.
    struct FlakyConditions {
        calls: Mutex<usize>,
    }

    impl ConditionSource for FlakyConditions {
        fn current(&self) -> Result<LocalConditions, RunnerError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            if *calls == 1 {
                Err(RunnerError::source("first fetch timed out"))
            } else {
                Ok(LocalConditions::default())
            }
        }
    }

    fn predictor() -> DemandPredictor {
        static ARTIFACTS: OnceLock<DemandPredictor> = OnceLock::new();
        ARTIFACTS
            .get_or_init(|| {
                stockcast_observability::init_for_tests();
                let config = TrainerConfig {
                    num_samples: 700,
                    num_trees: 12,
                    max_depth: 9,
                    test_fraction: 0.2,
                    seed: 42,
                };
                let (artifacts, _) = train(&config).expect("training should succeed");
                DemandPredictor::new(Arc::new(artifacts))
            })
            .clone()
    }

    fn owner(n: u128) -> OwnerId {
        OwnerId::from_uuid(Uuid::from_u128(n))
    }

    fn two_owner_snapshot() -> Vec<InventorySnapshot> {
        vec![
            InventorySnapshot {
                owner_id: owner(1),
                items: vec![
                    InventoryItemSnapshot {
                        item_id: "ib-001".to_string(),
                        name: "iced barley tea".to_string(),
                        category: Category::Beverage,
                        quantity: 24,
                    },
                    InventoryItemSnapshot {
                        item_id: "nb-204".to_string(),
                        name: "spiral notebook".to_string(),
                        category: Category::Stationery,
                        quantity: 60,
                    },
                ],
            },
            InventorySnapshot {
                owner_id: owner(2),
                items: vec![InventoryItemSnapshot {
                    item_id: "fan-77".to_string(),
                    name: "desk fan".to_string(),
                    category: Category::Electronics,
                    quantity: 8,
                }],
            },
        ]
    }

    fn hot_dry_conditions() -> LocalConditions {
        LocalConditions {
            weather: WeatherReading::new(33.0, false),
            events: EventSignals::default(),
        }
    }

    #[test]
    fn run_once_delivers_one_insight_per_item() {
        let sink = Arc::new(InMemoryInsightSink::new());
        let runner = ForecastRunner::new(
            predictor(),
            Arc::new(FixedSnapshots(two_owner_snapshot())),
            Arc::new(FixedConditions(hot_dry_conditions())),
            Arc::clone(&sink) as Arc<dyn InsightSink>,
        );

        let delivered = runner.run_once().unwrap();
        assert_eq!(delivered, 3);

        let insights = sink.all();
        assert_eq!(insights.len(), 3);
        assert!(insights.iter().any(|i| i.owner_id == owner(2)));
        for insight in &insights {
            assert!(insight.message.contains("units expected"));
            assert!(insight.message.starts_with(&insight.item_name));
        }
    }

    #[test]
    fn source_failures_propagate_from_run_once() {
        let sink = Arc::new(InMemoryInsightSink::new());
        let runner = ForecastRunner::new(
            predictor(),
            Arc::new(FixedSnapshots(two_owner_snapshot())),
            Arc::new(FailingConditions),
            Arc::clone(&sink) as Arc<dyn InsightSink>,
        );

        let err = runner.run_once().unwrap_err();
        match err {
            RunnerError::Source(_) => {}
            other => panic!("expected Source, got {other:?}"),
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn manual_ticks_drive_scheduled_passes() {
        let sink = Arc::new(InMemoryInsightSink::new());
        let runner = ForecastRunner::new(
            predictor(),
            Arc::new(FixedSnapshots(two_owner_snapshot())),
            Arc::new(FixedConditions(hot_dry_conditions())),
            Arc::clone(&sink) as Arc<dyn InsightSink>,
        );

        let scheduler = ManualScheduler::new();
        let handle = runner.spawn(&scheduler, Duration::from_secs(3600));
        assert!(sink.is_empty());

        scheduler.tick();
        scheduler.tick();
        assert_eq!(sink.len(), 6);

        handle.cancel();
        scheduler.tick();
        assert_eq!(sink.len(), 6);
    }

    #[test]
    fn a_failed_pass_does_not_stop_the_schedule() {
        let sink = Arc::new(InMemoryInsightSink::new());
        let runner = ForecastRunner::new(
            predictor(),
            Arc::new(FixedSnapshots(two_owner_snapshot())),
            Arc::new(FlakyConditions {
                calls: Mutex::new(0),
            }),
            Arc::clone(&sink) as Arc<dyn InsightSink>,
        );

        let scheduler = ManualScheduler::new();
        let handle = runner.spawn(&scheduler, Duration::from_secs(3600));

        scheduler.tick();
        assert!(sink.is_empty());

        scheduler.tick();
        assert_eq!(sink.len(), 3);

        handle.cancel();
    }
}
