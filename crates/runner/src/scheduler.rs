//! Periodic scheduling without process-global state.
//!
//! The application constructs exactly one scheduler and hands it to the
//! components that need periodic callbacks. Tests inject [`ManualScheduler`]
//! and drive ticks by hand, which keeps schedule-driven behavior
//! deterministic.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::RunnerError;

/// A repeating scheduled task.
pub type Task = Box<dyn FnMut() + Send>;

/// Default schedule interval when no config file exists.
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

/// Handle to one repeating schedule.
pub trait TaskHandle {
    /// Stop the repeating task. Returns once the task can no longer run.
    fn cancel(self);
}

/// Owns periodic execution of repeating tasks.
pub trait Scheduler {
    type Handle: TaskHandle;

    /// Run `task` every `interval` until the handle is cancelled or dropped.
    fn repeat(&self, interval: Duration, task: Task) -> Self::Handle;
}

/// Thread-backed scheduler for production use.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        Self
    }
}

/// Handle to a thread-backed schedule. Dropping it stops the schedule too,
/// via the disconnected shutdown channel.
#[derive(Debug)]
pub struct ThreadTaskHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl TaskHandle for ThreadTaskHandle {
    fn cancel(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Scheduler for ThreadScheduler {
    type Handle = ThreadTaskHandle;

    fn repeat(&self, interval: Duration, mut task: Task) -> Self::Handle {
        let (shutdown, ticks) = mpsc::channel();
        let join = thread::spawn(move || {
            loop {
                match ticks.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => task(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        ThreadTaskHandle {
            shutdown,
            join: Some(join),
        }
    }
}

type TaskSlot = (u64, Task);

/// Deterministic scheduler for tests: tasks run only when [`tick`] is called.
///
/// [`tick`]: ManualScheduler::tick
#[derive(Default, Clone)]
pub struct ManualScheduler {
    tasks: Arc<Mutex<Vec<TaskSlot>>>,
    next_id: Arc<AtomicU64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every registered task once, in registration order.
    pub fn tick(&self) {
        let mut tasks = self.tasks.lock().unwrap();
        for (_, task) in tasks.iter_mut() {
            task();
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

/// Handle to a manually scheduled task.
pub struct ManualTaskHandle {
    id: u64,
    tasks: Arc<Mutex<Vec<TaskSlot>>>,
}

impl TaskHandle for ManualTaskHandle {
    fn cancel(self) {
        self.tasks.lock().unwrap().retain(|(id, _)| *id != self.id);
    }
}

impl Scheduler for ManualScheduler {
    type Handle = ManualTaskHandle;

    fn repeat(&self, _interval: Duration, task: Task) -> Self::Handle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.tasks.lock().unwrap().push((id, task));
        ManualTaskHandle {
            id,
            tasks: Arc::clone(&self.tasks),
        }
    }
}

/// Persisted schedule settings.
///
/// A missing file means defaults; a malformed file is an error the caller
/// must handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Update the interval; zero is rejected.
    pub fn set_interval_secs(&mut self, secs: u64) -> Result<(), RunnerError> {
        if secs == 0 {
            return Err(RunnerError::invalid_config("interval must be positive"));
        }
        self.interval_secs = secs;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, RunnerError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), RunnerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
