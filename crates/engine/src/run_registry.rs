//! Run bookkeeping
//!
//! Tracks in-flight and finished runs for a host that drives the engine:
//! each run gets a uuid, a cancellation flag the host can trip, and a
//! terminal record (output or error, with timestamps). The registry is a
//! plain shared map; the engine itself never touches it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::CancellationFlag;

/// Lifecycle state of a tracked run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Running,
    Completed,
    Stopped,
    Failed,
}

/// Snapshot of one tracked run.
#[derive(Clone)]
pub struct RunHandle {
    pub id: String,
    pub workflow_name: String,
    pub status: RunState,
    pub cancel: CancellationFlag,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub output: Option<Value>,
    pub error: Option<String>,
}

impl RunHandle {
    /// Wall-clock duration, using now as the end for running runs.
    pub fn duration(&self) -> chrono::Duration {
        self.ended_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

/// Shared registry of runs keyed by run id.
#[derive(Default)]
pub struct RunRegistry {
    runs: Mutex<HashMap<String, RunHandle>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new running workflow. Returns the run id and the
    /// cancellation flag to pass into the engine.
    pub fn begin(&self, workflow_name: &str) -> (String, CancellationFlag) {
        let id = uuid::Uuid::new_v4().to_string();
        let cancel = CancellationFlag::new();
        let handle = RunHandle {
            id: id.clone(),
            workflow_name: workflow_name.to_string(),
            status: RunState::Running,
            cancel: cancel.clone(),
            started_at: Utc::now(),
            ended_at: None,
            output: None,
            error: None,
        };
        log::info!("workflow '{}' started as run {}", workflow_name, id);
        self.runs.lock().insert(id.clone(), handle);
        (id, cancel)
    }

    /// Mark a run as completed with its final output.
    pub fn complete(&self, id: &str, output: Value) {
        self.finish(id, RunState::Completed, Some(output), None);
    }

    /// Mark a run as failed.
    pub fn fail(&self, id: &str, error: impl Into<String>) {
        self.finish(id, RunState::Failed, None, Some(error.into()));
    }

    /// Request cancellation of a running run. The run flips to `Stopped`
    /// immediately; the engine observes the flag at its next checkpoint.
    pub fn stop(&self, id: &str) -> bool {
        let mut runs = self.runs.lock();
        match runs.get_mut(id) {
            Some(handle) if handle.status == RunState::Running => {
                handle.cancel.cancel();
                handle.status = RunState::Stopped;
                handle.ended_at = Some(Utc::now());
                log::info!("run {} stop requested", id);
                true
            }
            _ => false,
        }
    }

    /// Look up a snapshot of one run.
    pub fn get(&self, id: &str) -> Option<RunHandle> {
        self.runs.lock().get(id).cloned()
    }

    /// All tracked runs, oldest first.
    pub fn list(&self) -> Vec<RunHandle> {
        let runs = self.runs.lock();
        let mut all: Vec<RunHandle> = runs.values().cloned().collect();
        all.sort_by_key(|h| h.started_at);
        all
    }

    /// Drop a finished run's record. Running runs are kept.
    pub fn remove(&self, id: &str) -> bool {
        let mut runs = self.runs.lock();
        match runs.get(id) {
            Some(handle) if handle.status != RunState::Running => {
                runs.remove(id);
                true
            }
            _ => false,
        }
    }

    fn finish(&self, id: &str, status: RunState, output: Option<Value>, error: Option<String>) {
        let mut runs = self.runs.lock();
        if let Some(handle) = runs.get_mut(id) {
            handle.status = status;
            handle.ended_at = Some(Utc::now());
            handle.output = output;
            handle.error = error;
        }
    }
}
