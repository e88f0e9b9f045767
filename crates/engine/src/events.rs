//! Run progress events
//!
//! Events are sent from the engine to any consumer — typically the visual
//! editor highlighting the active node. They are purely advisory and never
//! affect control flow.

use serde::{Deserialize, Serialize};

/// Trait for receiving run events.
///
/// Abstracts over the transport (channel, UI queue, log) so the engine can
/// be used in different hosts.
pub trait EventSink: Send + Sync {
    /// Deliver an event. Delivery failures are the sink's problem; the
    /// engine ignores them.
    fn send(&self, event: RunEvent);
}

/// Events emitted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RunEvent {
    /// Traversal started from the start node
    #[serde(rename_all = "camelCase")]
    RunStarted { run_id: String },

    /// A node activation began
    #[serde(rename_all = "camelCase")]
    NodeStarted { run_id: String, node_id: String },

    /// A node activation finished
    #[serde(rename_all = "camelCase")]
    NodeFinished {
        run_id: String,
        node_id: String,
        populated_outputs: Vec<String>,
    },

    /// The run reached a terminal node or drained its stack
    #[serde(rename_all = "camelCase")]
    RunCompleted { run_id: String },

    /// The run aborted with an engine error
    #[serde(rename_all = "camelCase")]
    RunFailed { run_id: String, error: String },

    /// The run observed cooperative cancellation
    #[serde(rename_all = "camelCase")]
    RunCancelled { run_id: String },
}

/// A no-op sink that discards all events.
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn send(&self, _event: RunEvent) {}
}

/// A vector-based sink that collects events, for tests.
#[derive(Default)]
pub struct VecEventSink {
    events: parking_lot::Mutex<Vec<RunEvent>>,
}

impl VecEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All collected events, in emission order.
    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().clone()
    }

    /// Node ids of all `NodeStarted` events, i.e. the activation order.
    pub fn activation_order(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunEvent::NodeStarted { node_id, .. } => Some(node_id),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for VecEventSink {
    fn send(&self, event: RunEvent) {
        self.events.lock().push(event);
    }
}
