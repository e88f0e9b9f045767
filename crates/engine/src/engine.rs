//! Graph traversal engine
//!
//! Drives one run: given a validated graph and a single external input,
//! repeatedly pops pending activations from an explicit stack, invokes the
//! node behavior, and follows connections from whichever output ports the
//! node populated. Branching, fan-out, and dead ends all fall out of that
//! one mechanism.
//!
//! A run is strictly sequential: activations are ordered by the stack
//! discipline, giving deterministic, reproducible ordering for a given
//! graph and input. The only unbounded blocking happens inside a node's
//! `process` (typically an outbound provider call).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::behavior::{Activation, PortValues};
use crate::error::{EngineError, Result};
use crate::events::{EventSink, RunEvent};
use crate::graph::{NodeGraph, NodeId, PROP_IS_END_NODE};
use crate::properties::PropertyBag;
use crate::registry::NodeRegistry;
use crate::services::NodeServices;
use crate::validation::validate_graph;

/// Default ceiling on activations per run. A hard cap against uncontrolled
/// cycles, not a cycle detector: stateful nodes that legitimately
/// re-activate must fit under it.
pub const DEFAULT_MAX_ACTIVATIONS: u32 = 20;

/// Output port the engine recognizes as the canonical final value of an
/// end-marked node.
pub const PORT_FINAL_OUTPUT: &str = "final_output";

/// Cooperative cancellation signal shared between a run and its host.
///
/// Cheap to clone; checked by the engine before popping the next
/// activation and on both sides of each `process` call. The engine never
/// interrupts a call already in flight — it finishes naturally and its
/// result is discarded.
#[derive(Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// An end-marked node terminated the run
    Finished,
    /// Traversal ran out of connected nodes before reaching an end node
    DeadEnd,
    /// Cooperative cancellation was observed
    Cancelled,
}

/// Result of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    /// How the run terminated
    pub status: RunStatus,
    /// Final value: the end node's output, or the last produced value for
    /// a dead-end completion, or null when nothing was produced
    pub final_output: Value,
    /// Number of node activations performed
    pub activations: u32,
    /// Wall-clock duration of the run
    pub execution_time_ms: u64,
}

/// The node-graph execution engine.
///
/// Holds no per-run state; a single engine may serve many runs, each with
/// its own run-local clone of node properties.
pub struct ExecutionEngine {
    registry: Arc<NodeRegistry>,
    services: NodeServices,
    max_activations: u32,
}

impl ExecutionEngine {
    /// Create an engine over a registry and collaborator bundle.
    pub fn new(registry: Arc<NodeRegistry>, services: NodeServices) -> Self {
        Self {
            registry,
            services,
            max_activations: DEFAULT_MAX_ACTIVATIONS,
        }
    }

    /// Override the activation ceiling.
    pub fn with_max_activations(mut self, max_activations: u32) -> Self {
        self.max_activations = max_activations;
        self
    }

    /// Execute `graph` against a single external input value.
    ///
    /// The graph itself is read-only for the whole run: node properties
    /// are deep-cloned into run-local state first, so concurrent runs of
    /// the same definition cannot bleed state into each other, and every
    /// run starts from the editor-configured defaults.
    pub async fn run(
        &self,
        graph: &NodeGraph,
        input: Value,
        cancel: &CancellationFlag,
        sink: &dyn EventSink,
    ) -> Result<RunOutcome> {
        let started = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        let errors = validate_graph(graph);
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        // Run-local property state, one bag per node id. Stateful nodes
        // mutate their bag across re-activations; dropping the map at the
        // end of the run is what resets them for the next run.
        let mut node_state: HashMap<NodeId, PropertyBag> = graph
            .nodes
            .iter()
            .map(|(id, node)| (id.clone(), node.properties.clone()))
            .collect();

        // Exactly one start node once validation has passed.
        let start_node: NodeId = graph.start_nodes()[0].id.clone();
        log::info!("run {}: starting from node '{}'", run_id, start_node);
        sink.send(RunEvent::RunStarted {
            run_id: run_id.clone(),
        });

        let mut seed = PortValues::new();
        seed.insert("input".to_string(), input);
        let mut stack: Vec<(NodeId, PortValues)> = vec![(start_node, seed)];

        let mut activations: u32 = 0;
        let mut last_value = Value::Null;

        while let Some((node_id, inputs)) = stack.pop() {
            if cancel.is_cancelled() {
                return Ok(self.cancelled(&run_id, activations, started, sink));
            }

            activations += 1;
            if activations > self.max_activations {
                let err = EngineError::LoopLimitExceeded(self.max_activations);
                sink.send(RunEvent::RunFailed {
                    run_id: run_id.clone(),
                    error: err.to_string(),
                });
                return Err(err);
            }

            // A connection pointing at a deleted node signals a corrupt
            // graph, not a runtime condition.
            let node = graph
                .find_node(&node_id)
                .ok_or_else(|| EngineError::GraphIntegrity(node_id.clone()))
                .map_err(|e| {
                    sink.send(RunEvent::RunFailed {
                        run_id: run_id.clone(),
                        error: e.to_string(),
                    });
                    e
                })?;

            let behavior = self.registry.resolve(&node.node_type);
            let descriptor = behavior.descriptor();

            let state = node_state
                .entry(node_id.clone())
                .or_insert_with(PropertyBag::new);
            state.merge_defaults(&descriptor.properties);

            sink.send(RunEvent::NodeStarted {
                run_id: run_id.clone(),
                node_id: node_id.clone(),
            });

            if cancel.is_cancelled() {
                return Ok(self.cancelled(&run_id, activations, started, sink));
            }

            let mut activation = Activation {
                node_id: &node_id,
                inputs: &inputs,
                properties: state,
                services: &self.services,
            };
            let outputs = match behavior.process(&mut activation).await {
                Ok(outputs) => outputs,
                Err(e) => {
                    let err = EngineError::node_failed(node_id.as_str(), e.to_string());
                    sink.send(RunEvent::RunFailed {
                        run_id: run_id.clone(),
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            };

            // A result that lands after cancellation is discarded, not
            // re-queued.
            if cancel.is_cancelled() {
                return Ok(self.cancelled(&run_id, activations, started, sink));
            }

            let populated = populated_ports(&descriptor.outputs, &outputs);
            log::debug!(
                "run {}: node '{}' populated {:?}",
                run_id,
                node_id,
                populated
            );
            sink.send(RunEvent::NodeFinished {
                run_id: run_id.clone(),
                node_id: node_id.clone(),
                populated_outputs: populated.clone(),
            });

            for port in &populated {
                last_value = outputs[port].clone();
            }

            // Terminal check: end-marked nodes (statically, or flipped by
            // a stateful node during this run) finish the run.
            if node_state[&node_id].flag(PROP_IS_END_NODE) {
                let final_output = final_value(&populated, &outputs, &last_value);
                log::info!("run {}: finished at end node '{}'", run_id, node_id);
                sink.send(RunEvent::RunCompleted {
                    run_id: run_id.clone(),
                });
                return Ok(RunOutcome {
                    status: RunStatus::Finished,
                    final_output,
                    activations,
                    execution_time_ms: started.elapsed().as_millis() as u64,
                });
            }

            // Branch/continue: follow connections from every populated
            // port, accumulating one input bundle per downstream node.
            // Within one activation the last write to an input port wins.
            let mut pending: Vec<(NodeId, PortValues)> = Vec::new();
            for port in &populated {
                let mut matched = false;
                for conn in graph.connections_from_port(&node_id, port) {
                    matched = true;
                    let value = outputs[port].clone();
                    match pending.iter_mut().find(|(id, _)| *id == conn.to_node) {
                        Some((_, bundle)) => {
                            bundle.insert(conn.to_input.clone(), value);
                        }
                        None => {
                            let mut bundle = PortValues::new();
                            bundle.insert(conn.to_input.clone(), value);
                            pending.push((conn.to_node.clone(), bundle));
                        }
                    }
                }
                if !matched {
                    log::debug!(
                        "run {}: output '{}' of node '{}' has no connection; branch ends",
                        run_id,
                        port,
                        node_id
                    );
                }
            }

            for entry in pending {
                stack.push(entry);
            }
        }

        // Ran out of graph without reaching an end node: a soft
        // completion carrying whatever was produced last.
        log::info!("run {}: no connected nodes left, exiting", run_id);
        sink.send(RunEvent::RunCompleted {
            run_id: run_id.clone(),
        });
        Ok(RunOutcome {
            status: RunStatus::DeadEnd,
            final_output: last_value,
            activations,
            execution_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn cancelled(
        &self,
        run_id: &str,
        activations: u32,
        started: Instant,
        sink: &dyn EventSink,
    ) -> RunOutcome {
        log::info!("run {}: cancelled after {} activations", run_id, activations);
        sink.send(RunEvent::RunCancelled {
            run_id: run_id.to_string(),
        });
        RunOutcome {
            status: RunStatus::Cancelled,
            final_output: Value::Null,
            activations,
            execution_time_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Whether a port value counts as "populated" for routing purposes.
/// Null, empty strings, and empty arrays do not drive traversal.
fn is_trivial(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}

/// Populated output ports in deterministic order: declared order first,
/// then any undeclared ports (e.g. the missing-type fallback's `error`)
/// sorted by name.
fn populated_ports(declared: &[String], outputs: &PortValues) -> Vec<String> {
    let mut ports: Vec<String> = declared
        .iter()
        .filter(|p| outputs.get(*p).is_some_and(|v| !is_trivial(v)))
        .cloned()
        .collect();

    let mut extra: Vec<String> = outputs
        .iter()
        .filter(|(port, value)| !declared.contains(port) && !is_trivial(value))
        .map(|(port, _)| port.clone())
        .collect();
    extra.sort();
    ports.extend(extra);
    ports
}

/// Final value of a terminating activation: the `final_output` port when
/// populated, else the first populated output, else the last value seen
/// anywhere in the run (null if nothing was ever produced).
fn final_value(populated: &[String], outputs: &PortValues, last_value: &Value) -> Value {
    if populated.iter().any(|p| p == PORT_FINAL_OUTPUT) {
        return outputs[PORT_FINAL_OUTPUT].clone();
    }
    if let Some(first) = populated.first() {
        return outputs[first].clone();
    }
    last_value.clone()
}
