//! XeroFlow engine - node-graph workflow execution
//!
//! This crate is the runtime half of XeroFlow: it takes a serialized node
//! graph (nodes, typed properties, port-to-port connections), resolves each
//! node's type against a registry of behaviors, and drives a run from the
//! start node to an end node. It supports:
//!
//! - Stack-based depth-first traversal with branching and fan-out
//! - Conditional routing driven by which output ports a node populates
//! - Stateful nodes that re-activate across loop iterations
//! - An activation ceiling guarding against runaway cycles
//! - Cooperative cancellation and per-run event streaming
//!
//! # Architecture
//!
//! - `graph`: the serialized workflow model (nodes, connections)
//! - `registry` + `behavior`: node types and their runtime contract
//! - `validation`: structural checks run before any activation
//! - `engine`: the traversal loop itself
//! - `services` + `clients`: collaborators handed to nodes (LLM access,
//!   review gate, provider configuration)
//! - `run_registry`: host-side bookkeeping of in-flight runs
//!
//! # Example
//!
//! ```ignore
//! use xeroflow_engine::{ExecutionEngine, NodeGraph, CancellationFlag, NullEventSink};
//!
//! let graph = NodeGraph::load("workflow.json")?;
//! let outcome = engine
//!     .run(&graph, input, &CancellationFlag::new(), &NullEventSink)
//!     .await?;
//! ```

pub mod behavior;
pub mod clients;
pub mod engine;
pub mod error;
pub mod events;
pub mod graph;
pub mod properties;
pub mod registry;
pub mod run_registry;
pub mod services;
pub mod validation;

// Re-export key types
pub use behavior::{Activation, NodeBehavior, NodeDescriptor, PortValues};
pub use clients::HttpLlmClient;
pub use engine::{
    CancellationFlag, ExecutionEngine, RunOutcome, RunStatus, DEFAULT_MAX_ACTIVATIONS,
};
pub use error::{EngineError, Result};
pub use events::{EventSink, NullEventSink, RunEvent, VecEventSink};
pub use graph::{Connection, GraphNode, NodeGraph, NodeId};
pub use properties::{PropertyBag, PropertyKind, PropertySpec, PropertyValue};
pub use registry::NodeRegistry;
pub use run_registry::{RunHandle, RunRegistry, RunState};
pub use services::{
    AutoApprove, EngineConfig, LlmClient, LlmResponse, NodeServices, ProviderConfig, ProviderKind,
    ReviewGate,
};
pub use validation::{validate_graph, ValidationError};
