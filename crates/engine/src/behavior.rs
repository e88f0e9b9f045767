//! Node behavior contract
//!
//! Every node type implements [`NodeBehavior`]: it declares its ports and
//! default properties through a descriptor, and performs one execution step
//! in `process`. Which output ports a node populates is how it steers
//! traversal — branching, fan-out, and dead ends all fall out of that one
//! mechanism.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::graph::{NodeId, PROP_IS_END_NODE, PROP_IS_START_NODE};
use crate::properties::{PropertyBag, PropertySpec};
use crate::services::NodeServices;

/// Values flowing through ports during one activation, keyed by port name.
pub type PortValues = HashMap<String, Value>;

/// Static description of a node type: identity, ports, default properties.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    /// Unique type key (e.g. "conditional-router")
    pub node_type: String,
    /// Human-readable label for the editor palette
    pub label: String,
    /// What the node does
    pub description: String,
    /// Declared input port names, fixed for the type
    pub inputs: Vec<String>,
    /// Declared output port names, fixed for the type
    pub outputs: Vec<String>,
    /// Default properties merged into each instance's bag at run time
    pub properties: PropertyBag,
}

impl NodeDescriptor {
    /// Create a descriptor with the baseline properties every node carries.
    pub fn new(
        node_type: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let description = description.into();
        Self {
            node_type: node_type.into(),
            label: label.into(),
            description: description.clone(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            properties: default_properties(&description),
        }
    }

    pub fn with_inputs(mut self, inputs: &[&str]) -> Self {
        self.inputs = inputs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_outputs(mut self, outputs: &[&str]) -> Self {
        self.outputs = outputs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, spec: PropertySpec) -> Self {
        self.properties.insert(name, spec);
        self
    }
}

/// Baseline property bag every node type starts from: a description and
/// the start/end role markers the engine reads during traversal.
pub fn default_properties(description: &str) -> PropertyBag {
    PropertyBag::new()
        .with("description", PropertySpec::text(description))
        .with(PROP_IS_START_NODE, PropertySpec::boolean(false))
        .with(PROP_IS_END_NODE, PropertySpec::boolean(false))
}

/// One invocation of a node during a run.
///
/// Holds the input bundle, the node's run-local property state (the only
/// storage that survives across re-activations of the same node id within
/// a run), and the external collaborators.
pub struct Activation<'a> {
    /// Id of the node being activated
    pub node_id: &'a NodeId,
    /// Values bound to the node's input ports for this activation
    pub inputs: &'a PortValues,
    /// Run-local property state; stateful nodes mutate this
    pub properties: &'a mut PropertyBag,
    /// External collaborators (LLM client, review gate, config)
    pub services: &'a NodeServices,
}

impl Activation<'_> {
    /// Text content of an input port.
    ///
    /// Arrays are joined with blank lines so downstream nodes always see a
    /// single string; absent ports yield the empty string.
    pub fn input_text(&self, port: &str) -> String {
        match self.inputs.get(port) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Mark this node terminal for the rest of the run.
    ///
    /// Used by stateful nodes once their final iteration completes.
    pub fn mark_end_node(&mut self) {
        self.properties.set_flag(PROP_IS_END_NODE, true);
    }
}

/// The contract every node type implements.
#[async_trait]
pub trait NodeBehavior: Send + Sync {
    /// Static metadata: type key, ports, default properties.
    fn descriptor(&self) -> NodeDescriptor;

    /// Perform one execution step.
    ///
    /// Returns the subset of declared output ports this activation
    /// populated. An empty map is legal and means "no forward progress
    /// from here". Recoverable conditions (a failed provider call, say)
    /// belong on the node's own ports; `Err` aborts the whole run.
    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues>;
}

/// Build a single-port output map. Most nodes emit exactly one value.
pub fn single_output(port: &str, value: impl Into<Value>) -> PortValues {
    let mut outputs = PortValues::new();
    outputs.insert(port.to_string(), value.into());
    outputs
}
