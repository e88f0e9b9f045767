//! Graph model for node workflows
//!
//! These types define the static, serializable structure of a workflow
//! graph: configured nodes and the connections between their ports. The
//! engine loads a graph read-only at run start; only the external editor
//! mutates it between runs.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::properties::PropertyBag;

/// Unique identifier for a node within one graph.
pub type NodeId = String;

/// Property name that marks the entry node of a graph.
pub const PROP_IS_START_NODE: &str = "is_start_node";

/// Property name that marks a terminal node. Stateful nodes may flip this
/// in their run-local state to end a run early.
pub const PROP_IS_END_NODE: &str = "is_end_node";

/// One configured node instance in a graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// Unique identifier, stable for the graph's lifetime
    pub id: NodeId,
    /// Type key into the node registry
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display label, no execution semantics
    #[serde(default)]
    pub title: String,
    /// Configured properties, merged with type defaults at run time
    #[serde(default)]
    pub properties: PropertyBag,
}

impl GraphNode {
    /// Create a node with empty properties.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            title: String::new(),
            properties: PropertyBag::new(),
        }
    }

    /// Builder-style property assignment.
    pub fn with_properties(mut self, properties: PropertyBag) -> Self {
        self.properties = properties;
        self
    }

    /// Whether this node is marked as the graph's entry point.
    pub fn is_start(&self) -> bool {
        self.properties.flag(PROP_IS_START_NODE)
    }

    /// Whether this node is statically marked terminal.
    pub fn is_end(&self) -> bool {
        self.properties.flag(PROP_IS_END_NODE)
    }
}

/// A directed edge from one node's output port to another node's input port.
///
/// Immutable once a graph is finalized for a run. Multiple connections may
/// share a source port (fan-out); sharing a target port is rejected by
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from_node: NodeId,
    pub from_output: String,
    pub to_node: NodeId,
    pub to_input: String,
}

impl Connection {
    pub fn new(
        from_node: impl Into<String>,
        from_output: impl Into<String>,
        to_node: impl Into<String>,
        to_input: impl Into<String>,
    ) -> Self {
        Self {
            from_node: from_node.into(),
            from_output: from_output.into(),
            to_node: to_node.into(),
            to_input: to_input.into(),
        }
    }
}

/// A complete workflow graph: nodes keyed by id plus a connection list.
///
/// The persisted JSON form matches this structure directly: a root object
/// with `nodes` keyed by node id and `connections` as a list of
/// `{from_node, from_output, to_node, to_input}` records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeGraph {
    pub nodes: HashMap<NodeId, GraphNode>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl NodeGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, keyed by its id.
    pub fn add_node(&mut self, node: GraphNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Add a connection.
    pub fn connect(
        &mut self,
        from_node: impl Into<String>,
        from_output: impl Into<String>,
        to_node: impl Into<String>,
        to_input: impl Into<String>,
    ) {
        self.connections
            .push(Connection::new(from_node, from_output, to_node, to_input));
    }

    /// Find a node by id.
    pub fn find_node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    /// All nodes marked as start nodes.
    pub fn start_nodes(&self) -> Vec<&GraphNode> {
        let mut nodes: Vec<&GraphNode> = self.nodes.values().filter(|n| n.is_start()).collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// All nodes statically marked as end nodes.
    pub fn end_nodes(&self) -> Vec<&GraphNode> {
        self.nodes.values().filter(|n| n.is_end()).collect()
    }

    /// Connections leaving a given node.
    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.from_node == node_id)
    }

    /// Connections entering a given node.
    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.to_node == node_id)
    }

    /// Connections leaving a specific output port of a node.
    pub fn connections_from_port<'a>(
        &'a self,
        node_id: &'a str,
        output: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.from_node == node_id && c.from_output == output)
    }

    /// Deserialize a graph from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the graph to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a graph from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Save the graph to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertySpec;

    fn start_node(id: &str) -> GraphNode {
        let mut node = GraphNode::new(id, "start");
        node.properties
            .insert(PROP_IS_START_NODE, PropertySpec::boolean(true));
        node
    }

    #[test]
    fn test_start_and_end_markers() {
        let mut graph = NodeGraph::new();
        graph.add_node(start_node("a"));

        let mut end = GraphNode::new("b", "finish");
        end.properties
            .insert(PROP_IS_END_NODE, PropertySpec::boolean(true));
        graph.add_node(end);

        assert_eq!(graph.start_nodes().len(), 1);
        assert_eq!(graph.end_nodes().len(), 1);
        assert_eq!(graph.start_nodes()[0].id, "a");
    }

    #[test]
    fn test_port_connection_lookup() {
        let mut graph = NodeGraph::new();
        graph.add_node(GraphNode::new("a", "splitter"));
        graph.add_node(GraphNode::new("b", "prompt"));
        graph.add_node(GraphNode::new("c", "prompt"));
        graph.connect("a", "output1", "b", "input");
        graph.connect("a", "output2", "c", "input");

        let from_o1: Vec<_> = graph.connections_from_port("a", "output1").collect();
        assert_eq!(from_o1.len(), 1);
        assert_eq!(from_o1[0].to_node, "b");

        assert_eq!(graph.outgoing("a").count(), 2);
        assert_eq!(graph.incoming("c").count(), 1);
    }

    #[test]
    fn test_json_round_trip() {
        let mut graph = NodeGraph::new();
        graph.add_node(start_node("start-1"));
        graph.add_node(GraphNode::new("p-1", "prompt"));
        graph.connect("start-1", "prompt", "p-1", "input");

        let json = graph.to_json().unwrap();
        let back = NodeGraph::from_json(&json).unwrap();
        assert_eq!(back.nodes.len(), 2);
        assert_eq!(back.connections, graph.connections);
        assert!(back.find_node("start-1").unwrap().is_start());
    }

    #[test]
    fn test_persisted_shape_is_stable() {
        // Graphs saved by earlier builds use `type` for the registry key.
        let json = r#"{
            "nodes": {
                "n1": {
                    "id": "n1",
                    "type": "pass-through",
                    "title": "Debug tap",
                    "properties": {}
                }
            },
            "connections": [
                {"from_node": "n1", "from_output": "output", "to_node": "n1", "to_input": "input"}
            ]
        }"#;

        let graph = NodeGraph::from_json(json).unwrap();
        assert_eq!(graph.find_node("n1").unwrap().node_type, "pass-through");
        assert_eq!(graph.connections[0].to_input, "input");
    }

    #[test]
    fn test_save_and_load_file() {
        let mut graph = NodeGraph::new();
        graph.add_node(start_node("a"));
        graph.add_node(GraphNode::new("b", "finish"));
        graph.connect("a", "prompt", "b", "input");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflow.json");
        graph.save(&path).unwrap();

        let back = NodeGraph::load(&path).unwrap();
        assert_eq!(back.nodes.len(), 2);
        assert_eq!(back.connections.len(), 1);
    }
}
