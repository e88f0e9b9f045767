//! Node type registry with missing-type fallback
//!
//! The registry decouples "what kinds of nodes exist" from "how the engine
//! drives them". It maps type-name strings to behaviors, and resolves
//! unknown types to a placeholder that reports itself unusable instead of
//! crashing traversal — a graph saved with a node type unavailable in the
//! current build must still load and run as far as possible.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::behavior::{Activation, NodeBehavior, NodeDescriptor, PortValues};
use crate::error::{EngineError, Result};

/// Registry of node types. Immutable after startup; safe to share behind
/// an `Arc` for unsynchronized concurrent reads.
#[derive(Default)]
pub struct NodeRegistry {
    entries: BTreeMap<String, Arc<dyn NodeBehavior>>,
}

impl NodeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a behavior under its descriptor's type key.
    ///
    /// Duplicate registration is a startup-time configuration bug and
    /// fails loudly rather than silently overriding.
    pub fn register(&mut self, behavior: Arc<dyn NodeBehavior>) -> Result<()> {
        let node_type = behavior.descriptor().node_type;
        if self.entries.contains_key(&node_type) {
            return Err(EngineError::DuplicateNodeType(node_type));
        }
        log::debug!("registered node type '{}'", node_type);
        self.entries.insert(node_type, behavior);
        Ok(())
    }

    /// Resolve a type name to its behavior.
    ///
    /// Unknown types resolve to a [`MissingNode`] placeholder whose only
    /// output reports the type as unavailable, so traversal dead-ends at
    /// that node instead of failing the run.
    pub fn resolve(&self, node_type: &str) -> Arc<dyn NodeBehavior> {
        match self.entries.get(node_type) {
            Some(behavior) => Arc::clone(behavior),
            None => {
                log::warn!(
                    "node type '{}' not registered, substituting missing-type fallback",
                    node_type
                );
                Arc::new(MissingNode::new(node_type))
            }
        }
    }

    /// Whether a type is registered.
    pub fn has_node_type(&self, node_type: &str) -> bool {
        self.entries.contains_key(node_type)
    }

    /// Registered type names in sorted order, for the editor's palette.
    pub fn node_types(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Descriptors of all registered types.
    pub fn descriptors(&self) -> Vec<NodeDescriptor> {
        self.entries.values().map(|b| b.descriptor()).collect()
    }

    /// Fold another registry into this one, rejecting overlapping types.
    pub fn merge(&mut self, other: NodeRegistry) -> Result<()> {
        for (_, behavior) in other.entries {
            self.register(behavior)?;
        }
        Ok(())
    }
}

/// Placeholder behavior for node types absent from the registry, e.g.
/// after version skew between the editor that saved a graph and the
/// current build. Declares no ports so traversal naturally stops here.
pub struct MissingNode {
    original_type: String,
}

impl MissingNode {
    pub fn new(original_type: impl Into<String>) -> Self {
        Self {
            original_type: original_type.into(),
        }
    }
}

#[async_trait]
impl NodeBehavior for MissingNode {
    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor::new(
            "missing",
            format!("Missing Node: {}", self.original_type),
            format!(
                "This node type '{}' is no longer available.",
                self.original_type
            ),
        )
    }

    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
        log::warn!(
            "node '{}' (originally of type '{}') is unavailable; reporting error output",
            activation.node_id,
            self.original_type
        );
        Ok(crate::behavior::single_output(
            "error",
            format!(
                "This node (originally of type {}) is no longer available.",
                self.original_type
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::single_output;

    struct EchoNode;

    #[async_trait]
    impl NodeBehavior for EchoNode {
        fn descriptor(&self) -> NodeDescriptor {
            NodeDescriptor::new("echo", "Echo", "Echoes its input")
                .with_inputs(&["input"])
                .with_outputs(&["output"])
        }

        async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
            Ok(single_output("output", activation.input_text("input")))
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = NodeRegistry::new();
        registry.register(Arc::new(EchoNode)).unwrap();

        assert!(registry.has_node_type("echo"));
        assert_eq!(registry.resolve("echo").descriptor().node_type, "echo");
    }

    #[test]
    fn test_duplicate_registration_fails_loudly() {
        let mut registry = NodeRegistry::new();
        registry.register(Arc::new(EchoNode)).unwrap();

        let err = registry.register(Arc::new(EchoNode)).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateNodeType(t) if t == "echo"));
    }

    #[test]
    fn test_unknown_type_resolves_to_fallback() {
        let registry = NodeRegistry::new();
        let behavior = registry.resolve("vanished");

        let desc = behavior.descriptor();
        assert_eq!(desc.node_type, "missing");
        assert!(desc.inputs.is_empty());
        assert!(desc.outputs.is_empty());
        assert!(desc.label.contains("vanished"));
    }

    #[test]
    fn test_node_types_sorted() {
        struct Named(&'static str);

        #[async_trait]
        impl NodeBehavior for Named {
            fn descriptor(&self) -> NodeDescriptor {
                NodeDescriptor::new(self.0, self.0, "")
            }
            async fn process(&self, _activation: &mut Activation<'_>) -> Result<PortValues> {
                Ok(PortValues::new())
            }
        }

        let mut registry = NodeRegistry::new();
        registry.register(Arc::new(Named("zeta"))).unwrap();
        registry.register(Arc::new(Named("alpha"))).unwrap();

        assert_eq!(registry.node_types(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_merge_rejects_overlap() {
        let mut a = NodeRegistry::new();
        a.register(Arc::new(EchoNode)).unwrap();

        let mut b = NodeRegistry::new();
        b.register(Arc::new(EchoNode)).unwrap();

        assert!(a.merge(b).is_err());
    }
}
