//! XeroFlow built-in nodes
//!
//! Node behaviors shipped with the engine. Each node is an atomic
//! building block; graphs compose them through port-to-port connections.
//!
//! # Categories
//!
//! - **Input**: entry points taking the run's external input
//! - **Processing**: LLM-backed text transformation
//! - **Control**: routing, fan-out, and recombination
//! - **Stateful**: loop accumulators carrying run-local state
//! - **Output**: terminal nodes delivering the final value

use std::sync::Arc;

use xeroflow_engine::{NodeRegistry, Result};

pub mod control;
pub mod input;
pub mod output;
pub mod processing;
pub mod stateful;

pub use control::{ConditionalRouterNode, MergerNode, PassThroughNode, SplitterNode};
pub use input::StartNode;
pub use output::FinishNode;
pub use processing::PromptNode;
pub use stateful::{AccumulateOutputNode, AccumulatorNode};

/// Registry pre-loaded with every built-in node type.
pub fn builtin_registry() -> Result<NodeRegistry> {
    let mut registry = NodeRegistry::new();
    registry.register(Arc::new(StartNode))?;
    registry.register(Arc::new(PromptNode))?;
    registry.register(Arc::new(FinishNode))?;
    registry.register(Arc::new(ConditionalRouterNode))?;
    registry.register(Arc::new(SplitterNode))?;
    registry.register(Arc::new(MergerNode))?;
    registry.register(Arc::new(PassThroughNode))?;
    registry.register(Arc::new(AccumulatorNode))?;
    registry.register(Arc::new(AccumulateOutputNode))?;
    Ok(registry)
}
