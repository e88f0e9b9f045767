//! Control nodes
//!
//! Nodes for routing, branching, and recombining text between branches.

mod conditional_router;
mod merger;
mod pass_through;
mod splitter;

pub use conditional_router::ConditionalRouterNode;
pub use merger::MergerNode;
pub use pass_through::PassThroughNode;
pub use splitter::SplitterNode;
