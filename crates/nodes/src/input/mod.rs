//! Input nodes
//!
//! Entry points of a workflow: nodes that take the run's external input.

mod start;

pub use start::StartNode;
