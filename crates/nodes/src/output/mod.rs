//! Output nodes
//!
//! Terminal nodes that deliver a run's final value.

mod finish;

pub use finish::FinishNode;
