//! Stateful nodes
//!
//! Nodes that re-activate across loop iterations, carrying their state in
//! run-local properties. The engine clones every node's property bag at
//! the start of a run, so this state never leaks into the stored graph or
//! into other runs.

mod accumulate_output;
mod accumulator;

pub use accumulate_output::AccumulateOutputNode;
pub use accumulator::AccumulatorNode;
