//! Processing nodes
//!
//! Nodes that transform text, typically through an LLM interface.

mod prompt;

pub use prompt::{invoke_interface, PromptNode};
pub(crate) use prompt::compose_prompt;
