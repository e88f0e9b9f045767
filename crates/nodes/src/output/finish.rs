//! Finish node
//!
//! Marks the end of a workflow and hands its input back as the run's
//! final output.

use async_trait::async_trait;

use xeroflow_engine::behavior::single_output;
use xeroflow_engine::engine::PORT_FINAL_OUTPUT;
use xeroflow_engine::graph::PROP_IS_END_NODE;
use xeroflow_engine::{Activation, NodeBehavior, NodeDescriptor, PortValues, PropertySpec, Result};

/// Workflow exit node.
///
/// # Inputs
/// - `input` - The value to return from the run
///
/// # Outputs
/// - `final_output` - Same value, recognized by the engine as the run's
///   result
pub struct FinishNode;

impl FinishNode {
    pub const PORT_INPUT: &'static str = "input";
}

#[async_trait]
impl NodeBehavior for FinishNode {
    fn descriptor(&self) -> NodeDescriptor {
        let mut desc = NodeDescriptor::new("finish", "Finish", "Ends the run with its input")
            .with_inputs(&[Self::PORT_INPUT])
            .with_outputs(&[PORT_FINAL_OUTPUT]);
        desc.properties
            .insert(PROP_IS_END_NODE, PropertySpec::boolean(true));
        desc
    }

    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
        Ok(single_output(
            PORT_FINAL_OUTPUT,
            activation.input_text(Self::PORT_INPUT),
        ))
    }
}
