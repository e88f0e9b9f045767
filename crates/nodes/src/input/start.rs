//! Start node
//!
//! Default entry point of a workflow. Takes the run's external input,
//! prepends the configured prompt, and hands the result to the selected
//! LLM interface.

use async_trait::async_trait;

use xeroflow_engine::behavior::single_output;
use xeroflow_engine::graph::PROP_IS_START_NODE;
use xeroflow_engine::{Activation, NodeBehavior, NodeDescriptor, PortValues, PropertySpec, Result};

use crate::processing::{compose_prompt, invoke_interface};

/// Workflow entry node.
///
/// # Inputs
/// - `input` - The run's external input text
///
/// # Outputs
/// - `prompt` - The interface's response to the composed prompt
pub struct StartNode;

impl StartNode {
    pub const PORT_INPUT: &'static str = "input";
    pub const PORT_PROMPT: &'static str = "prompt";
}

#[async_trait]
impl NodeBehavior for StartNode {
    fn descriptor(&self) -> NodeDescriptor {
        let mut desc = NodeDescriptor::new(
            "start",
            "Start",
            "Entry point: sends the run input through an LLM interface",
        )
        .with_inputs(&[Self::PORT_INPUT])
        .with_outputs(&[Self::PORT_PROMPT])
        .with_property("prompt", PropertySpec::multiline(""))
        .with_property("interface", PropertySpec::choice("", Vec::new()));
        desc.properties
            .insert(PROP_IS_START_NODE, PropertySpec::boolean(true));
        desc
    }

    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
        let incoming = activation.input_text(Self::PORT_INPUT);
        let configured = activation.properties.text("prompt");
        let prompt = compose_prompt(&configured, &incoming);

        let response = invoke_interface(activation, &prompt).await;
        Ok(single_output(Self::PORT_PROMPT, response))
    }
}
