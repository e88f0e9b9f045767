//! Prompt node
//!
//! The workhorse processing node: combines its configured prompt with the
//! incoming text and sends the result through the selected LLM interface.

use async_trait::async_trait;

use xeroflow_engine::behavior::single_output;
use xeroflow_engine::{Activation, NodeBehavior, NodeDescriptor, PortValues, PropertySpec, Result};

/// Send `prompt` through the LLM interface named in the node's
/// `interface` property.
///
/// Shared by every LLM-backed node. Provider errors do not abort the run;
/// they come back as an `API Error:` string the graph can route like any
/// other text. With no interface selected the prompt passes through
/// unchanged, which keeps graphs runnable before providers are
/// configured.
pub async fn invoke_interface(activation: &Activation<'_>, prompt: &str) -> String {
    let interface = activation.properties.text("interface");
    if interface.is_empty() {
        return prompt.to_string();
    }

    match activation.services.config.interface(&interface) {
        Some(provider) => {
            log::debug!(
                "node '{}': invoking interface '{}' (model '{}')",
                activation.node_id,
                interface,
                provider.model
            );
            let response = activation.services.llm.invoke(provider, prompt).await;
            if response.success {
                response.content
            } else {
                log::warn!(
                    "node '{}': interface '{}' failed: {}",
                    activation.node_id,
                    interface,
                    response.error
                );
                format!("API Error: {}", response.error)
            }
        }
        None => format!("API Error: unknown interface '{}'", interface),
    }
}

/// Combine the node's configured prompt with incoming text.
/// Non-empty parts are joined with a blank line, prompt first.
pub(crate) fn compose_prompt(configured: &str, incoming: &str) -> String {
    match (configured.is_empty(), incoming.is_empty()) {
        (false, false) => format!("{}\n\n{}", configured, incoming),
        (false, true) => configured.to_string(),
        (true, _) => incoming.to_string(),
    }
}

/// LLM prompt node.
///
/// # Inputs
/// - `input` - Text to append to the configured prompt
///
/// # Outputs
/// - `output` - The interface's response (or an `API Error:` string)
pub struct PromptNode;

impl PromptNode {
    pub const PORT_INPUT: &'static str = "input";
    pub const PORT_OUTPUT: &'static str = "output";
}

#[async_trait]
impl NodeBehavior for PromptNode {
    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor::new(
            "prompt",
            "Prompt",
            "Processes input through an LLM interface",
        )
        .with_inputs(&[Self::PORT_INPUT])
        .with_outputs(&[Self::PORT_OUTPUT])
        .with_property("prompt", PropertySpec::multiline(""))
        .with_property("interface", PropertySpec::choice("", Vec::new()))
    }

    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
        let incoming = activation.input_text(Self::PORT_INPUT);
        let configured = activation.properties.text("prompt");
        let prompt = compose_prompt(&configured, &incoming);

        let response = invoke_interface(activation, &prompt).await;
        Ok(single_output(Self::PORT_OUTPUT, response))
    }
}
