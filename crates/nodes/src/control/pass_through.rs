//! Pass-through node
//!
//! Forwards its input unchanged, optionally logging it on the way. Useful
//! as a probe while building a graph.

use async_trait::async_trait;

use xeroflow_engine::behavior::single_output;
use xeroflow_engine::{Activation, NodeBehavior, NodeDescriptor, PortValues, PropertySpec, Result};

/// Identity node with optional logging.
///
/// # Inputs
/// - `input` - Any text
///
/// # Outputs
/// - `output` - The same text
pub struct PassThroughNode;

impl PassThroughNode {
    pub const PORT_INPUT: &'static str = "input";
    pub const PORT_OUTPUT: &'static str = "output";
}

#[async_trait]
impl NodeBehavior for PassThroughNode {
    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor::new("pass-through", "Pass Through", "Forwards input unchanged")
            .with_inputs(&[Self::PORT_INPUT])
            .with_outputs(&[Self::PORT_OUTPUT])
            .with_property("log_content", PropertySpec::boolean(true))
            .with_property("log_prefix", PropertySpec::text(""))
    }

    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
        let input = activation.input_text(Self::PORT_INPUT);

        if activation.properties.flag("log_content") {
            let prefix = activation.properties.text("log_prefix");
            if prefix.is_empty() {
                log::info!("node '{}': {}", activation.node_id, input);
            } else {
                log::info!("node '{}': {} {}", activation.node_id, prefix, input);
            }
        }

        Ok(single_output(Self::PORT_OUTPUT, input))
    }
}
