//! Merger node
//!
//! Fan-in point: joins the values arriving on its two input ports with a
//! configurable separator. Branches that never ran contribute nothing and
//! no dangling separator is emitted.

use async_trait::async_trait;

use xeroflow_engine::behavior::single_output;
use xeroflow_engine::{Activation, NodeBehavior, NodeDescriptor, PortValues, PropertySpec, Result};

/// Joins two inputs into one text value.
///
/// # Inputs
/// - `input1`, `input2` - Texts to join, in port order
///
/// # Outputs
/// - `output` - The joined text
pub struct MergerNode;

impl MergerNode {
    pub const PORT_INPUT1: &'static str = "input1";
    pub const PORT_INPUT2: &'static str = "input2";
    pub const PORT_OUTPUT: &'static str = "output";
}

#[async_trait]
impl NodeBehavior for MergerNode {
    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor::new("merger", "Merger", "Joins two inputs with a separator")
            .with_inputs(&[Self::PORT_INPUT1, Self::PORT_INPUT2])
            .with_outputs(&[Self::PORT_OUTPUT])
            .with_property("separator", PropertySpec::text("\n\n"))
    }

    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
        let separator = activation.properties.text("separator");
        let parts = [
            activation.input_text(Self::PORT_INPUT1),
            activation.input_text(Self::PORT_INPUT2),
        ];

        let joined = parts
            .iter()
            .filter(|p| !p.is_empty())
            .cloned()
            .collect::<Vec<String>>()
            .join(&separator);

        Ok(single_output(Self::PORT_OUTPUT, joined))
    }
}
