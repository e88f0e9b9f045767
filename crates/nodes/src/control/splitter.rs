//! Splitter node
//!
//! Fan-out: copies its input to between one and four output ports so
//! several branches can work on the same value.

use async_trait::async_trait;

use xeroflow_engine::{Activation, NodeBehavior, NodeDescriptor, PortValues, PropertySpec, Result};

const MAX_OUTPUTS: usize = 4;

/// Copies input to `output1`..`outputN`.
///
/// # Inputs
/// - `input` - Value to duplicate
///
/// # Outputs
/// - `output1`..`output4` - Copies of the input; ports past the
///   configured count stay empty
pub struct SplitterNode;

impl SplitterNode {
    pub const PORT_INPUT: &'static str = "input";

    fn output_count(properties: &xeroflow_engine::PropertyBag) -> usize {
        let configured = properties.number("output_count").unwrap_or(2.0) as usize;
        configured.clamp(1, MAX_OUTPUTS)
    }
}

#[async_trait]
impl NodeBehavior for SplitterNode {
    fn descriptor(&self) -> NodeDescriptor {
        let outputs: Vec<String> = (1..=MAX_OUTPUTS).map(|i| format!("output{}", i)).collect();
        let output_refs: Vec<&str> = outputs.iter().map(String::as_str).collect();
        NodeDescriptor::new("splitter", "Splitter", "Copies input to several outputs")
            .with_inputs(&[Self::PORT_INPUT])
            .with_outputs(&output_refs)
            .with_property("output_count", PropertySpec::number(2.0))
    }

    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
        let input = activation.input_text(Self::PORT_INPUT);
        let count = Self::output_count(activation.properties);

        let mut outputs = PortValues::new();
        for i in 1..=MAX_OUTPUTS {
            let value = if i <= count { input.clone() } else { String::new() };
            outputs.insert(format!("output{}", i), value.into());
        }
        Ok(outputs)
    }
}
