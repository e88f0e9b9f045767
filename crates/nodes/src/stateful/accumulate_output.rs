//! Accumulate-output node
//!
//! Same loop accumulation as [`AccumulatorNode`], but the terminal
//! emission goes through the host's review gate and leaves on a second
//! output port, so a graph can wire the loop and the final delivery to
//! different places. A rejected review clears the loop state and emits
//! nothing, ending the run as a dead end.
//!
//! [`AccumulatorNode`]: crate::stateful::AccumulatorNode

use async_trait::async_trait;

use xeroflow_engine::behavior::single_output;
use xeroflow_engine::graph::PROP_IS_END_NODE;
use xeroflow_engine::{Activation, NodeBehavior, NodeDescriptor, PortValues, Result};

use super::accumulator::{advance_loop, loop_input, loop_properties, reset_loop, LoopStep};

/// Reviewed loop accumulator with separate loop and delivery ports.
///
/// # Inputs
/// - `input` - Seed for the first activation
/// - `loopback` - Responses coming back around the loop
///
/// # Outputs
/// - `output` - Loop continuation value while below the target
/// - `output2` - The reviewed accumulation on the final activation
pub struct AccumulateOutputNode;

impl AccumulateOutputNode {
    pub const PORT_INPUT: &'static str = "input";
    pub const PORT_LOOPBACK: &'static str = "loopback";
    pub const PORT_OUTPUT: &'static str = "output";
    pub const PORT_OUTPUT2: &'static str = "output2";
}

#[async_trait]
impl NodeBehavior for AccumulateOutputNode {
    fn descriptor(&self) -> NodeDescriptor {
        loop_properties(
            NodeDescriptor::new(
                "accumulate-output",
                "Accumulate Output",
                "Loop accumulator with reviewed final delivery",
            )
            .with_inputs(&[Self::PORT_INPUT, Self::PORT_LOOPBACK])
            .with_outputs(&[Self::PORT_OUTPUT, Self::PORT_OUTPUT2]),
        )
    }

    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
        let input = loop_input(activation);
        let append = activation.properties.flag("append_accumulated_data");

        match advance_loop(activation.properties, &input, append) {
            LoopStep::Continue(value) => {
                // Not terminal until the target is reached, even when the
                // graph carries its static end marker on this node.
                activation.properties.set_flag(PROP_IS_END_NODE, false);
                Ok(single_output(Self::PORT_OUTPUT, value))
            }
            LoopStep::Finished(accumulated) => {
                activation.properties.set_flag(PROP_IS_END_NODE, false);
                let approved = activation
                    .services
                    .review
                    .confirm(activation.node_id, &accumulated)
                    .await;
                reset_loop(activation.properties);

                if approved {
                    activation.mark_end_node();
                    Ok(single_output(Self::PORT_OUTPUT2, accumulated))
                } else {
                    log::info!(
                        "node '{}': accumulation rejected by reviewer, discarding",
                        activation.node_id
                    );
                    Ok(PortValues::new())
                }
            }
        }
    }
}
