//! Accumulator node
//!
//! Collects the responses flowing around a loop. On every activation
//! before the iteration target it re-emits the stored seed (keeping the
//! loop running); once the target is reached it emits the accumulated
//! responses and marks itself terminal for the rest of the run.
//!
//! State lives in run-local properties: `initial_input` holds the seed,
//! `accumulated_data` the responses collected so far, `iteration_count`
//! the number of activations. The seed is stored, not counted as an
//! accumulated response.

use async_trait::async_trait;

use xeroflow_engine::behavior::single_output;
use xeroflow_engine::graph::PROP_IS_END_NODE;
use xeroflow_engine::{
    Activation, NodeBehavior, NodeDescriptor, PortValues, PropertyBag, PropertySpec, Result,
};

pub(crate) const PROP_ITERATIONS: &str = "iterations";
pub(crate) const PROP_INITIAL_INPUT: &str = "initial_input";
pub(crate) const PROP_ACCUMULATED_DATA: &str = "accumulated_data";
pub(crate) const PROP_ITERATION_COUNT: &str = "iteration_count";

/// Outcome of one loop activation.
pub(crate) enum LoopStep {
    /// Below the target: emit this value to keep the loop running
    Continue(String),
    /// Target reached: the full accumulation
    Finished(String),
}

/// Advance the loop state carried in `properties` by one activation.
///
/// The first activation stores `input` as the seed and does not
/// accumulate it; later activations append `input` to the accumulation.
/// With `append_on_continue`, intermediate emissions carry the seed plus
/// everything accumulated so far instead of the bare seed.
pub(crate) fn advance_loop(
    properties: &mut PropertyBag,
    input: &str,
    append_on_continue: bool,
) -> LoopStep {
    let target = (properties.number(PROP_ITERATIONS).unwrap_or(3.0).max(1.0)) as u32;
    let count = properties.number(PROP_ITERATION_COUNT).unwrap_or(0.0) as u32;

    let mut seed = properties.text(PROP_INITIAL_INPUT);
    let mut accumulated = properties.text(PROP_ACCUMULATED_DATA);

    if count == 0 {
        seed = input.to_string();
        properties.set_text(PROP_INITIAL_INPUT, &seed);
    } else if !input.is_empty() {
        if !accumulated.is_empty() {
            accumulated.push_str("\n\n");
        }
        accumulated.push_str(input);
        properties.set_text(PROP_ACCUMULATED_DATA, &accumulated);
    }

    let count = count + 1;
    properties.set_number(PROP_ITERATION_COUNT, count as f64);

    if count >= target {
        // A target of 1 finishes before anything was accumulated; fall
        // back to the seed so the run still has a value.
        if accumulated.is_empty() {
            LoopStep::Finished(seed)
        } else {
            LoopStep::Finished(accumulated)
        }
    } else if append_on_continue && !accumulated.is_empty() {
        LoopStep::Continue(format!("{}\n\n{}", seed, accumulated))
    } else {
        LoopStep::Continue(seed)
    }
}

/// Clear the loop state back to defaults.
pub(crate) fn reset_loop(properties: &mut PropertyBag) {
    properties.set_text(PROP_INITIAL_INPUT, "");
    properties.set_text(PROP_ACCUMULATED_DATA, "");
    properties.set_number(PROP_ITERATION_COUNT, 0.0);
}

pub(crate) fn loop_properties(desc: NodeDescriptor) -> NodeDescriptor {
    desc.with_property(PROP_ITERATIONS, PropertySpec::number(3.0))
        .with_property("append_accumulated_data", PropertySpec::boolean(false))
        .with_property(PROP_INITIAL_INPUT, PropertySpec::text(""))
        .with_property(PROP_ACCUMULATED_DATA, PropertySpec::multiline(""))
        .with_property(PROP_ITERATION_COUNT, PropertySpec::number(0.0))
}

/// Loop accumulator with a single output port.
///
/// The seed arrives on `input`, loop responses on `loopback`. Separate
/// ports keep loop graphs clear of the fan-in rule, which rejects two
/// connections into one input port.
///
/// # Inputs
/// - `input` - Seed for the first activation
/// - `loopback` - Responses coming back around the loop
///
/// # Outputs
/// - `output` - Seed (or seed plus accumulation) while looping; the full
///   accumulation on the final activation
pub struct AccumulatorNode;

impl AccumulatorNode {
    pub const PORT_INPUT: &'static str = "input";
    pub const PORT_LOOPBACK: &'static str = "loopback";
    pub const PORT_OUTPUT: &'static str = "output";
}

/// The value a loop activation should consume: the seed port when it
/// carries data, the loopback port otherwise.
pub(crate) fn loop_input(activation: &Activation<'_>) -> String {
    let seed = activation.input_text(AccumulatorNode::PORT_INPUT);
    if seed.is_empty() {
        activation.input_text(AccumulatorNode::PORT_LOOPBACK)
    } else {
        seed
    }
}

#[async_trait]
impl NodeBehavior for AccumulatorNode {
    fn descriptor(&self) -> NodeDescriptor {
        loop_properties(
            NodeDescriptor::new(
                "accumulator",
                "Accumulator",
                "Collects loop responses until an iteration target",
            )
            .with_inputs(&[Self::PORT_INPUT, Self::PORT_LOOPBACK])
            .with_outputs(&[Self::PORT_OUTPUT]),
        )
    }

    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
        let input = loop_input(activation);
        let append = activation.properties.flag("append_accumulated_data");

        match advance_loop(activation.properties, &input, append) {
            LoopStep::Continue(value) => {
                // In a loop graph this node carries the graph's static
                // end marker; it is only actually terminal on the
                // activation that reaches the target.
                activation.properties.set_flag(PROP_IS_END_NODE, false);
                Ok(single_output(Self::PORT_OUTPUT, value))
            }
            LoopStep::Finished(accumulated) => {
                log::debug!(
                    "node '{}': iteration target reached, emitting accumulation",
                    activation.node_id
                );
                reset_loop(activation.properties);
                activation.mark_end_node();
                Ok(single_output(Self::PORT_OUTPUT, accumulated))
            }
        }
    }
}
