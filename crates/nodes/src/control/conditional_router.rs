//! Conditional router node
//!
//! Branching by content inspection: the input text lands on `match` when
//! it contains the configured search string, on `no_match` otherwise. The
//! unchosen port stays empty, so only one branch runs.

use async_trait::async_trait;

use xeroflow_engine::{Activation, NodeBehavior, NodeDescriptor, PortValues, PropertySpec, Result};

/// Routes text to one of two outputs by substring search.
///
/// # Inputs
/// - `input` - Text to inspect and forward
///
/// # Outputs
/// - `match` - Input when the search string was found
/// - `no_match` - Input otherwise
pub struct ConditionalRouterNode;

impl ConditionalRouterNode {
    pub const PORT_INPUT: &'static str = "input";
    pub const PORT_MATCH: &'static str = "match";
    pub const PORT_NO_MATCH: &'static str = "no_match";
}

#[async_trait]
impl NodeBehavior for ConditionalRouterNode {
    fn descriptor(&self) -> NodeDescriptor {
        NodeDescriptor::new(
            "conditional-router",
            "Conditional Router",
            "Routes input by substring match",
        )
        .with_inputs(&[Self::PORT_INPUT])
        .with_outputs(&[Self::PORT_MATCH, Self::PORT_NO_MATCH])
        .with_property("search_string", PropertySpec::text(""))
        .with_property("case_sensitive", PropertySpec::boolean(false))
    }

    async fn process(&self, activation: &mut Activation<'_>) -> Result<PortValues> {
        let input = activation.input_text(Self::PORT_INPUT);
        let search = activation.properties.text("search_string");
        let case_sensitive = activation.properties.flag("case_sensitive");

        let matched = if search.is_empty() {
            // Nothing to search for: treat as a match so the common
            // branch runs.
            true
        } else if case_sensitive {
            input.contains(&search)
        } else {
            input.to_lowercase().contains(&search.to_lowercase())
        };

        log::debug!(
            "node '{}': search '{}' {} in input",
            activation.node_id,
            search,
            if matched { "found" } else { "not found" }
        );

        let mut outputs = PortValues::new();
        if matched {
            outputs.insert(Self::PORT_MATCH.to_string(), input.into());
            outputs.insert(Self::PORT_NO_MATCH.to_string(), String::new().into());
        } else {
            outputs.insert(Self::PORT_MATCH.to_string(), String::new().into());
            outputs.insert(Self::PORT_NO_MATCH.to_string(), input.into());
        }
        Ok(outputs)
    }
}
