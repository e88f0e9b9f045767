//! Typed property bags for graph nodes
//!
//! Every node carries a bag of named properties. A property has a declared
//! kind, a default supplied by the node type, and an optional current value
//! set by the editor before a run or by a stateful node during a run.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The kind of a property, driving how the editor renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Single-line text
    Text,
    /// Multi-line text (prompts, templates)
    MultilineText,
    /// Numeric value
    Number,
    /// Boolean flag
    Boolean,
    /// One choice out of a fixed set
    Choice,
}

/// A concrete property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Choice(String),
}

impl PropertyValue {
    /// Text content, if this is a text or choice value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) | PropertyValue::Choice(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean content, if this is a flag.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Declaration of a single property: its kind, type-supplied default,
/// and the current value (if the editor or a stateful node set one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpec {
    /// Property kind
    pub kind: PropertyKind,
    /// Default supplied by the node type
    pub default: PropertyValue,
    /// Current value, overriding the default when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PropertyValue>,
    /// Allowed values for `Choice` properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl PropertySpec {
    /// Create a text property.
    pub fn text(default: impl Into<String>) -> Self {
        Self {
            kind: PropertyKind::Text,
            default: PropertyValue::Text(default.into()),
            value: None,
            options: Vec::new(),
        }
    }

    /// Create a multi-line text property.
    pub fn multiline(default: impl Into<String>) -> Self {
        Self {
            kind: PropertyKind::MultilineText,
            default: PropertyValue::Text(default.into()),
            value: None,
            options: Vec::new(),
        }
    }

    /// Create a numeric property.
    pub fn number(default: f64) -> Self {
        Self {
            kind: PropertyKind::Number,
            default: PropertyValue::Number(default),
            value: None,
            options: Vec::new(),
        }
    }

    /// Create a boolean property.
    pub fn boolean(default: bool) -> Self {
        Self {
            kind: PropertyKind::Boolean,
            default: PropertyValue::Bool(default),
            value: None,
            options: Vec::new(),
        }
    }

    /// Create a single-choice property.
    pub fn choice(default: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            kind: PropertyKind::Choice,
            default: PropertyValue::Choice(default.into()),
            value: None,
            options,
        }
    }

    /// The value in effect: the current value if set, otherwise the default.
    pub fn effective(&self) -> &PropertyValue {
        self.value.as_ref().unwrap_or(&self.default)
    }
}

/// A named collection of property specs.
///
/// `BTreeMap` keeps iteration order stable so that serialized graphs and
/// debug output are deterministic across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag {
    specs: BTreeMap<String, PropertySpec>,
}

impl PropertyBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property spec.
    pub fn insert(&mut self, name: impl Into<String>, spec: PropertySpec) {
        self.specs.insert(name.into(), spec);
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, spec: PropertySpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Look up a property spec.
    pub fn get(&self, name: &str) -> Option<&PropertySpec> {
        self.specs.get(name)
    }

    /// Whether the bag declares a property.
    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Effective text content of a property, empty string when absent.
    pub fn text(&self, name: &str) -> String {
        self.specs
            .get(name)
            .and_then(|s| s.effective().as_text())
            .unwrap_or_default()
            .to_string()
    }

    /// Effective numeric content of a property.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.specs.get(name).and_then(|s| s.effective().as_number())
    }

    /// Effective boolean content of a property, false when absent.
    pub fn flag(&self, name: &str) -> bool {
        self.specs
            .get(name)
            .and_then(|s| s.effective().as_bool())
            .unwrap_or(false)
    }

    /// Set the current value of a property, declaring it if needed.
    ///
    /// Used by stateful nodes to carry data across activations within a run.
    pub fn set(&mut self, name: impl Into<String>, value: PropertyValue) {
        let name = name.into();
        match self.specs.get_mut(&name) {
            Some(spec) => spec.value = Some(value),
            None => {
                let spec = PropertySpec {
                    kind: match &value {
                        PropertyValue::Text(_) => PropertyKind::Text,
                        PropertyValue::Number(_) => PropertyKind::Number,
                        PropertyValue::Bool(_) => PropertyKind::Boolean,
                        PropertyValue::Choice(_) => PropertyKind::Choice,
                    },
                    default: value.clone(),
                    value: Some(value),
                    options: Vec::new(),
                };
                self.specs.insert(name, spec);
            }
        }
    }

    /// Convenience setters used by stateful nodes.
    pub fn set_text(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.set(name, PropertyValue::Text(value.into()));
    }

    pub fn set_number(&mut self, name: impl Into<String>, value: f64) {
        self.set(name, PropertyValue::Number(value));
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.set(name, PropertyValue::Bool(value));
    }

    /// Add every spec from `defaults` that this bag does not declare yet.
    ///
    /// Values already present win over the incoming defaults. This is the
    /// structural patch that replaces the source system's ad hoc merging of
    /// nested property dictionaries.
    pub fn merge_defaults(&mut self, defaults: &PropertyBag) {
        for (name, spec) in &defaults.specs {
            if !self.specs.contains_key(name) {
                self.specs.insert(name.clone(), spec.clone());
            }
        }
    }

    /// Clear all current values, reverting every property to its default.
    pub fn reset(&mut self) {
        for spec in self.specs.values_mut() {
            spec.value = None;
        }
    }

    /// Iterate over declared property names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(|k| k.as_str())
    }

    /// Number of declared properties.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether the bag is empty.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
