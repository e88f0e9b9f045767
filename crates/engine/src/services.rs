//! External collaborator contracts
//!
//! The engine consumes, but does not implement, a handful of external
//! services: the AI-provider client a node calls during `process`, and the
//! human-review gate used by the accumulate-output family before its
//! terminal emission. Hosts supply implementations; tests supply mocks.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Which provider protocol an interface speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// OpenAI-style chat completions endpoint
    OpenAi,
    /// Ollama-style local chat endpoint
    Ollama,
}

/// Configuration for one named AI-provider interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub api_type: ProviderKind,
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f64 {
    0.7
}

/// Engine-level configuration: the named provider interfaces nodes can
/// select through their `interface` property.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub interfaces: HashMap<String, ProviderConfig>,
}

impl EngineConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Look up a named interface.
    pub fn interface(&self, name: &str) -> Option<&ProviderConfig> {
        self.interfaces.get(name)
    }

    /// Interface names, sorted for stable editor dropdowns.
    pub fn interface_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.interfaces.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Standardized response from an AI-provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub success: bool,
    pub content: String,
    #[serde(default)]
    pub error: String,
}

impl LlmResponse {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
            error: String::new(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: String::new(),
            error: error.into(),
        }
    }
}

/// Client for text AI providers.
///
/// Provider selection is a configuration concern resolved before the call;
/// nodes are indifferent to which protocol is behind an interface name.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a prompt to the given provider and await the reply.
    ///
    /// Transport failures are reported inside `LlmResponse`, never as a
    /// panic or an engine error; routing around a failed call is graph
    /// wiring, not engine policy.
    async fn invoke(&self, provider: &ProviderConfig, prompt: &str) -> LlmResponse;
}

/// Human-review gate consulted by accumulate-output nodes before their
/// terminal emission. The call blocks the run until the reviewer decides.
#[async_trait]
pub trait ReviewGate: Send + Sync {
    /// Ask for approval of `content` produced by `node_id`.
    async fn confirm(&self, node_id: &str, content: &str) -> bool;
}

/// Review gate that approves everything. Default for headless hosts.
pub struct AutoApprove;

#[async_trait]
impl ReviewGate for AutoApprove {
    async fn confirm(&self, _node_id: &str, _content: &str) -> bool {
        true
    }
}

/// Bundle of collaborators handed to every node activation.
#[derive(Clone)]
pub struct NodeServices {
    pub config: Arc<EngineConfig>,
    pub llm: Arc<dyn LlmClient>,
    pub review: Arc<dyn ReviewGate>,
}

impl NodeServices {
    pub fn new(config: Arc<EngineConfig>, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            config,
            llm,
            review: Arc::new(AutoApprove),
        }
    }

    /// Replace the review gate.
    pub fn with_review(mut self, review: Arc<dyn ReviewGate>) -> Self {
        self.review = review;
        self
    }
}
