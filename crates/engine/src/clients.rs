//! Outbound LLM provider client
//!
//! One HTTP client covering both supported wire shapes: OpenAI-style
//! chat completions (bearer-authenticated `/v1/chat/completions`) and an
//! Ollama daemon's `/api/chat`. Transport and provider errors never abort
//! a run by themselves; they come back as a failed [`LlmResponse`] and
//! the node decides what to do with it.

use async_trait::async_trait;

use crate::services::{LlmClient, LlmResponse, ProviderConfig, ProviderKind};

/// Reqwest-backed [`LlmClient`].
pub struct HttpLlmClient {
    http_client: reqwest::Client,
}

impl HttpLlmClient {
    pub fn new() -> Self {
        Self {
            http_client: reqwest::Client::new(),
        }
    }

    async fn invoke_open_ai(&self, provider: &ProviderConfig, prompt: &str) -> LlmResponse {
        let request_body = serde_json::json!({
            "model": provider.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "max_tokens": provider.max_tokens,
            "temperature": provider.temperature,
        });

        log::debug!(
            "sending chat completion to {} (model '{}')",
            provider.url,
            provider.model
        );

        let response = match self
            .http_client
            .post(&provider.url)
            .bearer_auth(&provider.api_key)
            .json(&request_body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return LlmResponse::failure(format!("request failed: {}", e)),
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return LlmResponse::failure(format!("provider returned {}: {}", status, body));
        }

        let data: serde_json::Value = match response.json().await {
            Ok(data) => data,
            Err(e) => return LlmResponse::failure(format!("invalid response body: {}", e)),
        };

        match data
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
        {
            Some(content) => LlmResponse::ok(content),
            None => LlmResponse::failure("response missing choices[0].message.content"),
        }
    }

    async fn invoke_ollama(&self, provider: &ProviderConfig, prompt: &str) -> LlmResponse {
        let url = format!("{}/api/chat", provider.url.trim_end_matches('/'));
        let request_body = serde_json::json!({
            "model": provider.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "stream": false,
            "options": {
                "num_predict": provider.max_tokens,
                "temperature": provider.temperature,
            },
        });

        log::debug!("sending chat to {} (model '{}')", url, provider.model);

        let response = match self
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return LlmResponse::failure(format!("request failed: {}", e)),
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return LlmResponse::failure(format!("provider returned {}: {}", status, body));
        }

        let data: serde_json::Value = match response.json().await {
            Ok(data) => data,
            Err(e) => return LlmResponse::failure(format!("invalid response body: {}", e)),
        };

        match data
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
        {
            Some(content) => LlmResponse::ok(content),
            None => LlmResponse::failure("response missing message.content"),
        }
    }
}

impl Default for HttpLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn invoke(&self, provider: &ProviderConfig, prompt: &str) -> LlmResponse {
        match provider.api_type {
            ProviderKind::OpenAi => self.invoke_open_ai(provider, prompt).await,
            ProviderKind::Ollama => self.invoke_ollama(provider, prompt).await,
        }
    }
}
