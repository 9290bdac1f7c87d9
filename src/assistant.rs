//! Remote sync client for the OpenAI assistants API.
//!
//! One operation: overwrite the assistant's `instructions` field with a
//! rendered snapshot via `POST /v1/assistants/{id}`. The call is a single
//! attempt with no retry — the coalescer guarantees the next trigger pushes
//! fresh state, so looping on a stale payload here would only add lag.
//!
//! Requires the `OPENAI_API_KEY` environment variable. An optional proxy
//! from `[network]` routes all traffic through `reqwest::Proxy`.

use anyhow::{Context, Result};
use std::time::Duration;

use crate::config::{AssistantConfig, NetworkConfig};
use crate::error::RemoteError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct AssistantClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    assistant_id: String,
    model: String,
    name: String,
}

impl AssistantClient {
    /// Build the client. Fails fast on a missing API key or malformed proxy
    /// URL — both are configuration errors, fatal at startup.
    pub fn new(assistant: &AssistantConfig, network: &NetworkConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let mut builder = reqwest::Client::builder().timeout(REQUEST_TIMEOUT);
        if let Some(proxy) = &network.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy)
                    .with_context(|| format!("Invalid proxy url: {}", proxy))?,
            );
        }

        Ok(Self {
            http: builder.build()?,
            api_key,
            api_base: assistant.api_base.trim_end_matches('/').to_string(),
            assistant_id: assistant.id.clone(),
            model: assistant.model.clone(),
            name: assistant.name.clone(),
        })
    }

    /// Replace the assistant's instructions with the rendered payload.
    pub async fn update_instructions(&self, instructions: &str) -> Result<(), RemoteError> {
        let url = format!("{}/v1/assistants/{}", self.api_base, self.assistant_id);
        let body = request_body(instructions, &self.name, &self.model);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("OpenAI-Beta", "assistants=v2")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api { status, body });
        }

        Ok(())
    }
}

/// The modify-assistant request body. Tools are cleared on purpose: the
/// assistant is a pure instruction carrier.
fn request_body(instructions: &str, name: &str, model: &str) -> serde_json::Value {
    serde_json::json!({
        "instructions": instructions,
        "name": name,
        "model": model,
        "tools": [],
    })
}
