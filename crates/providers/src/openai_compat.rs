//! OpenAI-compatible completion client.
//!
//! Works with OpenAI and any endpoint that follows the chat completions
//! contract (Ollama, vLLM, LM Studio, ...).

use serde_json::Value;

use sara_domain::config::{LlmConfig, SERVICE_LLM};
use sara_domain::error::{Error, Result};

use crate::traits::{Completer, CompletionRequest};
use crate::util::{from_reqwest, http_client, is_transient_status, snippet};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Adapter struct
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OpenAiCompatCompleter {
    id: String,
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatCompleter {
    /// Build from config, reading the API key from `cfg.api_key_env`.
    ///
    /// A missing key is not an error: local endpoints usually need none.
    pub fn from_config(cfg: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&cfg.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!(
                env_var = %cfg.api_key_env,
                "LLM API key not set, sending unauthenticated requests"
            );
        }
        Self::new(cfg, api_key)
    }

    pub fn new(cfg: &LlmConfig, api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            id: format!("openai_compat:{}", cfg.model),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
            client: http_client(SERVICE_LLM, cfg.timeout_ms)?,
        })
    }

    fn build_body(&self, req: &CompletionRequest) -> Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &req.system {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": req.prompt }));

        serde_json::json!({
            "model": self.model,
            "messages": messages,
        })
    }
}

#[async_trait::async_trait]
impl Completer for OpenAiCompatCompleter {
    async fn complete(&self, req: CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_body(&req);

        tracing::debug!(provider = %self.id, url = %url, "completion request");

        let mut builder = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder.send().await.map_err(|e| from_reqwest(SERVICE_LLM, e))?;

        let status = resp.status();
        let resp_text = resp.text().await.map_err(|e| from_reqwest(SERVICE_LLM, e))?;

        if !status.is_success() {
            return Err(Error::collaborator(
                SERVICE_LLM,
                format!("HTTP {} - {}", status.as_u16(), snippet(&resp_text)),
                is_transient_status(status),
            ));
        }

        let resp_json: Value = serde_json::from_str(&resp_text).map_err(|e| {
            Error::collaborator(SERVICE_LLM, format!("malformed response: {e}"), false)
        })?;
        parse_completion(&resp_json)
    }

    fn completer_id(&self) -> &str {
        &self.id
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn parse_completion(body: &Value) -> Result<String> {
    let content = body
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|a| a.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .unwrap_or("");

    if content.is_empty() {
        return Err(Error::collaborator(SERVICE_LLM, "empty completion", false));
    }
    Ok(content.to_string())
}
