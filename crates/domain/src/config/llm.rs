use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Remote collaborators
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// OpenAI-compatible completion endpoint used for articles and summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "d_llm_base_url")]
    pub base_url: String,
    #[serde(default = "d_model")]
    pub model: String,
    /// Environment variable holding the API key. Read once at startup.
    #[serde(default = "d_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "d_60000")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: d_llm_base_url(),
            model: d_model(),
            api_key_env: d_api_key_env(),
            timeout_ms: d_60000(),
        }
    }
}

/// Transcript-extraction service.
///
/// Expected to answer `GET {base_url}/transcript?videoId=<id>` with a JSON
/// array of `{ text, offset, duration }` segments (milliseconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptConfig {
    #[serde(default = "d_transcript_base_url")]
    pub base_url: String,
    #[serde(default = "d_15000")]
    pub timeout_ms: u64,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            base_url: d_transcript_base_url(),
            timeout_ms: d_15000(),
        }
    }
}

fn d_llm_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn d_model() -> String {
    "gpt-3.5-turbo".into()
}
fn d_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn d_60000() -> u64 {
    60_000
}
fn d_transcript_base_url() -> String {
    "http://127.0.0.1:8765".into()
}
fn d_15000() -> u64 {
    15_000
}
