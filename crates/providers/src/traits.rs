use serde::{Deserialize, Serialize};

use sara_domain::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One caption line of a video transcript.
///
/// Serialized as `{ text, offset, duration }` (milliseconds), the shape the
/// transcript service returns and the cache stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    #[serde(rename = "offset")]
    pub offset_ms: u64,
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

/// A single-turn completion request.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Optional system message sent before the prompt.
    pub system: Option<String>,
    /// The user prompt.
    pub prompt: String,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Collaborator traits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Source of video transcripts. Each call costs one `transcript` unit.
#[async_trait::async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Ordered caption segments for `video_id`.
    ///
    /// Fails with `Error::TranscriptUnavailable` when the video has no
    /// captions, and `Error::Collaborator` for every other failure.
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;
}

/// Text completion backend. Each call costs one `llm` unit.
#[async_trait::async_trait]
pub trait Completer: Send + Sync {
    /// Complete `req` and return the generated text (never empty).
    async fn complete(&self, req: CompletionRequest) -> Result<String>;

    /// Identifier used in logs and trace events.
    fn completer_id(&self) -> &str;
}
