pub mod openai_compat;
pub mod prompts;
pub mod traits;
pub mod transcript;
pub(crate) mod util;

// Re-exports for convenience.
pub use openai_compat::OpenAiCompatCompleter;
pub use traits::{Completer, CompletionRequest, TranscriptSegment, TranscriptSource};
pub use transcript::HttpTranscriptSource;
