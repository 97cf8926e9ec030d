//! Prompt builders for the LLM-backed endpoints.

use crate::traits::{CompletionRequest, TranscriptSegment};

const ARTICLE_SYSTEM: &str = "You are a professional content editor who transforms video \
transcripts into engaging articles while maintaining the original message and adding \
appropriate structure.";

/// Join caption segments into running text.
pub fn transcript_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn a transcript into a sectioned article.
///
/// The model is asked to separate sections with blank lines and start each
/// with a heading line, which is what the article parser splits on.
pub fn article(title: &str, transcript: &str) -> CompletionRequest {
    let prompt = format!(
        "Transform this YouTube video transcript into an engaging, well-structured article.\n\
         The article should be informative, easy to read, and keep the key points \
         of the original.\n\
         \n\
         Video Title: {title}\n\
         \n\
         Transcript:\n\
         {transcript}\n\
         \n\
         Structure the article with:\n\
         1. An engaging introduction\n\
         2. Logical sections, each starting with a heading on its own line\n\
         3. Clear transitions between topics\n\
         4. A concise conclusion\n\
         \n\
         Separate sections with a blank line. Do not use Markdown syntax."
    );
    CompletionRequest::new(prompt).with_system(ARTICLE_SYSTEM)
}

/// A TLDR of exactly five bullet points.
pub fn summary(title: &str, article: &str) -> CompletionRequest {
    let prompt = format!(
        "Create a TLDR (Too Long; Didn't Read) summary of this article \
         in exactly 5 bullet points.\n\
         Each bullet point should be concise but informative, capturing the key insights.\n\
         \n\
         Article Title: {title}\n\
         \n\
         Article Content:\n\
         {article}\n\
         \n\
         Format the response as 5 bullet points, each starting with \"•\". \
         Focus on the most important takeaways."
    );
    CompletionRequest::new(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str) -> TranscriptSegment {
        TranscriptSegment {
            text: text.into(),
            offset_ms: 0,
            duration_ms: 0,
        }
    }

    #[test]
    fn transcript_text_joins_non_empty_lines() {
        let text = transcript_text(&[seg(" hello "), seg(""), seg("world")]);
        assert_eq!(text, "hello world");
    }

    #[test]
    fn article_prompt_carries_title_and_transcript() {
        let req = article("Rust in 100s", "ownership is neat");
        assert!(req.system.is_some());
        assert!(req.prompt.contains("Video Title: Rust in 100s"));
        assert!(req.prompt.contains("ownership is neat"));
    }

    #[test]
    fn summary_prompt_asks_for_five_bullets() {
        let req = summary("T", "body");
        assert!(req.system.is_none());
        assert!(req.prompt.contains("exactly 5 bullet points"));
        assert!(req.prompt.contains('•'));
    }
}
