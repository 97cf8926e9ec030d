//! The metered flows behind the content endpoints.
//!
//! Each flow costs one unit of the service it calls and caches its result
//! under the video's key, so repeating a request is free until the entry
//! expires.

pub mod article;
pub mod metered;
pub mod video;

use sara_cache::keys;
use sara_domain::config::{SERVICE_LLM, SERVICE_TRANSCRIPT};
use sara_domain::error::{Error, Result};
use sara_providers::{prompts, TranscriptSegment};

use crate::state::AppState;
use article::Article;
use metered::{metered, Meter, Metered};

/// Units charged per remote call.
pub const COST_PER_CALL: u64 = 1;

/// Caption segments for `video`, a bare id or a video URL.
pub async fn transcript(state: &AppState, video: &str) -> Result<Metered<Vec<TranscriptSegment>>> {
    let video_id = video::parse_video_id(video)?;
    let key = keys::transcript(&video_id);
    metered(
        &state.quota,
        &state.cache,
        Meter {
            service: SERVICE_TRANSCRIPT,
            cost: COST_PER_CALL,
            cache_key: &key,
        },
        || state.transcripts.fetch(&video_id),
    )
    .await
}

/// An LLM-written article for `video`.
///
/// The transcript is fetched through its own metered flow, so a cached
/// transcript is reused and a failed transcript fetch spends no LLM quota.
pub async fn article(state: &AppState, video: &str, title: &str) -> Result<Metered<Article>> {
    let video_id = video::parse_video_id(video)?;
    let title = display_title(title);
    let key = keys::article(&video_id);
    metered(
        &state.quota,
        &state.cache,
        Meter {
            service: SERVICE_LLM,
            cost: COST_PER_CALL,
            cache_key: &key,
        },
        || async {
            let segments = transcript(state, &video_id).await?.value;
            let text = prompts::transcript_text(&segments);
            let body = state.llm.complete(prompts::article(title, &text)).await?;
            Ok(Article::from_text(title, &body))
        },
    )
    .await
}

/// A five-bullet TLDR of an already generated article.
pub async fn summary(
    state: &AppState,
    video: &str,
    title: &str,
    article_text: &str,
) -> Result<Metered<String>> {
    let video_id = video::parse_video_id(video)?;
    if article_text.trim().is_empty() {
        return Err(Error::InvalidInput("article text is required".into()));
    }
    let title = display_title(title);
    let key = keys::summary(&video_id);
    metered(
        &state.quota,
        &state.cache,
        Meter {
            service: SERVICE_LLM,
            cost: COST_PER_CALL,
            cache_key: &key,
        },
        || state.llm.complete(prompts::summary(title, article_text)),
    )
    .await
}

fn display_title(title: &str) -> &str {
    let title = title.trim();
    if title.is_empty() {
        "Untitled video"
    } else {
        title
    }
}
