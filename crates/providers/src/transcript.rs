//! HTTP client for the transcript-extraction service.
//!
//! The service answers `GET {base_url}/transcript?videoId=<id>` with a JSON
//! array of caption segments, or 404 when the video has no captions.

use sara_domain::config::{TranscriptConfig, SERVICE_TRANSCRIPT};
use sara_domain::error::{Error, Result};

use crate::traits::{TranscriptSegment, TranscriptSource};
use crate::util::{from_reqwest, http_client, is_transient_status, snippet};

pub struct HttpTranscriptSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTranscriptSource {
    pub fn from_config(cfg: &TranscriptConfig) -> Result<Self> {
        Ok(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            client: http_client(SERVICE_TRANSCRIPT, cfg.timeout_ms)?,
        })
    }
}

#[async_trait::async_trait]
impl TranscriptSource for HttpTranscriptSource {
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        let url = format!("{}/transcript", self.base_url);
        tracing::debug!(url = %url, video_id, "transcript request");

        let resp = self
            .client
            .get(&url)
            .query(&[("videoId", video_id)])
            .send()
            .await
            .map_err(|e| from_reqwest(SERVICE_TRANSCRIPT, e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::TranscriptUnavailable(video_id.to_owned()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| from_reqwest(SERVICE_TRANSCRIPT, e))?;
        if !status.is_success() {
            return Err(Error::collaborator(
                SERVICE_TRANSCRIPT,
                format!("HTTP {} - {}", status.as_u16(), snippet(&body)),
                is_transient_status(status),
            ));
        }

        let segments: Vec<TranscriptSegment> = serde_json::from_str(&body).map_err(|e| {
            Error::collaborator(SERVICE_TRANSCRIPT, format!("malformed transcript: {e}"), false)
        })?;
        if segments.is_empty() {
            return Err(Error::TranscriptUnavailable(video_id.to_owned()));
        }
        Ok(segments)
    }
}
