//! Shared helpers for the HTTP collaborators.

use std::time::Duration;

use sara_domain::error::{Error, Result};

/// Build a client with the collaborator's request timeout.
pub(crate) fn http_client(service: &str, timeout_ms: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()
        .map_err(|e| from_reqwest(service, e))
}

/// Convert a [`reqwest::Error`] into a collaborator failure.
///
/// Timeouts and connection errors are transient; everything else is fatal.
pub(crate) fn from_reqwest(service: &str, e: reqwest::Error) -> Error {
    let transient = e.is_timeout() || e.is_connect();
    Error::collaborator(service, e.to_string(), transient)
}

/// Rate limiting and server-side errors are worth retrying later.
pub(crate) fn is_transient_status(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Trim a response body for inclusion in an error message.
pub(crate) fn snippet(body: &str) -> &str {
    const MAX: usize = 300;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
