use std::sync::OnceLock;

use regex::Regex;

use sara_domain::error::{Error, Result};

fn bare_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("static regex"))
}

fn url_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?:youtube\.com/watch\?(?:.*&)?v=|youtu\.be/|youtube\.com/embed/)",
            r"([A-Za-z0-9_-]{11})(?:[^A-Za-z0-9_-]|$)",
        ))
        .expect("static regex")
    })
}

/// Accept either a bare 11-character video id or a watch/short/embed URL.
pub fn parse_video_id(input: &str) -> Result<String> {
    let input = input.trim();
    if bare_id().is_match(input) {
        return Ok(input.to_string());
    }
    url_id()
        .captures(input)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| Error::InvalidInput(format!("not a video id or URL: {input:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_ids_and_urls() {
        assert_eq!(parse_video_id("dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
        assert_eq!(
            parse_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            parse_video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(parse_video_id("https://youtu.be/dQw4w9WgXcQ").unwrap(), "dQw4w9WgXcQ");
        assert_eq!(
            parse_video_id("https://youtube.com/embed/dQw4w9WgXcQ?rel=0").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn rejects_everything_else() {
        for bad in ["", "short", "dQw4w9WgXcQx", "https://example.com/watch?v=dQw4w9WgXcQ1"] {
            assert!(
                matches!(parse_video_id(bad), Err(Error::InvalidInput(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
