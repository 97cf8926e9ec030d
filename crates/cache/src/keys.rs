//! Cache key builders. The prefixes match records written by earlier
//! versions so existing caches stay warm.

pub fn transcript(video_id: &str) -> String {
    format!("transcript_{video_id}")
}

pub fn article(video_id: &str) -> String {
    format!("enhanced_{video_id}")
}

pub fn summary(video_id: &str) -> String {
    format!("tldr_{video_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_per_kind() {
        assert_eq!(transcript("dQw4w9WgXcQ"), "transcript_dQw4w9WgXcQ");
        assert_eq!(article("dQw4w9WgXcQ"), "enhanced_dQw4w9WgXcQ");
        assert_eq!(summary("dQw4w9WgXcQ"), "tldr_dQw4w9WgXcQ");
    }
}
