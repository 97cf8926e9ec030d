//! Shaping raw LLM text into a sectioned article.

use serde::{Deserialize, Serialize};

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub sections: Vec<Section>,
    pub estimated_read_minutes: u32,
    /// The generated text as returned by the model.
    pub body: String,
}

impl Article {
    /// Split `body` into sections on blank lines. The first line of each
    /// block is its heading, the remaining non-empty lines its paragraphs.
    pub fn from_text(title: &str, body: &str) -> Self {
        let sections = body
            .split("\n\n")
            .filter_map(|block| {
                let mut lines = block.lines().map(str::trim).filter(|l| !l.is_empty());
                let heading = lines.next()?;
                Some(Section {
                    heading: strip_heading_marks(heading).to_string(),
                    paragraphs: lines.map(String::from).collect(),
                })
            })
            .collect();

        Self {
            title: title.to_string(),
            sections,
            estimated_read_minutes: read_minutes(body),
            body: body.to_string(),
        }
    }
}

/// `ceil(words / 200)`, and never zero for non-empty text.
pub fn read_minutes(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE) as u32
}

fn strip_heading_marks(line: &str) -> &str {
    line.trim_start_matches('#').trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_sections_on_blank_lines() {
        let body = concat!(
            "## Introduction\nRust is fast.\nAnd safe.\n\n",
            "Ownership\nEach value has one owner.\n\n\n",
        );
        let article = Article::from_text("Rust", body);
        assert_eq!(article.sections.len(), 2);
        assert_eq!(article.sections[0].heading, "Introduction");
        assert_eq!(article.sections[0].paragraphs, vec!["Rust is fast.", "And safe."]);
        assert_eq!(article.sections[1].heading, "Ownership");
        assert_eq!(article.title, "Rust");
    }

    #[test]
    fn read_time_rounds_up() {
        assert_eq!(read_minutes(""), 0);
        assert_eq!(read_minutes("one"), 1);
        assert_eq!(read_minutes(&"w ".repeat(200)), 1);
        assert_eq!(read_minutes(&"w ".repeat(201)), 2);
    }

    #[test]
    fn serializes_camel_case() {
        let article = Article::from_text("T", "H\np");
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["estimatedReadMinutes"], 1);
        assert_eq!(json["sections"][0]["paragraphs"][0], "p");
    }
}
