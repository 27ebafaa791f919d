//! Chapter markers embedded in free-text descriptions.
//!
//! A marker is an optional `HH:` prefix, a mandatory `MM:SS`, the ` - `
//! separator and a title running to the end of the line:
//!
//! ```
//! use vhs_models::chapter::parse_chapters;
//! let chapters = parse_chapters("00:00 - Intro\n01:30 - Setup");
//! assert_eq!(chapters[1].start, 90);
//! assert_eq!(chapters[1].title, "Setup");
//! ```

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

static CHAPTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:(\d{2}):)?(\d{2}):(\d{2}) - (.*)").expect("chapter pattern is valid")
});

/// A titled position in a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Chapter {
    /// Start offset in seconds
    pub start: u32,
    /// Chapter title
    pub title: String,
}

/// Extract every chapter marker from `text`, in order of appearance.
pub fn parse_chapters(text: &str) -> Vec<Chapter> {
    CHAPTER_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let hours = caps.get(1).map_or(Some(0), |m| m.as_str().parse::<u32>().ok())?;
            let minutes: u32 = caps.get(2)?.as_str().parse().ok()?;
            let seconds: u32 = caps.get(3)?.as_str().parse().ok()?;
            let title = caps.get(4).map(|m| m.as_str().trim()).unwrap_or_default();

            Some(Chapter {
                start: hours * 3600 + minutes * 60 + seconds,
                title: title.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_and_seconds() {
        let chapters = parse_chapters("05:07 - Chorus");
        assert_eq!(
            chapters,
            vec![Chapter {
                start: 307,
                title: "Chorus".to_string()
            }]
        );
    }

    #[test]
    fn test_hours_prefix() {
        let chapters = parse_chapters("02:00:10 - Late part");
        assert_eq!(chapters[0].start, 7210);
    }

    #[test]
    fn test_markers_mixed_with_prose() {
        let text = "Recorded live.\n00:00 - Opening\nsome notes\n10:15 - Q&A session\nthanks!";
        let chapters = parse_chapters(text);
        assert_eq!(chapters.len(), 2);
        assert_eq!(chapters[0].title, "Opening");
        assert_eq!(chapters[1].start, 615);
        assert_eq!(chapters[1].title, "Q&A session");
    }

    #[test]
    fn test_requires_separator() {
        assert!(parse_chapters("00:10 Intro").is_empty());
        assert!(parse_chapters("").is_empty());
    }
}
