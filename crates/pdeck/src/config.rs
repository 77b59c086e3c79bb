use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors raised while loading or validating a deck file. All of these are
/// fatal: the presentation never starts from a bad deck.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid deck file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("'slides' list cannot be empty")]
    NoSlides,
    #[error("slide page numbers must be positive (found {0})")]
    BadPage(u32),
}

/// A video clip shown in place of a slide's static page.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoRef {
    pub path: PathBuf,
    pub fps: u32,
}

/// Parsed deck configuration.
///
/// `durations` and `videos` are keyed by slide identifier: `"s"` followed
/// by the page number (`slide_key`). A page absent from `durations` never
/// auto-advances; a page present in `videos` plays the clip instead of the
/// rendered page.
#[derive(Debug, Clone, Deserialize)]
pub struct Deck {
    pub pdf: PathBuf,
    pub slides: Vec<u32>,
    #[serde(default)]
    pub durations: HashMap<String, u64>,
    #[serde(default)]
    pub videos: HashMap<String, VideoRef>,
}

/// Slide identifier used as the key in `durations` and `videos`.
pub fn slide_key(page: u32) -> String {
    format!("s{page}")
}

impl Deck {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let deck: Deck = serde_json::from_str(contents)?;
        deck.validate()?;
        Ok(deck)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.slides.is_empty() {
            return Err(ConfigError::NoSlides);
        }
        if let Some(&page) = self.slides.iter().find(|&&p| p == 0) {
            return Err(ConfigError::BadPage(page));
        }
        Ok(())
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Page number for a slide position. Panics if `index` is out of range;
    /// the controller keeps its index within bounds.
    pub fn page_at(&self, index: usize) -> u32 {
        self.slides[index]
    }

    /// Auto-advance delay for a page, if one is configured.
    pub fn duration_for(&self, page: u32) -> Option<Duration> {
        self.durations
            .get(&slide_key(page))
            .map(|&ms| Duration::from_millis(ms))
    }

    /// Video clip override for a page, if one is configured.
    pub fn video_for(&self, page: u32) -> Option<&VideoRef> {
        self.videos.get(&slide_key(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "pdf": "talk.pdf",
        "slides": [1, 2, 3, 2],
        "durations": { "s1": 500 },
        "videos": { "s2": { "path": "clip.mp4", "fps": 25 } }
    }"#;

    #[test]
    fn test_parse_sample() {
        let deck = Deck::parse(SAMPLE).unwrap();
        assert_eq!(deck.pdf, PathBuf::from("talk.pdf"));
        assert_eq!(deck.slides, vec![1, 2, 3, 2]);
        assert_eq!(deck.duration_for(1), Some(Duration::from_millis(500)));
        assert_eq!(deck.duration_for(3), None);
        let video = deck.video_for(2).unwrap();
        assert_eq!(video.path, PathBuf::from("clip.mp4"));
        assert_eq!(video.fps, 25);
        assert!(deck.video_for(1).is_none());
    }

    #[test]
    fn test_maps_default_to_empty() {
        let deck = Deck::parse(r#"{ "pdf": "talk.pdf", "slides": [4] }"#).unwrap();
        assert!(deck.durations.is_empty());
        assert!(deck.videos.is_empty());
    }

    #[test]
    fn test_empty_slides_rejected() {
        let err = Deck::parse(r#"{ "pdf": "talk.pdf", "slides": [] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::NoSlides));
    }

    #[test]
    fn test_zero_page_rejected() {
        let err = Deck::parse(r#"{ "pdf": "talk.pdf", "slides": [1, 0] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::BadPage(0)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            Deck::parse("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_slide_key_format() {
        assert_eq!(slide_key(1), "s1");
        assert_eq!(slide_key(42), "s42");
    }
}
