use crate::models::MediaKind;
use regex::Regex;

/// A filename recognized as drone media
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaName {
    pub index: u32,
    pub kind: MediaKind,
}

/// Recognizes drone media filenames such as `0031.MP4`, `DJI_0031.LRF` or
/// `DJI_20230828172658_0031_D.SRT`.
///
/// The index is the last all-digit, underscore-separated group before the
/// optional single-letter suffix. Numbering width and extension case do not matter.
pub struct FilenameGrammar {
    pattern: Regex,
}

impl FilenameGrammar {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(
                r"(?i)^(?:[^.].*_)?(?P<index>\d+)(?:_[a-z])?\.(?P<ext>mp4|mov|lrf|srt)$",
            )
            .unwrap(),
        }
    }

    pub fn parse(&self, file_name: &str) -> Option<MediaName> {
        // AppleDouble and other hidden files shadow real media names
        if file_name.starts_with('.') {
            return None;
        }

        let caps = self.pattern.captures(file_name)?;
        let index = caps["index"].parse().ok()?;
        let kind = match caps["ext"].to_ascii_lowercase().as_str() {
            "mp4" | "mov" => MediaKind::Video,
            "lrf" => MediaKind::LowRes,
            "srt" => MediaKind::Subtitle,
            _ => return None,
        };

        Some(MediaName { index, kind })
    }
}

impl Default for FilenameGrammar {
    fn default() -> Self {
        Self::new()
    }
}
