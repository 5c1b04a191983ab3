use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Role a file plays within a shot, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    LowRes,
    Subtitle,
}

/// Filesystem timestamp that supplied a shot's creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// File birth time, written when recording started
    Birth,
    /// Modification time, written when recording stopped (or when the file was copied)
    Modified,
}

/// All files sharing one drone-assigned index.
/// A shot only exists when its high-resolution video does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shot {
    pub index: u32,
    pub video_path: PathBuf,
    pub low_res_path: Option<PathBuf>,
    pub subtitle_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub created_source: TimestampSource,
    /// Size of the video file
    pub size_bytes: u64,
}

impl Shot {
    pub fn new(
        index: u32,
        video_path: PathBuf,
        created_at: DateTime<Utc>,
        created_source: TimestampSource,
        size_bytes: u64,
    ) -> Self {
        Self {
            index,
            video_path,
            low_res_path: None,
            subtitle_path: None,
            created_at,
            created_source,
            size_bytes,
        }
    }

    pub fn has_lrf(&self) -> bool {
        self.low_res_path.is_some()
    }

    pub fn has_srt(&self) -> bool {
        self.subtitle_path.is_some()
    }

    /// Every file belonging to this shot, video first
    pub fn files(&self) -> Vec<&Path> {
        let mut files = vec![self.video_path.as_path()];
        files.extend(self.low_res_path.as_deref());
        files.extend(self.subtitle_path.as_deref());
        files
    }

    pub fn listing(&self) -> ListingRecord {
        ListingRecord {
            index: self.index,
            has_lrf: self.has_lrf(),
            has_srt: self.has_srt(),
            created_at: self.created_at,
            size_bytes: self.size_bytes,
            video_path: Some(self.video_path.clone()),
        }
    }
}

/// The fields listing and formatting code may rely on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub index: u32,
    pub has_lrf: bool,
    pub has_srt: bool,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn make_shot(source: TimestampSource) -> Shot {
        let created = Utc.with_ymd_and_hms(2023, 8, 28, 17, 30, 0).unwrap();
        Shot::new(31, PathBuf::from("/media/DJI_0031.MP4"), created, source, 1024)
    }

    #[test]
    fn test_files_and_listing() {
        let mut shot = make_shot(TimestampSource::Birth);
        shot.subtitle_path = Some(PathBuf::from("/media/DJI_0031.SRT"));

        assert_eq!(shot.files().len(), 2);

        let record = shot.listing();
        assert_eq!(record.index, 31);
        assert!(!record.has_lrf);
        assert!(record.has_srt);
        assert_eq!(record.size_bytes, 1024);
    }
}
