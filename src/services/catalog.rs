use crate::error::{Error, Result};
use crate::models::{MediaKind, Shot, TimestampSource};
use crate::services::filename::FilenameGrammar;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where drones keep their media relative to the mount root, in probe order
pub const CONVENTIONAL_SUBDIRS: [&str; 2] = ["DCIM/DJI_001", "DCIM/100MEDIA"];

/// Groups the media files of one directory into shots
pub struct FileCatalog {
    grammar: FilenameGrammar,
}

impl FileCatalog {
    pub fn new() -> Self {
        Self {
            grammar: FilenameGrammar::new(),
        }
    }

    /// Scan a directory (or a drone mount root) and return its shots in ascending index order
    pub fn scan(&self, root: &Path) -> Result<Vec<Shot>> {
        let media_dir = self.resolve_media_dir(root)?;
        debug!("scanning {}", media_dir.display());

        let mut videos: BTreeMap<u32, PathBuf> = BTreeMap::new();
        let mut low_res: BTreeMap<u32, PathBuf> = BTreeMap::new();
        let mut subtitles: BTreeMap<u32, PathBuf> = BTreeMap::new();

        for (name, path) in self.list_files(&media_dir)? {
            let Some(media) = self.grammar.parse(&name) else {
                debug!("skipping unrecognized file {}", name);
                continue;
            };

            let group = match media.kind {
                MediaKind::Video => &mut videos,
                MediaKind::LowRes => &mut low_res,
                MediaKind::Subtitle => &mut subtitles,
            };
            if let Some(existing) = group.get(&media.index) {
                warn!(
                    "index {} already taken by {}, ignoring {}",
                    media.index,
                    existing.display(),
                    path.display()
                );
                continue;
            }
            group.insert(media.index, path);
        }

        let mut shots = Vec::with_capacity(videos.len());
        for (index, video_path) in videos {
            let metadata = match fs::metadata(&video_path) {
                Ok(m) => m,
                Err(e) => {
                    warn!("skipping {}: {}", video_path.display(), e);
                    continue;
                }
            };
            let Some((created_at, created_source)) = creation_time(&metadata) else {
                warn!("skipping {}: no usable timestamp", video_path.display());
                continue;
            };

            let mut shot = Shot::new(index, video_path, created_at, created_source, metadata.len());
            shot.low_res_path = low_res.remove(&index);
            shot.subtitle_path = subtitles.remove(&index);
            shots.push(shot);
        }

        for path in low_res.values().chain(subtitles.values()) {
            warn!("ignoring {}: no matching video", path.display());
        }

        Ok(shots)
    }

    /// Find the directory that actually holds the media.
    ///
    /// The root itself wins when it contains drone files. Otherwise the first
    /// conventional subdirectory with media is used, then the first one that
    /// exists at all. An empty root scans as empty.
    pub fn resolve_media_dir(&self, root: &Path) -> Result<PathBuf> {
        if !root.is_dir() {
            return Err(Error::NotFound(root.to_path_buf()));
        }

        let root_entries = fs::read_dir(root)
            .map_err(|e| Error::io(root, e))?
            .filter_map(|entry| entry.ok())
            .count();
        if self.contains_media(root)? {
            return Ok(root.to_path_buf());
        }

        let candidates: Vec<PathBuf> = CONVENTIONAL_SUBDIRS
            .iter()
            .map(|sub| root.join(sub))
            .filter(|dir| dir.is_dir())
            .collect();
        for candidate in &candidates {
            if self.contains_media(candidate)? {
                debug!("using conventional subdirectory {}", candidate.display());
                return Ok(candidate.clone());
            }
        }
        if let Some(first) = candidates.into_iter().next() {
            return Ok(first);
        }

        if root_entries == 0 {
            return Ok(root.to_path_buf());
        }

        Err(Error::NotFound(root.to_path_buf()))
    }

    fn contains_media(&self, dir: &Path) -> Result<bool> {
        Ok(self
            .list_files(dir)?
            .iter()
            .any(|(name, _)| self.grammar.parse(name).is_some()))
    }

    /// Regular files of `dir`, sorted by name. Unreadable entries are skipped.
    fn list_files(&self, dir: &Path) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            match entry.file_type() {
                Ok(t) if t.is_file() => {}
                Ok(_) => continue,
                Err(e) => {
                    warn!("skipping {}: {}", entry.path().display(), e);
                    continue;
                }
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                debug!("skipping non UTF-8 name {:?}", entry.file_name());
                continue;
            };
            files.push((name, entry.path()));
        }

        files.sort();
        Ok(files)
    }
}

impl Default for FileCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Birth time when the filesystem has one that predates the last write.
/// A birth time after the modification time means the file was copied, so
/// the modification time is closer to the recording.
pub(crate) fn creation_time(metadata: &fs::Metadata) -> Option<(DateTime<Utc>, TimestampSource)> {
    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    let born = metadata.created().ok().map(DateTime::<Utc>::from);

    match (born, modified) {
        (Some(b), Some(m)) if b <= m => Some((b, TimestampSource::Birth)),
        (_, Some(m)) => Some((m, TimestampSource::Modified)),
        (Some(b), None) => Some((b, TimestampSource::Birth)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for name in names {
            fs::write(dir.join(name), "data").unwrap();
        }
    }

    fn summary(shots: &[Shot]) -> Vec<(u32, bool, bool)> {
        shots
            .iter()
            .map(|s| (s.index, s.has_srt(), s.has_lrf()))
            .collect()
    }

    #[test]
    fn test_groups_companions_by_index() {
        let dir = tempdir().unwrap();
        touch(
            dir.path(),
            &[
                "0031.MP4", "0032.MP4", "0032.SRT", "0033.MP4", "0033.LRF", "0033.SRT",
            ],
        );

        let shots = FileCatalog::new().scan(dir.path()).unwrap();

        assert_eq!(
            summary(&shots),
            vec![(31, false, false), (32, true, false), (33, true, true)]
        );
        assert_eq!(shots[0].size_bytes, 4);
        assert!(shots[0].video_path.ends_with("0031.MP4"));
    }

    #[test]
    fn test_empty_directory_has_no_shots() {
        let dir = tempdir().unwrap();
        let shots = FileCatalog::new().scan(dir.path()).unwrap();
        assert!(shots.is_empty());
    }

    #[test]
    fn test_orphaned_subtitle_is_ignored() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["DJI_0040.SRT", "DJI_0041.lrf"]);

        let shots = FileCatalog::new().scan(dir.path()).unwrap();
        assert!(shots.is_empty());
    }

    #[test]
    fn test_mixed_case_and_long_names() {
        let dir = tempdir().unwrap();
        touch(
            dir.path(),
            &[
                "DJI_20230828172658_0104_D.mp4",
                "DJI_20230828172658_0104_D.srt",
                "dji_0009.mov",
                "thumbs.db",
            ],
        );

        let shots = FileCatalog::new().scan(dir.path()).unwrap();
        assert_eq!(summary(&shots), vec![(9, false, false), (104, true, false)]);
    }

    #[test]
    fn test_rescopes_to_conventional_subdirectory() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("MISC"), &["settings.bin"]);
        touch(&dir.path().join("DCIM/DJI_001"), &["DJI_0001.MP4", "DJI_0001.LRF"]);

        let catalog = FileCatalog::new();
        assert_eq!(
            catalog.resolve_media_dir(dir.path()).unwrap(),
            dir.path().join("DCIM/DJI_001")
        );
        let shots = catalog.scan(dir.path()).unwrap();
        assert_eq!(summary(&shots), vec![(1, false, true)]);
    }

    #[test]
    fn test_prefers_subdirectory_with_media() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("DCIM/DJI_001")).unwrap();
        touch(&dir.path().join("DCIM/100MEDIA"), &["DJI_0005.MP4"]);

        let shots = FileCatalog::new().scan(dir.path()).unwrap();
        assert_eq!(summary(&shots), vec![(5, false, false)]);
    }

    #[test]
    fn test_unrecognized_root_is_not_found() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["notes.txt"]);

        let err = FileCatalog::new().scan(dir.path()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let dir = tempdir().unwrap();
        let err = FileCatalog::new()
            .scan(&dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_duplicate_index_keeps_first_name() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["DJI_0007.MOV", "DJI_0007.MP4"]);

        let shots = FileCatalog::new().scan(dir.path()).unwrap();
        assert_eq!(shots.len(), 1);
        assert!(shots[0].video_path.ends_with("DJI_0007.MOV"));
    }
}
