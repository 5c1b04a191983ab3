use crate::error::{Error, Result};
use crate::models::{Shot, SubtitleRecord, TimestampSource, TrackDocument};
use crate::services::catalog::creation_time;
use crate::services::gpx::{default_output_path, TrackWriter};
use crate::services::srt_parser::{apply_recording_start, recording_duration, SrtParser};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const VIDEO_EXTENSIONS: [&str; 2] = ["mp4", "mov"];

/// A written track file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedTrack {
    pub source: PathBuf,
    pub output: PathBuf,
    pub points: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionOutcome {
    Converted(ConvertedTrack),
    Failed { source: PathBuf, error: String },
}

impl ConversionOutcome {
    pub fn source(&self) -> &Path {
        match self {
            ConversionOutcome::Converted(track) => &track.source,
            ConversionOutcome::Failed { source, .. } => source,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ConversionOutcome::Converted(_))
    }
}

/// Per-file results of a batch conversion, in processing order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionReport {
    pub outcomes: Vec<ConversionOutcome>,
}

impl ConversionReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Where a subtitle file's offsets are anchored in absolute time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeAnchor {
    pub timestamp: DateTime<Utc>,
    pub source: TimestampSource,
}

impl TimeAnchor {
    pub fn new(timestamp: DateTime<Utc>, source: TimestampSource) -> Self {
        Self { timestamp, source }
    }

    /// Recording start for the captioned recording. A modification time
    /// marks the end of recording, so the caption span is subtracted.
    pub fn recording_start(&self, records: &[SubtitleRecord]) -> DateTime<Utc> {
        match self.source {
            TimestampSource::Birth => self.timestamp,
            TimestampSource::Modified => self.timestamp - recording_duration(records),
        }
    }
}

/// Subtitle-to-track conversion
pub struct Converter {
    parser: SrtParser,
    writer: TrackWriter,
}

impl Converter {
    pub fn new() -> Self {
        Self {
            parser: SrtParser::new(),
            writer: TrackWriter::new(),
        }
    }

    /// Parse a subtitle file and build its track without writing anything
    pub fn track_for(&self, srt_path: &Path, anchor: Option<TimeAnchor>) -> Result<TrackDocument> {
        let mut records = self.parser.parse_file(srt_path)?;
        let start = anchor.map(|a| a.recording_start(&records));
        apply_recording_start(&mut records, start);

        let name = srt_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(self.writer.build(&name, &records))
    }

    /// Convert one subtitle file. The output defaults to the same name with a
    /// `.gpx` extension. Times are anchored on the sibling video when there is
    /// one, else on the subtitle file itself.
    pub fn convert_file(&self, srt_path: &Path, output: Option<&Path>) -> Result<ConvertedTrack> {
        let anchor = file_anchor(srt_path)?;
        self.convert_with_anchor(srt_path, output, Some(anchor))
    }

    pub fn convert_with_anchor(
        &self,
        srt_path: &Path,
        output: Option<&Path>,
        anchor: Option<TimeAnchor>,
    ) -> Result<ConvertedTrack> {
        let track = self.track_for(srt_path, anchor)?;
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(srt_path));

        self.writer.write_file(&track, &output)?;
        debug!("wrote {} points to {}", track.len(), output.display());

        Ok(ConvertedTrack {
            source: srt_path.to_path_buf(),
            output,
            points: track.len(),
        })
    }

    /// Convert the subtitle of every shot that has one. A failing file is
    /// recorded and the rest still get converted.
    pub fn convert_shots<'a, I>(&self, shots: I) -> ConversionReport
    where
        I: IntoIterator<Item = &'a Shot>,
    {
        let mut report = ConversionReport::default();

        for shot in shots {
            let Some(srt_path) = shot.subtitle_path.as_deref() else {
                debug!("shot {} has no subtitle file", shot.index);
                continue;
            };

            let anchor = TimeAnchor::new(shot.created_at, shot.created_source);
            let outcome = match self.convert_with_anchor(srt_path, None, Some(anchor)) {
                Ok(track) => ConversionOutcome::Converted(track),
                Err(e) => {
                    warn!("failed to convert {}: {}", srt_path.display(), e);
                    ConversionOutcome::Failed {
                        source: srt_path.to_path_buf(),
                        error: e.to_string(),
                    }
                }
            };
            report.outcomes.push(outcome);
        }

        info!(
            "converted {} of {} subtitle files",
            report.succeeded(),
            report.outcomes.len()
        );
        report
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new()
    }
}

/// Timestamp of the video next to `srt_path`, falling back to the subtitle
/// file's own modification time.
pub fn file_anchor(srt_path: &Path) -> Result<TimeAnchor> {
    if let Some(video) = sibling_video(srt_path) {
        if let Some((timestamp, source)) = fs::metadata(&video).ok().as_ref().and_then(creation_time) {
            debug!("anchoring {} on {}", srt_path.display(), video.display());
            return Ok(TimeAnchor::new(timestamp, source));
        }
    }

    let metadata = fs::metadata(srt_path).map_err(|e| Error::io(srt_path, e))?;
    let modified = metadata.modified().map_err(|e| Error::io(srt_path, e))?;
    Ok(TimeAnchor::new(modified.into(), TimestampSource::Modified))
}

/// Video sharing the subtitle's stem, extension matched case-insensitively
fn sibling_video(srt_path: &Path) -> Option<PathBuf> {
    let stem = srt_path.file_stem()?;
    let dir = match srt_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_stem() == Some(stem)
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| VIDEO_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
