use crate::error::{Error, Result};
use crate::models::{Altitude, AltitudeReference, SubtitleRecord};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::{Captures, Regex};
use std::fs;
use std::iter::Enumerate;
use std::path::Path;
use std::str::{FromStr, Lines};

/// How a firmware writes its telemetry. A file uses one notation throughout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryNotation {
    /// `[iso: 160] [latitude: 36.27423] [longitude: -41.36214] [rel_alt: 46.000 abs_alt: 19.621]`
    Bracketed,
    /// `GPS(8.6586, 50.1120, 18) ... H 19.30m`, longitude first unless hemisphere letters say otherwise
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn name(self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }
}

/// Altitudes seen in one caption block, by reference
#[derive(Default)]
struct Heights {
    takeoff: Option<f64>,
    msl: Option<f64>,
    unspecified: Option<f64>,
}

impl Heights {
    /// Relative-to-takeoff first, as that is what the flight log shows the pilot
    fn into_altitudes(self) -> (Option<Altitude>, Option<Altitude>) {
        let mut present = [
            self.takeoff.map(|m| Altitude::new(m, AltitudeReference::Takeoff)),
            self.msl.map(|m| Altitude::new(m, AltitudeReference::MeanSeaLevel)),
            self.unspecified.map(|m| Altitude::new(m, AltitudeReference::Unspecified)),
        ]
        .into_iter()
        .flatten();
        (present.next(), present.next())
    }
}

pub struct SrtParser {
    // Block structure
    time_pattern: Regex,
    markup_pattern: Regex,
    header_pattern: Regex,
    timestamp_pattern: Regex,
    // Bracketed notation
    bracket_marker: Regex,
    tag_pattern: Regex,
    pair_pattern: Regex,
    // Legacy notation
    gps_pattern: Regex,
    legacy_marker: Regex,
    iso_pattern: Regex,
    shutter_pattern: Regex,
    fnum_pattern: Regex,
    ev_pattern: Regex,
    height_pattern: Regex,
    barometer_pattern: Regex,
}

impl SrtParser {
    pub fn new() -> Self {
        Self {
            time_pattern: Regex::new(
                r"^(\d+):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d+):(\d{2}):(\d{2})[,.](\d{3})",
            )
            .unwrap(),
            markup_pattern: Regex::new(r"<[^<>]+>").unwrap(),
            header_pattern: Regex::new(
                r"(?:FrameCnt|SrtCnt)\s*:\s*(\d+)\s*,\s*DiffTime\s*:\s*(\d+)\s*ms",
            )
            .unwrap(),
            timestamp_pattern: Regex::new(
                r"(\d{4})[-.](\d{2})[-.](\d{2})[ T]+(\d{2}):(\d{2}):(\d{2})(?:[.,](\d{1,9}))?",
            )
            .unwrap(),
            bracket_marker: Regex::new(r"\[\s*[A-Za-z_]+\s*:").unwrap(),
            tag_pattern: Regex::new(r"\[([^\[\]]*)\]").unwrap(),
            pair_pattern: Regex::new(
                r"(?P<key>[A-Za-z_]+)\s*:\s*(?P<value>(?:[NSEWnsew]\s+)?[^\s\]]*)",
            )
            .unwrap(),
            gps_pattern: Regex::new(r"\bGPS\s*\(([^)]*)\)").unwrap(),
            legacy_marker: Regex::new(r"\b(?:GPS|HOME)\s*\(").unwrap(),
            iso_pattern: Regex::new(r"\bISO\s*:?\s*(\d+)").unwrap(),
            shutter_pattern: Regex::new(r"\b(?:Shutter|SS)\s*:?\s*([0-9./]+)").unwrap(),
            fnum_pattern: Regex::new(r"(?:\bFnum\s*:?\s*|\bF/)([0-9.]+)").unwrap(),
            ev_pattern: Regex::new(r"\bEV\s*:?[ \t]*([+-]?[0-9./]*)").unwrap(),
            height_pattern: Regex::new(r"\bH\s+(-?[0-9.]+)m").unwrap(),
            barometer_pattern: Regex::new(r"\bBAROMETER\s*:\s*(-?[0-9.]+)").unwrap(),
        }
    }

    /// Parse an SRT file. Any malformed block fails the whole file.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<SubtitleRecord>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

        self.parse_content(&content)
    }

    /// Parse SRT content, discarding everything if a block is malformed
    pub fn parse_content(&self, content: &str) -> Result<Vec<SubtitleRecord>> {
        self.records(content).collect()
    }

    /// Lazily parse SRT content front to back.
    /// The sequence ends right after the first error it yields.
    pub fn records<'p, 't>(&'p self, content: &'t str) -> SubtitleRecords<'p, 't> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        SubtitleRecords {
            parser: self,
            lines: content.lines().enumerate(),
            notation: None,
            last_start_ms: None,
            last_frame_count: None,
            finished: false,
        }
    }

    /// Decide the notation from the telemetry text of a caption block
    pub fn detect_notation(&self, text: &str) -> TelemetryNotation {
        self.signalled_notation(text)
            .unwrap_or(TelemetryNotation::Bracketed)
    }

    /// `None` when the text carries neither a `[key:` tag nor a `GPS(`/`HOME(` tuple
    fn signalled_notation(&self, text: &str) -> Option<TelemetryNotation> {
        if self.bracket_marker.is_match(text) {
            Some(TelemetryNotation::Bracketed)
        } else if self.legacy_marker.is_match(text) {
            Some(TelemetryNotation::Legacy)
        } else {
            None
        }
    }

    fn parse_block(
        &self,
        block: &[(usize, &str)],
        notation: &mut Option<TelemetryNotation>,
    ) -> Result<SubtitleRecord> {
        let (index_line, index_text) = block[0];
        let index: u32 = index_text.trim().parse().map_err(|_| {
            Error::format(
                index_line,
                format!("expected caption number, found '{}'", index_text.trim()),
            )
        })?;

        let Some(&(time_line, time_text)) = block.get(1) else {
            return Err(Error::format(index_line, "caption has no timecode"));
        };
        let (start_ms, end_ms) = self
            .parse_timecode(time_text.trim())
            .ok_or_else(|| Error::format(time_line, format!("invalid timecode '{}'", time_text.trim())))?;
        if end_ms < start_ms {
            return Err(Error::format(time_line, "caption ends before it starts"));
        }

        let mut record = SubtitleRecord::new(index, start_ms, end_ms);

        // Markup tags open and close on the same line, so stripping per line is safe
        let content: Vec<(usize, String)> = block[2..]
            .iter()
            .map(|(line, text)| (*line, self.markup_pattern.replace_all(text, "").into_owned()))
            .collect();

        // Locked by the first block that shows its notation
        if notation.is_none() {
            let joined: Vec<&str> = content.iter().map(|(_, text)| text.as_str()).collect();
            *notation = self.signalled_notation(&joined.join("\n"));
        }
        let notation = notation.unwrap_or(TelemetryNotation::Bracketed);

        let mut heights = Heights::default();
        for (line, text) in &content {
            self.parse_common(&mut record, text, *line)?;
            match notation {
                TelemetryNotation::Bracketed => {
                    self.parse_bracketed(&mut record, &mut heights, text, *line)?
                }
                TelemetryNotation::Legacy => {
                    self.parse_legacy(&mut record, &mut heights, text, *line)?
                }
            }
        }
        (record.altitude, record.alternate_altitude) = heights.into_altitudes();

        // A fix needs both coordinates; 0,0 is what the drone writes while it has none
        let has_fix = match record.gps_fix() {
            Some((lat, lon)) => lat != 0.0 || lon != 0.0,
            None => false,
        };
        if !has_fix {
            record.latitude = None;
            record.longitude = None;
        }

        Ok(record)
    }

    /// Frame header and wall clock, written the same way by every firmware
    fn parse_common(&self, record: &mut SubtitleRecord, text: &str, line: usize) -> Result<()> {
        if let Some(caps) = self.header_pattern.captures(text) {
            record.frame_count = Some(number(&caps[1], line, "frame count")?);
            record.diff_time_ms = Some(number(&caps[2], line, "DiffTime")?);
        }

        if record.embedded_time.is_none() {
            if let Some(caps) = self.timestamp_pattern.captures(text) {
                record.embedded_time = Some(wall_clock(&caps).ok_or_else(|| {
                    Error::format(line, format!("invalid timestamp '{}'", &caps[0]))
                })?);
            }
        }

        Ok(())
    }

    fn parse_bracketed(
        &self,
        record: &mut SubtitleRecord,
        heights: &mut Heights,
        text: &str,
        line: usize,
    ) -> Result<()> {
        // One tag may hold several pairs, e.g. [rel_alt: 46.000 abs_alt: 19.621]
        for tag in self.tag_pattern.captures_iter(text) {
            for pair in self.pair_pattern.captures_iter(&tag[1]) {
                let key = pair["key"].to_ascii_lowercase();
                let value = pair["value"].trim().trim_end_matches(',');
                if value.is_empty() {
                    continue;
                }

                match key.as_str() {
                    "iso" => record.iso = Some(number(value, line, &key)?),
                    "shutter" => record.shutter = Some(value.to_string()),
                    "fnum" => record.fnum = Some(f_number(number(value, line, &key)?)),
                    "ev" => record.ev = Some(fraction(value, line, &key)?),
                    "ct" => record.color_temp = Some(number(value, line, &key)?),
                    "color_md" => record.color_mode = Some(value.to_string()),
                    "focal_len" => record.focal_len = Some(number(value, line, &key)?),
                    "latitude" | "lat" => {
                        record.latitude = Some(coordinate(value, Axis::Latitude, line)?)
                    }
                    // some firmware spells it "longtitude"
                    "longitude" | "longtitude" | "lon" => {
                        record.longitude = Some(coordinate(value, Axis::Longitude, line)?)
                    }
                    "rel_alt" => heights.takeoff = Some(number(value, line, &key)?),
                    "abs_alt" => heights.msl = Some(number(value, line, &key)?),
                    "altitude" => heights.unspecified = Some(number(value, line, &key)?),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn parse_legacy(
        &self,
        record: &mut SubtitleRecord,
        heights: &mut Heights,
        text: &str,
        line: usize,
    ) -> Result<()> {
        if let Some(caps) = self.gps_pattern.captures(text) {
            if let Some((lat, lon)) = gps_tuple(&caps[1], line)? {
                record.latitude = Some(lat);
                record.longitude = Some(lon);
            }
        }

        if let Some(caps) = self.iso_pattern.captures(text) {
            record.iso = Some(number(&caps[1], line, "ISO")?);
        }
        if let Some(caps) = self.shutter_pattern.captures(text) {
            record.shutter = Some(caps[1].to_string());
        }
        if let Some(caps) = self.fnum_pattern.captures(text) {
            record.fnum = Some(f_number(number(&caps[1], line, "Fnum")?));
        }
        if let Some(caps) = self.ev_pattern.captures(text) {
            if !caps[1].is_empty() {
                record.ev = Some(fraction(&caps[1], line, "EV")?);
            }
        }

        // Both are heights above the takeoff point
        if let Some(caps) = self.height_pattern.captures(text) {
            heights.takeoff = Some(number(&caps[1], line, "H")?);
        }
        if let Some(caps) = self.barometer_pattern.captures(text) {
            let meters = number(&caps[1], line, "BAROMETER")?;
            heights.takeoff.get_or_insert(meters);
        }

        Ok(())
    }

    fn parse_timecode(&self, line: &str) -> Option<(i64, i64)> {
        let caps = self.time_pattern.captures(line)?;

        let field = |i: usize| caps[i].parse::<i64>().ok();
        let millis = |first: usize| -> Option<i64> {
            let (hours, minutes, seconds) = (field(first)?, field(first + 1)?, field(first + 2)?);
            if minutes >= 60 || seconds >= 60 {
                return None;
            }
            hours
                .checked_mul(3_600_000)?
                .checked_add(minutes * 60_000 + seconds * 1000 + field(first + 3)?)
        };

        Some((millis(1)?, millis(5)?))
    }
}

impl Default for SrtParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-pass sequence of caption records, see [`SrtParser::records`]
pub struct SubtitleRecords<'p, 't> {
    parser: &'p SrtParser,
    lines: Enumerate<Lines<'t>>,
    notation: Option<TelemetryNotation>,
    last_start_ms: Option<i64>,
    last_frame_count: Option<u32>,
    finished: bool,
}

impl<'p, 't> SubtitleRecords<'p, 't> {
    /// Notation locked in by the first block that shows one
    pub fn notation(&self) -> Option<TelemetryNotation> {
        self.notation
    }

    /// Next run of non-blank lines, with 1-based line numbers
    fn next_block(&mut self) -> Option<Vec<(usize, &'t str)>> {
        let mut block = Vec::new();
        for (i, line) in self.lines.by_ref() {
            if line.trim().is_empty() {
                if block.is_empty() {
                    continue;
                }
                break;
            }
            block.push((i + 1, line));
        }

        if block.is_empty() {
            None
        } else {
            Some(block)
        }
    }
}

impl<'p, 't> Iterator for SubtitleRecords<'p, 't> {
    type Item = Result<SubtitleRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let Some(block) = self.next_block() else {
            self.finished = true;
            return None;
        };

        let result = self
            .parser
            .parse_block(&block, &mut self.notation)
            .and_then(|record| {
                if let Some(last) = self.last_start_ms {
                    if record.frame_start_ms < last {
                        return Err(Error::format(
                            block[1].0,
                            format!(
                                "caption {} starts at {} ms, before the previous caption at {} ms",
                                record.index, record.frame_start_ms, last
                            ),
                        ));
                    }
                }
                if let (Some(last), Some(count)) = (self.last_frame_count, record.frame_count) {
                    if count <= last {
                        return Err(Error::format(
                            block[1].0,
                            format!(
                                "caption {} has frame count {}, not after the previous {}",
                                record.index, count, last
                            ),
                        ));
                    }
                }
                self.last_start_ms = Some(record.frame_start_ms);
                if record.frame_count.is_some() {
                    self.last_frame_count = record.frame_count;
                }
                Ok(record)
            });

        if result.is_err() {
            self.finished = true;
        }
        Some(result)
    }
}

impl std::iter::FusedIterator for SubtitleRecords<'_, '_> {}

/// Length of the recording covered by the captions
pub fn recording_duration(records: &[SubtitleRecord]) -> Duration {
    Duration::milliseconds(records.iter().map(|r| r.frame_end_ms).max().unwrap_or(0))
}

/// Fill in `absolute_time` for every record.
///
/// The drone's own wall clock wins when a caption carries one; it is local
/// time and gets converted to UTC. Other captions are placed at
/// `recording_start` plus their offset into the video.
pub fn apply_recording_start(records: &mut [SubtitleRecord], recording_start: Option<DateTime<Utc>>) {
    for record in records.iter_mut() {
        let from_clock = record
            .embedded_time
            .and_then(|t| Local.from_local_datetime(&t).earliest())
            .map(|t| t.with_timezone(&Utc));
        let from_offset =
            recording_start.map(|start| start + Duration::milliseconds(record.frame_start_ms));

        record.absolute_time = from_clock.or(from_offset);
    }
}

fn number<T: FromStr>(value: &str, line: usize, key: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::format(line, format!("invalid {} value '{}'", key, value)))
}

/// Accepts plain numbers and fractions such as `-1/3`
fn fraction(value: &str, line: usize, key: &str) -> Result<f64> {
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = number(num, line, key)?;
            let den: f64 = number(den, line, key)?;
            if den == 0.0 {
                return Err(Error::format(line, format!("invalid {} value '{}'", key, value)));
            }
            Ok(num / den)
        }
        None => number(value, line, key),
    }
}

/// Some firmware writes the f-number in hundredths (280 for f/2.8)
fn f_number(value: f64) -> f64 {
    if value >= 100.0 {
        value / 100.0
    } else {
        value
    }
}

fn split_hemisphere(value: &str) -> (Option<char>, &str) {
    let is_hemisphere = |c: char| matches!(c.to_ascii_uppercase(), 'N' | 'S' | 'E' | 'W');

    match (value.chars().next(), value.chars().last()) {
        (Some(c), _) if is_hemisphere(c) => (Some(c.to_ascii_uppercase()), value[1..].trim()),
        (_, Some(c)) if is_hemisphere(c) => (
            Some(c.to_ascii_uppercase()),
            value[..value.len() - 1].trim(),
        ),
        _ => (None, value),
    }
}

/// Signed decimal degrees from `-41.36214`, `N 36.27423` or `41.36214W`
fn coordinate(value: &str, axis: Axis, line: usize) -> Result<f64> {
    let (hemisphere, digits) = split_hemisphere(value.trim());
    let magnitude: f64 = number(digits, line, axis.name())?;

    match (axis, hemisphere) {
        (_, None) => Ok(magnitude),
        (Axis::Latitude, Some('N')) | (Axis::Longitude, Some('E')) => Ok(magnitude.abs()),
        (Axis::Latitude, Some('S')) | (Axis::Longitude, Some('W')) => Ok(-magnitude.abs()),
        (_, Some(h)) => Err(Error::format(
            line,
            format!("hemisphere '{}' does not apply to {}", h, axis.name()),
        )),
    }
}

/// `(lon, lat[, extra])`, or any order when every coordinate carries a hemisphere letter
fn gps_tuple(inner: &str, line: usize) -> Result<Option<(f64, f64)>> {
    let parts: Vec<&str> = inner
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    match parts.len() {
        0 => return Ok(None),
        1 => {
            return Err(Error::format(
                line,
                format!("GPS tuple '{}' needs two coordinates", inner.trim()),
            ))
        }
        _ => {}
    }

    let lettered: Vec<(char, &str)> = parts
        .iter()
        .filter_map(|p| match split_hemisphere(p) {
            (Some(h), _) => Some((h, *p)),
            (None, _) => None,
        })
        .collect();

    if lettered.is_empty() {
        let lon = coordinate(parts[0], Axis::Longitude, line)?;
        let lat = coordinate(parts[1], Axis::Latitude, line)?;
        return Ok(Some((lat, lon)));
    }

    let find = |axis: Axis| -> Result<f64> {
        let letters = match axis {
            Axis::Latitude => ['N', 'S'],
            Axis::Longitude => ['E', 'W'],
        };
        let (_, text) = lettered
            .iter()
            .find(|(h, _)| letters.contains(h))
            .ok_or_else(|| Error::format(line, format!("GPS tuple has no {}", axis.name())))?;
        coordinate(text, axis, line)
    };
    Ok(Some((find(Axis::Latitude)?, find(Axis::Longitude)?)))
}

fn wall_clock(caps: &Captures) -> Option<NaiveDateTime> {
    let field = |i: usize| caps[i].parse::<u32>().ok();
    let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, field(2)?, field(3)?)?;

    let nanos = match caps.get(7) {
        Some(frac) => {
            let digits = frac.as_str();
            digits.parse::<u32>().ok()? * 10u32.pow(9 - digits.len() as u32)
        }
        None => 0,
    };
    let time = NaiveTime::from_hms_nano_opt(field(4)?, field(5)?, field(6)?, nanos)?;

    Some(date.and_time(time))
}
