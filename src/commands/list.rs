use super::{selected_shots, FilterArgs};
use anyhow::Result;
use chrono::{Duration, Local};
use djiutil::models::{ListingRecord, Shot};
use std::path::Path;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const LRF_MARKER: &str = " [LRF]";
const SRT_MARKER: &str = " [SRT]";
const SPACING: &str = "      ";

/// Print the shots in `dir`, either as a table or as JSON listing records
pub fn list(dir: &Path, filters: &FilterArgs, json: bool, gap_minutes: u32) -> Result<()> {
    let shots = selected_shots(dir, filters)?;

    if json {
        let records: Vec<ListingRecord> = shots.iter().map(Shot::listing).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if shots.is_empty() {
        println!("No drone files found in {}", dir.display());
        return Ok(());
    }

    for line in format_table(&shots, Duration::minutes(gap_minutes as i64)) {
        println!("{}", line);
    }
    Ok(())
}

/// One line per shot. An empty line separates shots recorded more than `gap` apart.
fn format_table(shots: &[Shot], gap: Duration) -> Vec<String> {
    let names: Vec<String> = shots.iter().map(|s| group_thousands(s.index)).collect();
    let name_width = names.iter().map(String::len).max().unwrap_or(0);

    let labels: Vec<String> = shots
        .iter()
        .zip(&names)
        .map(|(shot, name)| {
            let mut label = format!("{:>width$}", name, width = name_width);
            if shot.has_lrf() {
                label.push_str(LRF_MARKER);
            }
            if shot.has_srt() {
                label.push_str(SRT_MARKER);
            }
            label
        })
        .collect();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut lines = Vec::with_capacity(shots.len());
    let mut previous: Option<&Shot> = None;

    for (shot, label) in shots.iter().zip(&labels) {
        if let Some(prev) = previous {
            if shot.created_at - prev.created_at > gap {
                lines.push(String::new());
            }
        }
        let created = shot.created_at.with_timezone(&Local).format(DATETIME_FORMAT);
        lines.push(format!(
            "{:<width$}{}{}{}{}",
            label,
            SPACING,
            created,
            SPACING,
            format_file_size(shot.size_bytes),
            width = label_width
        ));
        previous = Some(shot);
    }

    lines
}

/// Human readable size, 1024 based: `512B`, `3.5K`, `700M`, `1.2G`
pub fn format_file_size(size_bytes: u64) -> String {
    let mut size = size_bytes as f64;
    for unit in ["B", "K", "M", "G"] {
        if size < 1024.0 {
            let precision = if unit == "G" || size < 10.0 { 1 } else { 0 };
            return format!("{:3.*}{}", precision, size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1}T", size)
}

/// `1234` -> `1,234`
fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use djiutil::models::TimestampSource;
    use std::path::PathBuf;

    fn make_shot(index: u32, minute: u32, lrf: bool, srt: bool) -> Shot {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap();
        let mut shot = Shot::new(
            index,
            PathBuf::from(format!("DJI_{index:04}.MP4")),
            created,
            TimestampSource::Birth,
            2048,
        );
        if lrf {
            shot.low_res_path = Some(PathBuf::from(format!("DJI_{index:04}.LRF")));
        }
        if srt {
            shot.subtitle_path = Some(PathBuf::from(format!("DJI_{index:04}.SRT")));
        }
        shot
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0.0B");
        assert_eq!(format_file_size(512), "512B");
        assert_eq!(format_file_size(3584), "3.5K");
        assert_eq!(format_file_size(700 * 1024 * 1024), "700M");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5.0G");
        assert_eq!(format_file_size(2 * 1024 * 1024 * 1024 * 1024), "2.0T");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(31), "31");
        assert_eq!(group_thousands(1234), "1,234");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_table_markers_and_gaps() {
        let shots = vec![
            make_shot(31, 0, false, false),
            make_shot(32, 5, false, true),
            make_shot(33, 30, true, true),
        ];

        let lines = format_table(&shots, Duration::minutes(10));

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("31      "));
        assert!(lines[1].starts_with("32 [SRT]"));
        assert!(lines[2].is_empty());
        assert!(lines[3].starts_with("33 [LRF] [SRT]"));
        assert!(lines[3].ends_with("2.0K"));
    }
}
