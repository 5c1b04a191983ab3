//! GPX 1.1 track output.
//!
//! ```xml
//! <gpx version="1.1" creator="djiutil" xmlns="http://www.topografix.com/GPX/1/1">
//!   <trk>
//!     <name>DJI_0031</name>
//!     <trkseg>
//!       <trkpt lat="36.27423" lon="-41.36214">
//!         <ele>46</ele>
//!         <time>2023-08-28T15:26:58.889Z</time>
//!         <extensions><djiutil:altitudeRef>takeoff</djiutil:altitudeRef></extensions>
//!       </trkpt>
//!     </trkseg>
//!   </trk>
//! </gpx>
//! ```
//!
//! `<ele>` is whatever the drone reported. The `altitudeRef` extension says
//! whether that is above takeoff, above sea level, or unknown.

use crate::error::{Error, Result};
use crate::models::{Altitude, AltitudeReference, SubtitleRecord, TrackDocument, TrackPoint};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";
pub const EXTENSION_NAMESPACE: &str = "urn:djiutil:gpx:1";
pub const GPX_EXTENSION: &str = "gpx";
const GPX_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub struct TrackWriter {
    creator: String,
}

impl TrackWriter {
    pub fn new() -> Self {
        Self {
            creator: "djiutil".to_string(),
        }
    }

    /// One point per record with a GPS fix, in record order
    pub fn build(&self, name: &str, records: &[SubtitleRecord]) -> TrackDocument {
        let mut track = TrackDocument::new(name);
        track.points = records
            .iter()
            .filter_map(|record| {
                let (latitude, longitude) = record.gps_fix()?;
                Some(TrackPoint {
                    latitude,
                    longitude,
                    elevation: record.altitude,
                    time: record.absolute_time,
                })
            })
            .collect();
        track
    }

    /// Serialize records straight to GPX text
    pub fn write(&self, name: &str, records: &[SubtitleRecord]) -> String {
        self.serialize(&self.build(name, records))
    }

    pub fn serialize(&self, track: &TrackDocument) -> String {
        let mut xml = String::new();
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str(&format!(
            "<gpx version=\"1.1\" creator=\"{}\" xmlns=\"{}\" xmlns:djiutil=\"{}\">\n",
            escape_xml(&self.creator),
            GPX_NAMESPACE,
            EXTENSION_NAMESPACE
        ));
        xml.push_str("  <trk>\n");
        xml.push_str(&format!("    <name>{}</name>\n", escape_xml(&track.name)));
        xml.push_str("    <trkseg>\n");

        for point in &track.points {
            xml.push_str(&format!(
                "      <trkpt lat=\"{}\" lon=\"{}\">\n",
                point.latitude, point.longitude
            ));
            if let Some(elevation) = &point.elevation {
                xml.push_str(&format!("        <ele>{}</ele>\n", elevation.meters));
            }
            if let Some(time) = &point.time {
                xml.push_str(&format!(
                    "        <time>{}</time>\n",
                    time.format(GPX_TIME_FORMAT)
                ));
            }
            if let Some(elevation) = &point.elevation {
                xml.push_str(&format!(
                    "        <extensions><djiutil:altitudeRef>{}</djiutil:altitudeRef></extensions>\n",
                    elevation.reference.as_str()
                ));
            }
            xml.push_str("      </trkpt>\n");
        }

        xml.push_str("    </trkseg>\n");
        xml.push_str("  </trk>\n");
        xml.push_str("</gpx>\n");

        xml
    }

    pub fn write_file(&self, track: &TrackDocument, path: &Path) -> Result<()> {
        fs::write(path, self.serialize(track)).map_err(|e| Error::io(path, e))
    }
}

impl Default for TrackWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// `DJI_0031.SRT` -> `DJI_0031.gpx`, next to the subtitle file
pub fn default_output_path(subtitle_path: &Path) -> PathBuf {
    subtitle_path.with_extension(GPX_EXTENSION)
}

/// Read a GPX track back, e.g. to check a conversion
pub fn read_track(xml: &str) -> Result<TrackDocument> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| Error::format(e.pos().row as usize, format!("XML parse error: {}", e)))?;

    let root = doc.root_element();
    if root.tag_name().name() != "gpx" {
        return Err(Error::format(1, "root element must be <gpx>"));
    }

    let name = root
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "trk")
        .and_then(|trk| child_text(trk, "name"))
        .unwrap_or_default();
    let mut track = TrackDocument::new(name);

    for node in root
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "trkpt")
    {
        let line = doc.text_pos_at(node.range().start).row as usize;
        let coordinate = |attr: &str| -> Result<f64> {
            node.attribute(attr)
                .and_then(|v| v.trim().parse().ok())
                .ok_or_else(|| Error::format(line, format!("track point has no valid {} attribute", attr)))
        };

        let elevation = match child_text(node, "ele") {
            Some(text) => {
                let meters: f64 = text
                    .parse()
                    .map_err(|_| Error::format(line, format!("invalid elevation '{}'", text)))?;
                let reference = node
                    .descendants()
                    .find(|n| n.is_element() && n.tag_name().name() == "altitudeRef")
                    .and_then(|n| n.text())
                    .and_then(|t| AltitudeReference::from_tag(t.trim()))
                    .unwrap_or(AltitudeReference::Unspecified);
                Some(Altitude::new(meters, reference))
            }
            None => None,
        };

        let time = match child_text(node, "time") {
            Some(text) => Some(
                DateTime::parse_from_rfc3339(&text)
                    .map_err(|_| Error::format(line, format!("invalid time '{}'", text)))?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        track.points.push(TrackPoint {
            latitude: coordinate("lat")?,
            longitude: coordinate("lon")?,
            elevation,
            time,
        });
    }

    Ok(track)
}

/// Trimmed text of the first child element called `name`
fn child_text(node: roxmltree::Node, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
