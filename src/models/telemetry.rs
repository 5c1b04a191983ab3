use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// What an altitude value is measured against. Firmware decides this, so it
/// travels with the value instead of being assumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeReference {
    /// Height above the recorded home/takeoff point
    Takeoff,
    /// Height above mean sea level
    MeanSeaLevel,
    /// The firmware gives no indication
    Unspecified,
}

impl AltitudeReference {
    pub fn as_str(&self) -> &'static str {
        match self {
            AltitudeReference::Takeoff => "takeoff",
            AltitudeReference::MeanSeaLevel => "msl",
            AltitudeReference::Unspecified => "unspecified",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "takeoff" => Some(AltitudeReference::Takeoff),
            "msl" => Some(AltitudeReference::MeanSeaLevel),
            "unspecified" => Some(AltitudeReference::Unspecified),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Altitude {
    pub meters: f64,
    pub reference: AltitudeReference,
}

impl Altitude {
    pub fn new(meters: f64, reference: AltitudeReference) -> Self {
        Self { meters, reference }
    }
}

/// One caption block of a DJI subtitle file.
/// Blocks usually cover a single video frame (newer firmware) or one second (older firmware).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleRecord {
    /// Caption sequence number
    pub index: u32,
    /// Presentation start, milliseconds from the start of the video
    pub frame_start_ms: i64,
    /// Presentation end, milliseconds from the start of the video
    pub frame_end_ms: i64,
    /// FrameCnt / SrtCnt header value
    pub frame_count: Option<u32>,
    pub diff_time_ms: Option<u32>,
    /// Wall clock written by the drone, in the local time of the flight
    pub embedded_time: Option<NaiveDateTime>,
    /// Filled in once the recording start is known
    pub absolute_time: Option<DateTime<Utc>>,

    // GPS data
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Altitude used for tracks (relative to takeoff when the firmware offers it)
    pub altitude: Option<Altitude>,
    /// Second altitude some firmware reports next to the first
    pub alternate_altitude: Option<Altitude>,

    // Camera settings
    pub iso: Option<u32>,
    pub shutter: Option<String>, // e.g., "1/297.91"
    pub fnum: Option<f64>,
    pub ev: Option<f64>,
    pub color_temp: Option<u32>,
    pub color_mode: Option<String>,
    pub focal_len: Option<f64>,
}

impl SubtitleRecord {
    pub fn new(index: u32, frame_start_ms: i64, frame_end_ms: i64) -> Self {
        Self {
            index,
            frame_start_ms,
            frame_end_ms,
            frame_count: None,
            diff_time_ms: None,
            embedded_time: None,
            absolute_time: None,
            latitude: None,
            longitude: None,
            altitude: None,
            alternate_altitude: None,
            iso: None,
            shutter: None,
            fnum: None,
            ev: None,
            color_temp: None,
            color_mode: None,
            focal_len: None,
        }
    }

    /// (latitude, longitude) when the drone had a fix
    pub fn gps_fix(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}
