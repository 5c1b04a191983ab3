mod shot;
mod telemetry;
mod track;

pub use shot::{ListingRecord, MediaKind, Shot, TimestampSource};
pub use telemetry::{Altitude, AltitudeReference, SubtitleRecord};
pub use track::{TrackDocument, TrackPoint};
