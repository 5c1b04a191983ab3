pub mod catalog;
pub mod convert;
pub mod filename;
pub mod filter;
pub mod gpx;
pub mod selection;
pub mod srt_parser;

pub use catalog::FileCatalog;
pub use convert::{ConversionOutcome, ConversionReport, ConvertedTrack, Converter, TimeAnchor};
pub use filename::{FilenameGrammar, MediaName};
pub use filter::{DateFilter, IndexSelector};
pub use selection::{Criteria, Selection};
pub use srt_parser::{SrtParser, TelemetryNotation};
pub use gpx::{read_track, TrackWriter};
