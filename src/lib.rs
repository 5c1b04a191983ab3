//! Drone media housekeeping: group a drone's files into shots, select them by
//! date or index, and turn their telemetry subtitles into GPX tracks.

pub mod error;
pub mod models;
pub mod services;

pub use error::{Error, Result};
