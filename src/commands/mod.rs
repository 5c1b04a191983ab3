mod convert;
mod housekeeping;
mod import;
mod list;
mod play;

pub use convert::convert;
pub use housekeeping::{clean, delete};
pub use import::{import, ImportOptions};
pub use list::list;
pub use play::play;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use djiutil::models::Shot;
use djiutil::services::{FileCatalog, Selection};
use std::path::Path;
use tracing::debug;

/// Shot filters shared by every command that acts on several shots
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Date filter: YYYY-MM-DD, or an age such as <2d (newer) or >3w (older)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Index selector such as 3,5-9,12
    #[arg(short, long)]
    pub index: Option<String>,
}

impl FilterArgs {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.index.is_none()
    }

    pub fn selection(&self) -> Result<Selection> {
        Selection::from_filters(self.date.as_deref(), self.index.as_deref(), Utc::now())
            .context("Invalid shot filter")
    }
}

/// Scan `dir` and keep the shots the filters select
fn selected_shots(dir: &Path, filters: &FilterArgs) -> Result<Vec<Shot>> {
    let selection = filters.selection()?;
    let shots = FileCatalog::new()
        .scan(dir)
        .with_context(|| format!("Failed to scan {}", dir.display()))?;

    let selected: Vec<Shot> = selection.select(&shots).into_iter().cloned().collect();
    debug!("{} of {} shots selected", selected.len(), shots.len());
    Ok(selected)
}
