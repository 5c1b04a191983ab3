use super::{selected_shots, FilterArgs};
use crate::external::CopyTool;
use anyhow::Result;
use djiutil::models::Shot;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub with_srt: bool,
    pub with_lrf: bool,
}

/// Copy the selected shots' videos (and optionally companions) to `dest`
pub fn import(
    dir: &Path,
    dest: &Path,
    filters: &FilterArgs,
    options: ImportOptions,
    tool: &CopyTool,
) -> Result<()> {
    let shots = selected_shots(dir, filters)?;
    let files = import_files(&shots, options);

    if files.is_empty() {
        println!("Nothing to import");
        return Ok(());
    }

    tool.copy(&files, dest)
}

fn import_files(shots: &[Shot], options: ImportOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for shot in shots {
        files.push(shot.video_path.clone());
        if options.with_srt {
            files.extend(shot.subtitle_path.clone());
        }
        if options.with_lrf {
            files.extend(shot.low_res_path.clone());
        }
    }
    files
}
