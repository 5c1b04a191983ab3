use super::{selected_shots, FilterArgs};
use anyhow::{bail, Context, Result};
use djiutil::models::Shot;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Remove the low resolution previews of the selected shots
pub fn clean(dir: &Path, filters: &FilterArgs, confirmed: bool) -> Result<()> {
    let shots = selected_shots(dir, filters)?;
    let files: Vec<PathBuf> = shots
        .iter()
        .filter_map(|shot| shot.low_res_path.clone())
        .collect();

    remove_files(&files, confirmed)
}

/// Remove every file of the selected shots
pub fn delete(dir: &Path, filters: &FilterArgs, all: bool, confirmed: bool) -> Result<()> {
    if filters.is_empty() && !all {
        bail!("refusing to delete without --date, --index or --all");
    }
    if !filters.is_empty() && all {
        bail!("--all cannot be combined with --date or --index");
    }

    let shots = selected_shots(dir, filters)?;
    remove_files(&shot_files(&shots), confirmed)
}

fn shot_files(shots: &[Shot]) -> Vec<PathBuf> {
    shots
        .iter()
        .flat_map(|shot| shot.files().into_iter().map(Path::to_path_buf))
        .collect()
}

/// Without confirmation only report what would go
fn remove_files(files: &[PathBuf], confirmed: bool) -> Result<()> {
    if files.is_empty() {
        println!("Nothing to remove");
        return Ok(());
    }

    if !confirmed {
        for file in files {
            println!("would remove {}", file.display());
        }
        println!("{} files; run again with --yes to remove them", files.len());
        return Ok(());
    }

    for file in files {
        fs::remove_file(file).with_context(|| format!("Failed to remove {}", file.display()))?;
        println!("removed {}", file.display());
    }
    info!("removed {} files", files.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "data").unwrap();
        }
    }

    #[test]
    fn test_clean_removes_only_previews() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["DJI_0001.MP4", "DJI_0001.LRF", "DJI_0001.SRT", "DJI_0002.MP4", "DJI_0002.LRF"]);
        let filters = FilterArgs {
            index: Some("1".to_string()),
            ..FilterArgs::default()
        };

        clean(dir.path(), &filters, true).unwrap();

        assert!(dir.path().join("DJI_0001.MP4").exists());
        assert!(dir.path().join("DJI_0001.SRT").exists());
        assert!(!dir.path().join("DJI_0001.LRF").exists());
        assert!(dir.path().join("DJI_0002.LRF").exists());
    }

    #[test]
    fn test_dry_run_keeps_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["DJI_0001.MP4", "DJI_0001.LRF"]);

        clean(dir.path(), &FilterArgs::default(), false).unwrap();
        delete(dir.path(), &FilterArgs::default(), true, false).unwrap();

        assert!(dir.path().join("DJI_0001.LRF").exists());
        assert!(dir.path().join("DJI_0001.MP4").exists());
    }

    #[test]
    fn test_delete_requires_filter_or_all() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["DJI_0001.MP4"]);

        assert!(delete(dir.path(), &FilterArgs::default(), false, true).is_err());
        assert!(dir.path().join("DJI_0001.MP4").exists());
    }

    #[test]
    fn test_delete_removes_whole_shot() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["DJI_0001.MP4", "DJI_0001.LRF", "DJI_0001.SRT", "DJI_0002.MP4"]);
        let filters = FilterArgs {
            index: Some("1".to_string()),
            ..FilterArgs::default()
        };

        delete(dir.path(), &filters, false, true).unwrap();

        assert!(!dir.path().join("DJI_0001.MP4").exists());
        assert!(!dir.path().join("DJI_0001.LRF").exists());
        assert!(!dir.path().join("DJI_0001.SRT").exists());
        assert!(dir.path().join("DJI_0002.MP4").exists());
    }
}
