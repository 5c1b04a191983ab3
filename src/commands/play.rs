use crate::external::Player;
use anyhow::{anyhow, Context, Result};
use djiutil::services::FileCatalog;
use std::path::Path;

/// Open one shot in the player, optionally its low resolution preview
pub fn play(dir: &Path, index: u32, low_res: bool, player: &Player) -> Result<()> {
    let shots = FileCatalog::new()
        .scan(dir)
        .with_context(|| format!("Failed to scan {}", dir.display()))?;
    let shot = shots
        .iter()
        .find(|s| s.index == index)
        .ok_or_else(|| anyhow!("no shot with index {} in {}", index, dir.display()))?;

    let video = if low_res {
        shot.low_res_path
            .as_deref()
            .ok_or_else(|| anyhow!("shot {} has no low resolution preview", index))?
    } else {
        shot.video_path.as_path()
    };

    player.play(video)
}
