//! User settings

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_ENV: &str = "DJIUTIL_CONFIG";
pub const DIR_ENV: &str = "DJIUTIL_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Drone mount root used when no directory is given
    pub default_dir: Option<PathBuf>,

    /// Destination for `import`
    pub import_dir: Option<PathBuf>,

    /// Program used to copy files on import
    pub copy_tool: String,
    pub copy_args: Vec<String>,

    /// Video player for `play`
    pub player: String,

    /// Minutes between shots that start a new group in listings
    pub gap_minutes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_dir: None,
            import_dir: None,
            copy_tool: "rsync".to_string(),
            copy_args: vec!["-ah".to_string(), "--progress".to_string()],
            player: "mpv".to_string(),
            gap_minutes: 10,
        }
    }
}

impl Settings {
    /// Load settings from TOML. A missing file means defaults, unless the
    /// path was given explicitly (`--config` or `$DJIUTIL_CONFIG`).
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let Some(path) = config_path(explicit) else {
            return Ok(Self::default());
        };
        if !path.exists() {
            if explicit.is_some() {
                bail!("config file {} does not exist", path.display());
            }
            debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Media directory: explicit argument, then `$DJIUTIL_DIR`, then `default_dir`
    pub fn media_dir(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        explicit
            .or_else(|| std::env::var_os(DIR_ENV).map(PathBuf::from))
            .or_else(|| self.default_dir.clone())
            .with_context(|| {
                format!(
                    "no directory given; pass one, set ${} or default_dir in the config",
                    DIR_ENV
                )
            })
    }

    pub fn import_dir(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        explicit
            .or_else(|| self.import_dir.clone())
            .context("no import destination given; pass one or set import_dir in the config")
    }
}

fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| dirs::config_dir().map(|dir| dir.join("djiutil").join("config.toml")))
}
