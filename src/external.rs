//! Programs djiutil hands work to: the copy tool and the video player

use anyhow::{anyhow, Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

pub struct CopyTool {
    program: String,
    args: Vec<String>,
}

impl CopyTool {
    pub fn new(program: &str, args: &[String]) -> Result<Self> {
        Ok(Self {
            program: which_command(program)?,
            args: args.to_vec(),
        })
    }

    /// Copy all `files` into `dest` with a single invocation
    pub fn copy<P: AsRef<Path>>(&self, files: &[P], dest: &Path) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        std::fs::create_dir_all(dest)
            .with_context(|| format!("Failed to create {}", dest.display()))?;

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command.args(files.iter().map(|f| f.as_ref()));
        command.arg(dest_arg(dest));
        debug!("running {:?}", command);

        let status = command
            .status()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        if !status.success() {
            return Err(anyhow!("{} exited with {}", self.program, status));
        }

        info!("copied {} files to {}", files.len(), dest.display());
        Ok(())
    }
}

pub struct Player {
    program: String,
}

impl Player {
    pub fn new(program: &str) -> Result<Self> {
        Ok(Self {
            program: which_command(program)?,
        })
    }

    /// Play a video and wait for the player to exit
    pub fn play(&self, video: &Path) -> Result<()> {
        let status = Command::new(&self.program)
            .arg(video)
            .status()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        if !status.success() {
            return Err(anyhow!("{} exited with {}", self.program, status));
        }

        Ok(())
    }
}

/// A trailing slash makes rsync-style tools treat the destination as a directory
fn dest_arg(dest: &Path) -> OsString {
    let mut arg = dest.as_os_str().to_os_string();
    if !arg.to_string_lossy().ends_with('/') {
        arg.push("/");
    }
    arg
}

fn which_command(name: &str) -> Result<String> {
    if Path::new(name).is_absolute() {
        return Ok(name.to_string());
    }

    let output = Command::new("which")
        .arg(name)
        .output()
        .context(format!("Failed to find {name}"))?;

    if !output.status.success() {
        return Err(anyhow!("{} not found in PATH", name));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dest_arg_adds_slash() {
        assert_eq!(dest_arg(Path::new("/srv/footage")), OsString::from("/srv/footage/"));
        assert_eq!(dest_arg(Path::new("/srv/footage/")), OsString::from("/srv/footage/"));
    }

    #[test]
    fn test_missing_program() {
        assert!(which_command("djiutil-no-such-program").is_err());
    }

    #[test]
    fn test_absolute_program_is_used_as_is() {
        assert_eq!(which_command("/usr/bin/mpv").unwrap(), "/usr/bin/mpv");
    }
}
