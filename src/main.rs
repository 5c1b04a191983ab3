//! djiutil - manage drone footage and convert flight telemetry to GPX

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod external;

use commands::FilterArgs;
use config::Settings;
use external::{CopyTool, Player};

#[derive(Parser)]
#[command(name = "djiutil")]
#[command(about = "Manage files created by DJI drones")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = config::CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List shots with their companion files, times and sizes
    List {
        /// Drone mount root or media directory
        dir: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Print listing records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert subtitle telemetry (.SRT) to GPX
    Convert {
        /// Subtitle file, or a directory to convert every selected shot
        source: PathBuf,

        /// Output GPX path (next to the subtitle file if omitted)
        output: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Delete low resolution preview (.LRF) files
    Clean {
        dir: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Actually delete instead of listing what would be deleted
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete every file of the selected shots
    Delete {
        dir: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Select every shot
        #[arg(long)]
        all: bool,

        /// Actually delete instead of listing what would be deleted
        #[arg(short, long)]
        yes: bool,
    },

    /// Copy shots to the import directory
    Import {
        dir: Option<PathBuf>,

        /// Destination directory
        dest: Option<PathBuf>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Also copy subtitle files
        #[arg(long)]
        with_srt: bool,

        /// Also copy low resolution previews
        #[arg(long)]
        with_lrf: bool,
    },

    /// Play one shot
    Play {
        /// Shot index, or a directory followed by the index
        #[arg(num_args = 1..=2, required = true)]
        args: Vec<String>,

        /// Play the low resolution preview
        #[arg(long)]
        low_res: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run the command. `Ok(false)` means it finished but some work failed.
fn run(cli: Cli) -> Result<bool> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::List { dir, filters, json } => {
            let dir = settings.media_dir(dir)?;
            commands::list(&dir, &filters, json, settings.gap_minutes)?;
        }
        Commands::Convert {
            source,
            output,
            filters,
        } => {
            return commands::convert(&source, output.as_deref(), &filters);
        }
        Commands::Clean { dir, filters, yes } => {
            let dir = settings.media_dir(dir)?;
            commands::clean(&dir, &filters, yes)?;
        }
        Commands::Delete {
            dir,
            filters,
            all,
            yes,
        } => {
            let dir = settings.media_dir(dir)?;
            commands::delete(&dir, &filters, all, yes)?;
        }
        Commands::Import {
            dir,
            dest,
            filters,
            with_srt,
            with_lrf,
        } => {
            let dir = settings.media_dir(dir)?;
            let dest = settings.import_dir(dest)?;
            let tool = CopyTool::new(&settings.copy_tool, &settings.copy_args)?;
            let options = commands::ImportOptions { with_srt, with_lrf };
            commands::import(&dir, &dest, &filters, options, &tool)?;
        }
        Commands::Play { args, low_res } => {
            let (dir, index) = match args.as_slice() {
                [index] => (None, index),
                [dir, index] => (Some(PathBuf::from(dir)), index),
                _ => anyhow::bail!("expected [DIR] INDEX"),
            };
            let index: u32 = index
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid shot index '{}'", index))?;
            let dir = settings.media_dir(dir)?;
            let player = Player::new(&settings.player)?;
            commands::play(&dir, index, low_res, &player)?;
        }
    }

    Ok(true)
}
