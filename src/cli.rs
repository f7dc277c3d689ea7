//! CLI commands for butterfly-hierarchy

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::hierarchy::HierarchyBuilder;

#[derive(Parser)]
#[command(name = "butterfly-hierarchy")]
#[command(about = "Build a multi-level routing graph hierarchy from base tiles", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build all hierarchy levels above the base level
    Build {
        /// JSON config file (overridden by the flags below)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root directory of the binary tiles
        #[arg(long)]
        tile_dir: Option<PathBuf>,

        /// Directory of .hgt elevation tiles for shortcut grades
        #[arg(long)]
        elevation: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build {
            config,
            tile_dir,
            elevation,
        } => {
            let mut config = match (config, &tile_dir) {
                (Some(path), _) => Config::from_file(&path)?,
                (None, Some(dir)) => Config::with_tile_dir(dir),
                (None, None) => {
                    anyhow::bail!("either --config or --tile-dir is required")
                }
            };
            if let Some(dir) = tile_dir {
                config.hierarchy.tile_dir = dir;
            }
            if let Some(dir) = elevation {
                config.additional_data.elevation = Some(dir);
            }

            HierarchyBuilder::build(&config)
        }
    }
}
