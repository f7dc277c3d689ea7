use anyhow::Result;
use clap::Parser;

use butterfly_hierarchy::cli::{run, Cli};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    run(cli)
}
