use clap::Parser;
use std::path::PathBuf;

mod commands;
mod logging;

use commands::Commands;

#[derive(Parser)]
#[command(name = "tiercache")]
#[command(about = "Inspect and exercise a two-tier cache directory", long_about = None)]
#[command(version)]
struct Cli {
    /// Disk tier directory (overrides configuration)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    logging::init()?;

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.dir)?;
    cli.command.execute(config)
}
