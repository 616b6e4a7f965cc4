//! linsim entry point.
//!
//! ```bash
//! linsim                        # ~/.config/linsim/linsim.toml, if present
//! linsim --config /etc/linsim.toml
//! linsim --print-config         # show the effective configuration and exit
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use linsim_server::config::Config;
use linsim_server::{logging, VERSION};

#[derive(Debug, Parser)]
#[command(name = "linsim", version, about = "Simulated Linux host")]
struct Args {
    /// Configuration file (default: ~/.config/linsim/linsim.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        let config = Config::load(args.config.as_deref())?;
        print!("{}", config.effective()?.to_toml()?);
        return Ok(());
    }

    println!("linsim {VERSION}");
    println!("Parsing configuration file...");
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    logging::init(&config.log_path()?, &config.log_filter)?;
    tracing::info!(version = VERSION, "starting linsim");

    linsim_server::run(config)
}
