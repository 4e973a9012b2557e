use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use photomosaic::{render_division, render_mosaic, Config, Mosaic};

#[derive(Parser, Debug)]
#[command(name = "photomosaic", version, about = "Photomosaic generator")]
struct Cli {
    /// JSON config file
    #[arg(default_value = "config.json")]
    config: PathBuf,

    /// RNG seed for the annealing search
    #[arg(long, default_value_t = 0xDEADBEEF)]
    seed: u64,

    /// draw only the cell partition (overrides the config flag)
    #[arg(long)]
    show_division: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    // name the rayon workers once at startup so profiles read nicely
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)?;
    if cli.show_division {
        config.show_division = true;
    }

    let mosaic = Mosaic::generate(&config, cli.seed)?;
    if config.show_division {
        render_division(&mosaic, config.output_scale)
            .save(&config.output)
            .with_context(|| format!("cannot write {}", config.output.display()))?;
    } else {
        render_mosaic(&mosaic, config.output_scale)
            .save(&config.output)
            .with_context(|| format!("cannot write {}", config.output.display()))?;
    }
    info!("wrote {}", config.output.display());
    Ok(())
}
