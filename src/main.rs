use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use temporal_aa::harness::{self, HarnessOpts};
use temporal_aa::taa::config;

#[derive(Parser, Debug)]
#[command(name = "temporal_aa")]
#[command(about = "Drive the temporal AA stage over an aliased test pattern")]
struct Cli {
    /// Number of frames to render
    #[arg(long, default_value_t = 32)]
    frames: u32,

    #[arg(long, default_value_t = 160)]
    width: u32,

    #[arg(long, default_value_t = 90)]
    height: u32,

    /// Toggle the stage on/off every N frames (0 = never)
    #[arg(long, default_value_t = 0)]
    toggle_every: u32,

    /// TOML config (defaults to data/config/taa.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run on a headless wgpu device instead of the CPU backend
    #[arg(long)]
    gpu: bool,
}

fn main() -> Result<()> {
    // info+ unless RUST_LOG overrides; GPU backend chatter off by default.
    let default = "info,temporal_aa=info,taa_core=info,wgpu_hal=off,wgpu_core=off,wgpu=off,naga=off";
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp_secs()
        .try_init();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => config::load_from(path)?,
        None => config::load_default()?,
    };
    log::info!("config: {cfg:?}");
    let opts = HarnessOpts {
        frames: cli.frames,
        width: cli.width,
        height: cli.height,
        toggle_every: cli.toggle_every,
    };
    let report = if cli.gpu {
        harness::run_gpu(&opts, &cfg)?
    } else {
        harness::run_cpu(&opts, &cfg)?
    };
    if report.leaked > 0 {
        anyhow::bail!("{} buffers still live after shutdown", report.leaked);
    }
    Ok(())
}
