use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use productwatch::settings::CONFIG_FILE_ENV;
use productwatch::{CycleReport, Watcher, WatcherConfig};

#[derive(Parser, Debug)]
#[command(name = "productwatch")]
#[command(about = "Keep an eye on remote sensing product generation")]
#[command(version)]
struct Args {
    /// Path to the watcher configuration (YAML, TOML or JSON)
    #[arg(short, long, env = CONFIG_FILE_ENV)]
    config: PathBuf,

    /// Write the cycle report as JSON to this file
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set (e.g. "debug", "productwatch=trace")
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    // Nothing touches the network until the configuration is known good
    let config = match WatcherConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Cannot use config file {}: {}", args.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    match run(config, args.report.as_deref()) {
        Ok(()) => {
            debug!("That's all for now, bye.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(config: WatcherConfig, report_path: Option<&Path>) -> Result<()> {
    let watcher = Watcher::new(config).context("cannot set up network clients")?;
    info!(
        "Watching {} sensors across {} mirrors",
        watcher.config().sensors.len(),
        watcher.config().volcview.mirrors.len()
    );

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(watcher.run(chrono::Utc::now()));

    if let Some(path) = report_path {
        // The cycle itself succeeded; a report we cannot write is only logged
        if let Err(e) = write_report(&report, path) {
            error!("Unable to write report to {}: {:#}", path.display(), e);
        }
    }

    Ok(())
}

fn write_report(report: &CycleReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote cycle report to {}", path.display());
    Ok(())
}
