//! parkroute-parse - preview path routing from the command line
//!
//! Prints one JSON object per path, the same shape the preview-parse
//! endpoint returns in `data`.
//!
//! Usage:
//!   parkroute-parse plose-plosebob/IMG_2201.jpg
//!   parkroute-parse --parse-only a/IMG_2201.jpg b/IMG_0221.jpg
//!   parkroute-parse --config config/prod.toml < paths.txt

use anyhow::Context;
use clap::Parser;
use parkroute::domain::parse_filename;
use parkroute::infra::Config;
use parkroute::services::PathResolver;
use std::io::{self, BufRead, Write};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "parkroute-parse", version, about = "Parse and resolve photo storage paths")]
struct Args {
    /// Path to TOML configuration file (falls back to CONFIG_FILE, then config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Only run the parser, skip routing table lookups
    #[arg(long)]
    parse_only: bool,

    /// Storage paths; read from stdin (one per line) when omitted
    paths: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let paths = if args.paths.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read paths from stdin")?
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect()
    } else {
        args.paths
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.parse_only {
        for path in &paths {
            let line = serde_json::to_string(&parse_filename(path))?;
            writeln!(out, "{}", line)?;
        }
        return Ok(());
    }

    let config_path = Config::resolve_config_path(args.config.as_deref());
    let config = Config::load_from_path(&config_path).with_env_overrides();
    let resolver = PathResolver::new(parkroute::io::open_store(&config)?);

    let mut failures = 0usize;
    for path in &paths {
        match resolver.preview(path).await {
            Ok(preview) => writeln!(out, "{}", serde_json::to_string(&preview)?)?,
            Err(e) => {
                failures += 1;
                let line = serde_json::json!({ "path": path, "error": e.to_string() });
                writeln!(out, "{}", line)?;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} lookups failed", failures, paths.len());
    }
    Ok(())
}
