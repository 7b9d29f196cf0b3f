//! Roundplot - charts for consensus round measurements
//!
//! A CLI tool that reads `round,participant,value` CSV files and draws
//! round latency, per-round throughput and throughput-by-player-count
//! charts as SVG.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (bad arguments, unreadable or malformed input, render failure)

mod analysis;
mod cli;
mod config;
mod error;
mod ingest;
mod models;
mod plots;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Roundplot v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Plot failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .roundplot.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize file names, player counts, titles, and axes.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(args, env.as_deref()))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// `-v`/`-q` win; otherwise `RUST_LOG` when it parses, else the default level.
fn log_filter(args: &Args, env: Option<&str>) -> EnvFilter {
    let from_flags = || {
        EnvFilter::default().add_directive(LevelFilter::from_level(args.log_level()).into())
    };

    if args.verbose || args.quiet {
        return from_flags();
    }

    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(from_flags)
}

/// Build the requested chart and write it out. Returns the exit code.
fn run(args: Args) -> Result<i32> {
    let start_time = Instant::now();

    // `--plot` is required unless --init-config, which returned earlier
    let kind = args
        .plot
        .context("No plot selected; pass --plot latency|per-round|read|write")?;

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);
    config.validate().context("Invalid configuration")?;

    // Step 1: Load and aggregate
    println!("📥 Loading {} data...", kind);
    let summary = plots::build_plot(kind, &config, !args.quiet)
        .with_context(|| format!("Failed to build the {} plot", kind))?;

    // Step 2: Summary
    if !args.quiet {
        println!("\n{}", report::generate_text_summary(&summary));
    }

    // Handle --dry-run: nothing is written
    if args.dry_run {
        println!("✅ Dry run complete. No files were written.");
        return Ok(0);
    }

    // Step 3: Write the chart or the data
    let output = output_path(&args, &config);
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    match args.format {
        OutputFormat::Svg => {
            println!("🎨 Rendering {} chart...", summary.chart.style);
            report::render_svg(&summary.chart, &output, report::DEFAULT_SIZE)
                .with_context(|| format!("Failed to render {}", output.display()))?;
        }
        OutputFormat::Json => {
            report::write_json_summary(&summary, &output)?;
        }
    }

    println!(
        "✅ Done in {:.2}s! Output saved to: {}",
        start_time.elapsed().as_secs_f64(),
        output.display()
    );

    Ok(0)
}

/// Resolve the output file, switching the default name to `.json` for JSON output.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);

    if args.output.is_none() && args.format == OutputFormat::Json {
        return path.with_extension("json");
    }

    path
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    load_config_in(args, Path::new("."))
}

/// Explicit `--config` first, then `dir/.roundplot.toml`, then defaults.
///
/// A config file that exists but cannot be read or parsed fails the run.
fn load_config_in(args: &Args, dir: &Path) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default_in(dir)? {
        Some(config) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        None => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
    }
}
