use anyhow::{Context, Result};
use blametodo::{cli, config, git, reporter, scanner};
use clap::Parser;
use log::{debug, info};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    scan_command(cli)
}

fn scan_command(args: cli::Cli) -> Result<()> {
    info!("Scanning: {}", args.path.display());

    // Load configuration
    let config =
        config::load_config(args.config.as_deref()).context("Failed to load configuration")?;
    debug!("Using config: {:?}", config);

    let blame = git::blame_source_for(&config, &args.path)
        .context("Failed to set up git attribution")?;

    let scanner = scanner::Scanner::new(&config, blame.as_ref())
        .context("Failed to compile comment patterns")?;

    // Nothing is written until every file has been scanned and attributed
    let report = scanner
        .scan_directory(&args.path)
        .context("Failed to scan directory")?;

    reporter::generate_report(&report, args.format, args.output.as_deref())
        .context("Failed to generate report")?;

    Ok(())
}
