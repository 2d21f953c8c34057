use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orgrank::collector::{CollectionReport, CollectionStatus};
use orgrank::config::{Config, Credentials};
use orgrank::output;
use orgrank::{ComparativeAnalyzer, GitHubClient, OrganizationCollector};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (TOML); orgrank.toml is used when present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the top repositories of each organization and write the dataset
    Collect,
    /// Compare organizations on the written dataset
    Analyze,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .init();

    println!(
        "{}",
        "orgrank - GitHub organization repository ranking"
            .bright_cyan()
            .bold()
    );

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    println!(
        "Organizations: {}",
        config.organizations.join(", ").bright_white()
    );

    match cli.command {
        Command::Collect => collect(&config).await,
        Command::Analyze => analyze(&config),
    }
}

async fn collect(config: &Config) -> Result<ExitCode> {
    let credentials = Credentials::from_env()?;
    let client = GitHubClient::from_config(config, &credentials)
        .context("Failed to build GitHub client")?;
    let collector = OrganizationCollector::from_config(&client, config);

    info!("Starting repository collection...");
    let report = collector.collect_all(&config.organizations).await;

    if !report.should_write_dataset() {
        warn!("No repository could be collected, leaving the dataset untouched");
        print_gaps(&report);
        println!("\n{}", "Collection failed".bright_red().bold());
        return Ok(ExitCode::from(report.exit_code()));
    }

    let dataset_path = Path::new(&config.dataset_path);
    orgrank::write_dataset(dataset_path, &report.records)
        .with_context(|| format!("Failed to write dataset to {}", config.dataset_path))?;

    println!(
        "\nRepositories collected: {}",
        report.records.len().to_string().bright_white()
    );
    println!("Dataset saved to {}", config.dataset_path.bright_white());

    if report.status() == CollectionStatus::Complete {
        println!("\n{}", "Collection complete!".bright_green().bold());
    } else {
        print_gaps(&report);
        println!("\n{}", "Collection finished with gaps".bright_yellow().bold());
    }
    Ok(ExitCode::from(report.exit_code()))
}

fn print_gaps(report: &CollectionReport) {
    for failure in &report.failed_organizations {
        println!(
            "  {} {}: {}",
            "skipped organization".yellow(),
            failure.organization,
            failure.error
        );
    }
    for skipped in &report.skipped_repositories {
        println!(
            "  {} {}/{}: {}",
            "skipped repository".yellow(),
            skipped.organization,
            skipped.repository,
            skipped.error
        );
    }
}

fn analyze(config: &Config) -> Result<ExitCode> {
    let analyzer = ComparativeAnalyzer::new(&config.organizations);

    info!("Analyzing {}...", config.dataset_path);
    let report = analyzer
        .analyze_file(Path::new(&config.dataset_path))
        .with_context(|| format!("Failed to analyze {}", config.dataset_path))?;

    output::print_summary(&report);
    output::write_results(Path::new(&config.results_path), &report)
        .with_context(|| format!("Failed to write results to {}", config.results_path))?;

    println!("\n{}", "Analysis complete!".bright_green().bold());
    Ok(ExitCode::SUCCESS)
}
