//! Mindscreen CLI
//!
//! Demo front end for the screening pipeline. Results go to stdout as JSON,
//! logs go to stderr.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod cli;
mod commands;
mod settings;

use cli::{Cli, Command};
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    init_tracing(cli.verbose);
    describe_metrics();

    let settings = Settings::load(cli.config.as_deref(), cli.locale.as_deref())?;
    debug!(locale = %settings.analysis.locale.default, "configuration loaded");

    match &cli.command {
        Command::Analyze { text, pretty } => commands::analyze(&settings, text, *pretty),
        Command::Chat { offline } => commands::chat(&settings, *offline).await,
        Command::Validate => commands::validate(&settings),
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("mindscreen=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mindscreen=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Register metric descriptions with whatever recorder is installed
fn describe_metrics() {
    metrics::describe_counter!(
        "mindscreen_messages_total",
        "Total number of messages analyzed by risk level"
    );
    metrics::describe_counter!(
        "mindscreen_alerts_total",
        "Total number of high-risk alerts"
    );
    metrics::describe_histogram!(
        "mindscreen_analysis_latency_us",
        metrics::Unit::Microseconds,
        "Analysis latency in microseconds"
    );
    metrics::describe_counter!(
        "mindscreen_fallback_responses_total",
        "Total number of replies served from the fallback table"
    );
    metrics::describe_counter!(
        "mindscreen_completion_failures_total",
        "Total number of failed or timed-out completion calls"
    );
}
