//! CLI binary for highlight search.
//!
//! Records go to stdout, one per line. Tracing output and per-platform
//! notices go to stderr so stdout can be piped.

use std::path::PathBuf;

use clap::Parser;
use highlights::{AppConfig, Credentials};
use tracing_subscriber::EnvFilter;

/// Search recent sports highlights across video and social platforms.
#[derive(Parser)]
#[command(name = "highlights", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read platform credentials from this .env file.
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Maximum number of results.
    #[arg(short, long)]
    limit: Option<usize>,

    /// Platform to search (repeatable). Defaults to every enabled platform.
    #[arg(short, long = "platform")]
    platforms: Vec<String>,

    /// Search text, e.g. a team or player name.
    #[arg(required = true)]
    query: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("highlights=info,highlight_search=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    let credentials = Credentials::load(cli.env_file.as_deref())?;
    let orchestrator = highlights::build_orchestrator(&config, &credentials)?;
    let query = highlights::build_query(&config, &cli.query.join(" "), cli.limit, &cli.platforms)?;

    let result = orchestrator.aggregate(&query).await?;

    if result.records.is_empty() {
        println!("No highlights found.");
    }
    for record in &result.records {
        println!("{}", highlights::format_record(record));
    }
    for notice in result.notices() {
        eprintln!("note: {notice}");
    }

    Ok(())
}
