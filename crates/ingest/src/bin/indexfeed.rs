use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use indexfeed_core::{config, Config};
use indexfeed_ingest::PipelineContext;

#[derive(Parser)]
#[command(
    name = "indexfeed",
    about = "Feed documents into the hosted vector-search index",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a product catalog CSV, one record per row
    Csv {
        /// Path to the catalog file
        path: PathBuf,
    },
    /// Ingest every PDF in a directory, one record per page
    Pdf {
        /// Directory scanned for .pdf files
        dir: PathBuf,
    },
    /// Crawl a site and ingest every reachable page
    Web {
        /// URL the crawl starts from; only links within it are followed
        start_url: String,
    },
    /// Ingest the latest version of every wiki page from the database
    Db,
}

#[tokio::main]
async fn main() -> Result<()> {
    config::load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    config.log_summary();

    let mut pipeline = PipelineContext::from_config(config)?;
    let stats = match cli.command {
        Command::Csv { path } => pipeline.ingest_csv(&path).await?,
        Command::Pdf { dir } => pipeline.ingest_pdf_dir(&dir).await?,
        Command::Web { start_url } => pipeline.ingest_web(&start_url).await?,
        Command::Db => pipeline.ingest_db().await?,
    };

    tracing::info!(
        uploaded_batches = stats.uploaded_batches,
        uploaded_records = stats.uploaded_records,
        skipped_batches = stats.skipped_batches,
        failed_batches = stats.failed_batches,
        "run complete"
    );
    if stats.failed_batches > 0 {
        anyhow::bail!("{} batch(es) failed to upload", stats.failed_batches);
    }
    Ok(())
}
