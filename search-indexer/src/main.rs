//! Search indexer binary.
//!
//! Reads mutations from a JSON-lines file, stages them and commits them to
//! the remote index in a single pass.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use search_indexer::Dependencies;
use search_indexer_pipeline::{CommitOutcome, StageOutcome};
use search_indexer_shared::MutationKind;

#[derive(Parser, Debug)]
#[command(name = "search-indexer")]
#[command(about = "Stage document mutations and commit them to a search index", long_about = None)]
struct Cli {
    /// File with one JSON mutation per line
    #[arg(long)]
    mutations: PathBuf,

    /// Publication the commit is issued for
    #[arg(long)]
    publication_id: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    info!("Starting search indexer");

    let deps = Dependencies::from_env().context("Failed to initialize dependencies")?;
    let indexer = deps.indexer;

    let contents = tokio::fs::read_to_string(&cli.mutations)
        .await
        .with_context(|| format!("Failed to read {}", cli.mutations.display()))?;

    let mut staged = 0usize;
    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mutation: MutationKind = serde_json::from_str(line)
            .with_context(|| format!("Invalid mutation on line {}", index + 1))?;
        let (id, publication_id) = (
            mutation.id().to_string(),
            mutation.publication_id().to_string(),
        );
        match indexer.stage(mutation) {
            StageOutcome::Ignored(reason) => debug!(
                line = index + 1,
                id = %id,
                publication_id = %publication_id,
                reason = ?reason,
                "Mutation ignored"
            ),
            _ => staged += 1,
        }
    }

    info!(staged, "Mutations staged");

    let result = indexer.commit(&cli.publication_id).await;
    indexer.destroy().await;

    match result? {
        CommitOutcome::Filtered => warn!(
            publication_id = %cli.publication_id,
            "Publication is not active, nothing was committed"
        ),
        CommitOutcome::Dispatched(summary) => info!(
            adds = summary.adds,
            removals = summary.removals,
            updates = summary.updates,
            batches = summary.batches,
            "Commit completed"
        ),
    }

    Ok(())
}
