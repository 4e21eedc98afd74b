//! CLI interface for the vector store

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vector_store::config::{DEFAULT_DIMENSION, DEFAULT_K};
use vector_store::{IndexService, ServiceConfig, SnapshotManager, Vector};

#[derive(Parser)]
#[command(name = "vector-store")]
#[command(about = "A persistent exact nearest-neighbor store for text embeddings", long_about = None)]
#[command(version)]
struct Cli {
    /// Path of the snapshot file
    #[arg(long, env = "VECTOR_STORE_SNAPSHOT", default_value = "data/index.snapshot")]
    snapshot: PathBuf,

    /// Vector dimension for a new index
    #[arg(long, env = "VECTOR_STORE_DIMENSION", default_value_t = DEFAULT_DIMENSION)]
    dimension: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a vector with its source text
    Add {
        /// Text the vector was embedded from
        text: String,
        /// Vector data as comma-separated values (e.g., "1.0,2.0,3.0")
        #[arg(short, long)]
        vector: String,
    },
    /// Search for the nearest stored vectors
    Search {
        /// Query vector as comma-separated values (e.g., "1.0,2.0,3.0")
        query: String,
        /// Number of results to return
        #[arg(short, long, default_value_t = DEFAULT_K)]
        k: usize,
    },
    /// Print index statistics
    Stats,
    /// Check that the snapshot file is readable and consistent
    Verify,
    /// Start the HTTP API server
    Serve {
        /// Address to bind to
        #[arg(long, env = "VECTOR_STORE_ADDR", default_value = "0.0.0.0:5002")]
        addr: String,
    },
}

fn run(service: IndexService, command: Commands) -> Result<()> {
    match command {
        Commands::Add { text, vector } => {
            let v: Vector = vector.parse()?;
            let id = service.add(v, text)?;
            println!("Added vector with ID: {}", id);
        }
        Commands::Search { query, k } => {
            let q: Vector = query.parse()?;
            let outcome = service.search(&q, k)?;

            if outcome.hits.is_empty() && outcome.missing.is_empty() {
                println!("No results found (index is empty)");
            } else {
                println!("Top {} results:", outcome.hits.len());
                for (i, hit) in outcome.hits.iter().enumerate() {
                    println!(
                        "{}. [{}] {} (distance: {:.4})",
                        i + 1,
                        hit.id,
                        hit.text,
                        hit.distance
                    );
                }
            }
            for id in &outcome.missing {
                eprintln!("warning: result {} has no stored text", id);
            }
        }
        Commands::Stats => {
            let stats = service.stats()?;
            println!("Snapshot:  {}", service.snapshot_path().display());
            println!("Vectors:   {}", stats.vector_count);
            println!("Dimension: {}", stats.dimension);
            println!("Read-only: {}", stats.read_only);
        }
        Commands::Verify | Commands::Serve { .. } => {
            unreachable!("handled before the index is opened");
        }
    }
    Ok(())
}

fn verify(snapshot: &Path) -> Result<()> {
    let mgr = SnapshotManager::new(snapshot);
    match mgr.load()? {
        Some(snap) => println!(
            "OK: {} vectors of dimension {} in {}",
            snap.count,
            snap.dimension,
            snapshot.display()
        ),
        None => println!("No snapshot at {}", snapshot.display()),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Verify = cli.command {
        return verify(&cli.snapshot);
    }

    let config = ServiceConfig::new(cli.dimension, &cli.snapshot);
    let service = IndexService::open(config)
        .with_context(|| format!("failed to open index at {}", cli.snapshot.display()))?;

    // Handle serve command specially — it needs the async runtime
    if let Commands::Serve { ref addr } = cli.command {
        vector_store::server::start(addr, Arc::new(service)).await?;
        return Ok(());
    }

    tokio::task::spawn_blocking(move || run(service, cli.command)).await?
}
