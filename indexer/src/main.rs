use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use sift_core::corpus::read_corpus;
use sift_core::persist::{load_meta, segment_exists, IndexPaths};
use sift_core::{Analyzer, EngineConfig, ScoringMode, SearchEngine};
use tracing_subscriber::{fmt, EnvFilter};

use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sift-indexer")]
#[command(about = "Build and query a BM25 / TF-IDF inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from input JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Drop common English stopwords from documents and queries
        #[arg(long, default_value_t = false)]
        stopwords: bool,
    },
    /// Run a query against a built index and print the ranked ids
    Search {
        #[arg(long)]
        index: PathBuf,
        /// Scoring model: BM-25 or TF-IDF
        #[arg(long, default_value = "BM-25")]
        mode: ScoringMode,
        #[arg(long, default_value_t = 10)]
        k: usize,
        /// Print scores next to ids
        #[arg(long, default_value_t = false)]
        scores: bool,
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Print the metadata of a built index
    Stats {
        #[arg(long)]
        index: PathBuf,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stopwords } => build_index(input, output, stopwords),
        Commands::Search { index, mode, k, scores, query } => {
            search(index, mode, k, scores, &query.join(" "))
        }
        Commands::Stats { index } => stats(index),
    }
}

fn build_index(input: PathBuf, output: PathBuf, stopwords: bool) -> Result<()> {
    let config = EngineConfig {
        index_dir: Some(output.clone()),
        analyzer: Analyzer::new().with_stopwords(stopwords),
        ..Default::default()
    };
    let engine = SearchEngine::new(&config);
    let docs = read_corpus(&input)?;
    let summary = engine.build_index(docs)?;
    tracing::info!(
        output = %output.display(),
        documents = summary.documents,
        terms = summary.terms,
        "index written"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn search(index: PathBuf, mode: ScoringMode, k: usize, scores: bool, query: &str) -> Result<()> {
    if !segment_exists(&IndexPaths::new(&index)) {
        bail!("no index found at {}", index.display());
    }
    let config = EngineConfig { index_dir: Some(index), ..Default::default() };
    let engine = SearchEngine::start(&config)?;
    for hit in engine.search_scored(mode, k, query)? {
        if scores {
            println!("{}\t{:.6}", hit.id, hit.score);
        } else {
            println!("{}", hit.id);
        }
    }
    Ok(())
}

fn stats(index: PathBuf) -> Result<()> {
    let meta = load_meta(&IndexPaths::new(&index))?;
    println!("{}", serde_json::to_string_pretty(&meta)?);
    Ok(())
}
