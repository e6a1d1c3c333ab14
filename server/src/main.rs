use anyhow::Result;
use axum::Router;
use clap::Parser;
use sift_core::{Analyzer, EngineConfig, SearchEngine};
use sift_server::build_app;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Index directory path
    #[arg(long, env = "SIFT_INDEX_DIR", default_value = "./index")]
    index: PathBuf,
    /// Corpus (JSON/JSONL file or directory) used when rebuilding
    #[arg(long, env = "SIFT_CORPUS")]
    corpus: Option<PathBuf>,
    /// Rebuild the index from the corpus at startup instead of reopening it
    #[arg(long, env = "SIFT_REBUILD", default_value_t = false)]
    rebuild: bool,
    /// Drop common English stopwords (applies to rebuilt indexes)
    #[arg(long, env = "SIFT_STOPWORDS", default_value_t = false)]
    stopwords: bool,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = EngineConfig {
        corpus_path: args.corpus.clone(),
        index_dir: Some(args.index.clone()),
        rebuild_on_startup: args.rebuild,
        analyzer: Analyzer::new().with_stopwords(args.stopwords),
    };
    let engine = tokio::task::spawn_blocking(move || SearchEngine::start(&config)).await??;
    let app: Router = build_app(Arc::new(engine));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
