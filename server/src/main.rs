use anyhow::Result;
use axum::Router;
use clap::Parser;
use search_core::{CorpusOptions, IndexConfig, SearchEngine};
use server::{build_app, spawn_index_build, BuildSettings};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Corpus file or directory (.csv, .json, .jsonl, .txt)
    #[arg(long, default_value = "./data/Donald-Tweets!.csv")]
    corpus: PathBuf,
    /// CSV column holding the tweet text
    #[arg(long, default_value = search_core::corpus::DEFAULT_TEXT_COLUMN)]
    text_column: String,
    /// Index only the first N documents
    #[arg(long, default_value_t = 7000)]
    limit: usize,
    /// Minimum number of documents a term must appear in
    #[arg(long, default_value_t = 2)]
    min_df: u32,
    /// Maximum fraction of documents a term may appear in
    #[arg(long, default_value_t = 0.8)]
    max_df: f64,
    /// Vocabulary size cap
    #[arg(long, default_value_t = 5000)]
    max_features: usize,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let index = IndexConfig { min_document_frequency: args.min_df, max_document_frequency_ratio: args.max_df, max_vocabulary_size: args.max_features };
    index.validate()?;

    let engine = Arc::new(SearchEngine::new());
    let settings = BuildSettings {
        corpus_path: args.corpus,
        corpus: CorpusOptions { text_column: args.text_column, limit: Some(args.limit) },
        index,
    };
    let _build = spawn_index_build(Arc::clone(&engine), settings);
    let app: Router = build_app(engine);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
