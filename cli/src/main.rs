use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use search_core::normalizer::clean_text;
use search_core::{Corpus, CorpusOptions, Index, IndexConfig, SearchEngine};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tweetsearch")]
#[command(about = "Build a TF-IDF index over a tweet corpus and query it offline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CorpusArgs {
    /// Corpus file or directory (.csv, .json, .jsonl, .txt)
    #[arg(long)]
    corpus: PathBuf,
    /// CSV column holding the tweet text
    #[arg(long, default_value = search_core::corpus::DEFAULT_TEXT_COLUMN)]
    text_column: String,
    /// Index only the first N documents
    #[arg(long)]
    limit: Option<usize>,
    /// Minimum number of documents a term must appear in
    #[arg(long, default_value_t = 2)]
    min_df: u32,
    /// Maximum fraction of documents a term may appear in
    #[arg(long, default_value_t = 0.8)]
    max_df: f64,
    /// Vocabulary size cap
    #[arg(long, default_value_t = 5000)]
    max_features: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and print its statistics as JSON
    Stats {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Build the index and run one or more queries against it
    Search {
        #[command(flatten)]
        corpus: CorpusArgs,
        /// Queries to run
        #[arg(required = true)]
        queries: Vec<String>,
        /// Results per query
        #[arg(long, short = 'k', default_value_t = 5)]
        top_k: usize,
        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the normalized form of a text
    Clean {
        text: String,
    },
}

#[derive(Serialize)]
struct QueryReport<'a> {
    query: &'a str,
    results: Vec<search_core::SearchHit>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Stats { corpus } => {
            let engine = load_engine(&corpus)?;
            println!("{}", serde_json::to_string_pretty(&engine.stats()?)?);
            Ok(())
        }
        Commands::Search { corpus, queries, top_k, json } => {
            let engine = load_engine(&corpus)?;
            run_queries(&engine, &queries, top_k, json)
        }
        Commands::Clean { text } => {
            println!("{}", clean_text(&text));
            Ok(())
        }
    }
}

fn load_engine(args: &CorpusArgs) -> Result<SearchEngine> {
    let config = IndexConfig {
        min_document_frequency: args.min_df,
        max_document_frequency_ratio: args.max_df,
        max_vocabulary_size: args.max_features,
    };
    config.validate()?;
    let opts = CorpusOptions { text_column: args.text_column.clone(), limit: args.limit };
    let corpus = Corpus::load(&args.corpus, &opts)?;
    let index = Index::build_or_empty(corpus.texts(), config)?;
    Ok(SearchEngine::ready(index, corpus)?)
}

fn run_queries(engine: &SearchEngine, queries: &[String], top_k: usize, json: bool) -> Result<()> {
    tracing::info!(queries = queries.len(), top_k, "running queries");
    let mut reports = Vec::with_capacity(queries.len());
    for q in queries {
        // Zero-score hits only pad the ranking out to top_k.
        let matched: Vec<_> = engine.search(q, top_k)?.into_iter().filter(|h| h.score > 0.0).collect();
        if json {
            reports.push(QueryReport { query: q, results: matched });
            continue;
        }
        println!("query: {q}");
        if matched.is_empty() {
            println!("  (no matching documents)");
        }
        for hit in matched {
            println!("  {:>2}. [{:.4}] #{} {}", hit.rank, hit.score, hit.doc_id, hit.text.replace('\n', " "));
            println!("      cleaned: {}", hit.cleaned_text);
        }
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}
