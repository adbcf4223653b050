//! Verdant command-line entrypoint.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use verdant::cache::{CacheMode, EmbeddingCache};
use verdant::chunk::{Chunk, read_jsonl};
use verdant::config::Config;
use verdant::determinism::DeterminismHarness;
use verdant::embedding::{EmbeddingProvider, UnavailableProvider, build_provider};
use verdant::pipeline::{DocumentPipeline, Theme, TopQuotesScorer};
use verdant::retrieval::HybridRetriever;
use verdant::storage::{audit_replay, read_records};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(
    name = "verdant",
    about = "Deterministic evidence retrieval for sustainability disclosures",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank one document's chunks against a query
    Rank {
        /// JSON-lines chunk records
        #[arg(short, long)]
        chunks: PathBuf,

        /// Document id (used when records omit it)
        #[arg(short, long)]
        doc: String,

        /// Free-text query
        #[arg(short, long)]
        query: String,
    },

    /// Run the pipeline repeatedly and certify identical output
    Certify {
        /// JSON-lines chunk records
        #[arg(short, long)]
        chunks: PathBuf,

        /// Document id (used when records omit it)
        #[arg(short, long)]
        doc: String,

        /// Theme as `name=query`; repeatable
        #[arg(short, long = "theme", required = true)]
        themes: Vec<String>,

        /// Quotes cited per theme by the reference scorer
        #[arg(long, default_value_t = 3)]
        quotes: usize,
    },

    /// Check the ledger for writes recorded in replay mode
    AuditLedger {
        /// Ledger path (defaults to VERDANT_LEDGER_PATH)
        #[arg(short, long)]
        ledger: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        mode = %config.mode,
        model_id = %config.model_id,
        cache_dir = %config.cache_dir.display(),
        "Verdant starting"
    );

    match cli.command {
        Commands::Rank { chunks, doc, query } => {
            let retriever = build_retriever(&config, &chunks, &doc)?;
            let result = retriever.rank(&doc, &query, config.k, config.alpha)?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Certify {
            chunks,
            doc,
            themes,
            quotes,
        } => {
            let themes = themes
                .iter()
                .map(|t| {
                    Theme::parse(t)
                        .with_context(|| format!("invalid theme '{t}', expected name=query"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;

            let retriever = build_retriever(&config, &chunks, &doc)?;
            let pipeline = DocumentPipeline::from_config(&config, retriever);
            let mut harness = DeterminismHarness::from_config(&config)?;
            let scorer = TopQuotesScorer::new(quotes);
            let report = pipeline.certify(&mut harness, &doc, &themes, &scorer)?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.identical {
                bail!("output is not deterministic across {} runs", report.runs());
            }
        }
        Commands::AuditLedger { ledger } => {
            let path = ledger.unwrap_or_else(|| config.ledger_path.clone());
            let records = read_records(&path)
                .with_context(|| format!("failed to read ledger {}", path.display()))?;
            let audit = audit_replay(&records);

            println!("{}", serde_json::to_string_pretty(&audit)?);
            if !audit.is_clean() {
                bail!("{} replay-mode writes found in ledger", audit.replay_entries.len());
            }
        }
    }

    Ok(())
}

/// Replay mode gets a provider that refuses every call.
fn provider_for(config: &Config) -> anyhow::Result<Box<dyn EmbeddingProvider>> {
    match config.mode {
        CacheMode::Replay => Ok(Box::new(UnavailableProvider)),
        CacheMode::Fetch => Ok(build_provider(&config.provider, config.embedding_dim)?),
    }
}

fn build_retriever(
    config: &Config,
    chunks_path: &Path,
    doc_id: &str,
) -> anyhow::Result<HybridRetriever<Box<dyn EmbeddingProvider>>> {
    let file = File::open(chunks_path)
        .with_context(|| format!("failed to open {}", chunks_path.display()))?;
    let chunks: Vec<Chunk> = read_jsonl(doc_id, BufReader::new(file))?
        .into_iter()
        .filter(|c| c.doc_id == doc_id)
        .collect();
    if chunks.is_empty() {
        bail!("no chunks for document '{doc_id}' in {}", chunks_path.display());
    }

    let cache = EmbeddingCache::from_config(config, provider_for(config)?);
    let mut retriever = HybridRetriever::from_config(config, Arc::new(cache));
    retriever.add_document(chunks);
    Ok(retriever)
}
