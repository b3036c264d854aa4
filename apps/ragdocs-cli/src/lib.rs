//! Shared plumbing for the command-line binaries.
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ragdocs_core::config::{expand_path, Config, RagSettings};
use ragdocs_core::data_processor::DataProcessor;
use ragdocs_core::Error;
use ragdocs_embed::get_default_embedder;
use ragdocs_vector::{build_index, IndexSummary, IndexWriter};

/// Log to stderr so stdout stays clean for answers and summaries.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .ok();
}

pub fn load_settings() -> anyhow::Result<RagSettings> {
    let config = Config::load().context("loading configuration")?;
    config.settings()
}

/// Build an index from a directory of PDF files.
#[derive(Debug, Parser)]
#[command(name = "ragdocs-ingest", version)]
pub struct IngestArgs {
    /// Directory containing the PDF files (top level only)
    #[arg(long)]
    pub pdf_dir: PathBuf,

    /// Where to write the vector index
    #[arg(long)]
    pub index_path: Option<String>,

    /// Where to write the chunk metadata JSON
    #[arg(long)]
    pub meta_path: Option<String>,

    /// Embedding model name or directory
    #[arg(long)]
    pub model: Option<String>,

    /// Tokens per chunk
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Tokens shared by consecutive chunks
    #[arg(long)]
    pub overlap: Option<usize>,
}

impl IngestArgs {
    /// Flags win over loaded configuration.
    pub fn apply(&self, mut settings: RagSettings) -> ragdocs_core::Result<RagSettings> {
        if let Some(p) = &self.index_path { settings.index_path = expand_path(p); }
        if let Some(p) = &self.meta_path { settings.meta_path = expand_path(p); }
        if let Some(m) = &self.model { settings.embed_model.clone_from(m); }
        if let Some(n) = self.chunk_size { settings.chunk_size = n; }
        if let Some(n) = self.overlap { settings.overlap = n; }
        settings.validate()?;
        Ok(settings)
    }
}

/// Chunk every PDF under `pdf_dir`, embed and write the index.
///
/// Fails with [`Error::Empty`] before touching any artifact when no PDF yields
/// text, so a previous index stays usable.
pub async fn ingest(pdf_dir: &Path, settings: &RagSettings) -> anyhow::Result<IndexSummary> {
    let processor = DataProcessor::with_chunking(settings.chunking())?;
    let chunks = processor.process_directory(pdf_dir)?;
    if chunks.is_empty() {
        return Err(Error::Empty(format!("no text extracted from any PDF in {}", pdf_dir.display())).into());
    }
    let embedder = get_default_embedder(settings)?;
    let writer = IndexWriter::new(&settings.index_path, &settings.meta_path).with_ann_min_rows(settings.ann_min_rows);
    let (summary, _) = build_index(&chunks, embedder.as_ref(), &writer).await?;
    Ok(summary)
}

/// Char-safe preview used when listing sources.
pub fn preview(text: &str, max_chars: usize) -> &str {
    ragdocs_qa::answer::truncate_chars(text, max_chars)
}
