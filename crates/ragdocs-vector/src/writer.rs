use anyhow::{anyhow, Context};
use arrow_array::{FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use ragdocs_core::error::{Error, Result};
use ragdocs_core::traits::Embedder;
use ragdocs_core::types::Chunk;

use crate::index_build::maybe_build_ann_index;
use crate::metadata::MetadataStore;
use crate::schema::{build_index_schema, TABLE_NAME};
use crate::table::open_db;

const EMBED_BATCH: usize = 64;
const INSERT_BATCH: usize = 1000;

/// What a finished ingestion run wrote to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSummary {
	pub rows: usize,
	pub dim: usize,
	pub model: String,
	pub ann_index: Option<String>,
}

/// Embed every chunk text, in order, showing progress.
pub fn embed_chunks(chunks: &[Chunk], embedder: &dyn Embedder) -> Result<Vec<Vec<f32>>> {
	if chunks.is_empty() { return Err(Error::Empty("no chunks to embed".into())); }
	info!("Embedding {} chunks with model {}", chunks.len(), embedder.model_id());
	let pb = ProgressBar::new(chunks.len() as u64);
	pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}").map_err(|e| anyhow!(e))?.progress_chars("#>-"));
	let mut embeddings = Vec::with_capacity(chunks.len());
	for batch in chunks.chunks(EMBED_BATCH) {
		let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
		embeddings.extend(embedder.embed_batch(&texts)?);
		pb.set_position(embeddings.len() as u64);
	}
	pb.finish_with_message("embedded");
	Ok(embeddings)
}

/// Writes one ingestion run: the LanceDB table and its metadata file.
/// Both are replaced wholesale; there is no incremental update.
pub struct IndexWriter { index_path: PathBuf, meta_path: PathBuf, ann_min_rows: usize }

impl IndexWriter {
	pub fn new(index_path: &Path, meta_path: &Path) -> Self {
		Self { index_path: index_path.to_path_buf(), meta_path: meta_path.to_path_buf(), ann_min_rows: usize::MAX }
	}

	pub fn with_ann_min_rows(mut self, ann_min_rows: usize) -> Self { self.ann_min_rows = ann_min_rows; self }

	pub async fn write(&self, chunks: &[Chunk], embeddings: &[Vec<f32>], model: &str) -> Result<IndexSummary> {
		if chunks.is_empty() { return Err(Error::Empty("no chunks to index".into())); }
		if chunks.len() != embeddings.len() {
			return Err(Error::Operation(format!("{} chunks but {} embeddings", chunks.len(), embeddings.len())));
		}
		let dim = embeddings[0].len();
		if dim == 0 || embeddings.iter().any(|e| e.len() != dim) {
			return Err(Error::Operation(format!("embeddings must share one non-zero dimension (first is {dim})")));
		}
		let dim_i32 = i32::try_from(dim).map_err(|_| Error::Operation(format!("dimension {dim} too large")))?;

		// Both artifacts are staged beside their targets and swapped in only once
		// complete, so a failed run leaves the previous index and metadata paired.
		let staging = sibling(&self.index_path, "staging");
		let meta_tmp = sibling(&self.meta_path, "tmp");
		if staging.exists() { fs::remove_dir_all(&staging)?; }
		fs::create_dir_all(&staging)?;
		let db = open_db(staging.to_string_lossy().as_ref()).await?;
		info!("Indexing {} chunks into LanceDB table {} at {}", chunks.len(), TABLE_NAME, self.index_path.display());

		let mut batches = embeddings.chunks(INSERT_BATCH).enumerate().map(|(n, batch)| to_record_batch(n * INSERT_BATCH, batch, dim_i32));
		let first = batches.next().ok_or_else(|| Error::Empty("no rows to write".into()))??;
		let schema = first.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(first)].into_iter(), schema));
		let table = db.create_table(TABLE_NAME, reader).execute().await.context("creating index table")?;
		for record_batch in batches {
			let record_batch = record_batch?;
			let schema = record_batch.schema();
			let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
			table.add(reader).execute().await.context("appending to index table")?;
		}
		// flat search stays valid without the ANN index
		let ann_index = match maybe_build_ann_index(&table, chunks.len(), dim, self.ann_min_rows).await {
			Ok(name) => name,
			Err(e) => {
				warn!(error = %e, "ANN index training failed; searches will use a flat scan");
				None
			}
		};
		drop(table);
		drop(db);

		MetadataStore::from_chunks(chunks, model, dim).save(&meta_tmp)?;
		if self.index_path.exists() { fs::remove_dir_all(&self.index_path)?; }
		fs::rename(&staging, &self.index_path)?;
		fs::rename(&meta_tmp, &self.meta_path)?;
		info!("Index and metadata saved ({} rows, dim {})", chunks.len(), dim);
		Ok(IndexSummary { rows: chunks.len(), dim, model: model.to_string(), ann_index })
	}
}

/// `<path>.<suffix>` in the same directory, so renames stay on one filesystem.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
	let mut name = path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
	name.push(format!(".{suffix}"));
	path.with_file_name(name)
}

fn to_record_batch(first_id: usize, embeddings: &[Vec<f32>], dim: i32) -> anyhow::Result<RecordBatch> {
	let ids: Vec<i64> = (first_id..first_id + embeddings.len()).map(|i| i as i64).collect();
	let vectors = embeddings.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));
	Ok(RecordBatch::try_new(build_index_schema(dim), vec![
		Arc::new(Int64Array::from(ids)),
		Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim)),
	])?)
}

/// Embed `chunks` and persist index + metadata in one step.
pub async fn build_index(chunks: &[Chunk], embedder: &dyn Embedder, writer: &IndexWriter) -> Result<(IndexSummary, Vec<Vec<f32>>)> {
	let embeddings = embed_chunks(chunks, embedder)?;
	let summary = writer.write(chunks, &embeddings, embedder.model_id()).await?;
	Ok((summary, embeddings))
}
