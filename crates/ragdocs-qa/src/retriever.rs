use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use ragdocs_core::config::RagSettings;
use ragdocs_core::error::{Error, Result};
use ragdocs_core::traits::Embedder;
use ragdocs_core::types::{ChunkId, QueryResult};
use ragdocs_vector::{MetadataStore, VectorIndex};

struct LoadedIndex {
    vectors: VectorIndex,
    store: MetadataStore,
}

/// Embeds queries and joins nearest neighbours back to chunk text.
///
/// Loaded once at startup and only read afterwards, so a single instance can
/// serve concurrent requests.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Option<LoadedIndex>,
}

impl Retriever {
    /// A retriever with nothing to search; every query returns no results.
    pub fn unloaded(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder, index: None }
    }

    pub async fn from_settings(settings: &RagSettings, embedder: Arc<dyn Embedder>) -> Result<Self> {
        Self::load(&settings.index_path, &settings.meta_path, embedder).await
    }

    /// Open the index and metadata written by ingestion. Missing artifacts leave
    /// the retriever unloaded; present but inconsistent ones are an error.
    pub async fn load(index_path: &Path, meta_path: &Path, embedder: Arc<dyn Embedder>) -> Result<Self> {
        if !meta_path.exists() {
            warn!(meta = %meta_path.display(), "Metadata file not found; retrieval disabled");
            return Ok(Self::unloaded(embedder));
        }
        let Some(vectors) = VectorIndex::open(index_path).await? else {
            warn!(index = %index_path.display(), "Vector index not found; retrieval disabled");
            return Ok(Self::unloaded(embedder));
        };
        let store = MetadataStore::load(meta_path)?;
        let rows = vectors.count().await?;
        if rows != store.len() {
            return Err(Error::Operation(format!("index has {} rows but metadata describes {} chunks", rows, store.len())));
        }
        match &store.model {
            Some(model) => info!(chunks = rows, model = %model, "Loaded index"),
            None => warn!(chunks = rows, "Loaded index without a recorded embedding model; model pinning disabled"),
        }
        Ok(Self { embedder, index: Some(LoadedIndex { vectors, store }) })
    }

    pub fn is_loaded(&self) -> bool { self.index.is_some() }

    pub fn len(&self) -> usize { self.index.as_ref().map_or(0, |i| i.store.len()) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn embedder(&self) -> &Arc<dyn Embedder> { &self.embedder }

    /// The `top_k` chunks closest to `query`, best first. Equal scores keep
    /// index order.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<QueryResult>> {
        let Some(index) = &self.index else { return Ok(vec![]) };
        if top_k == 0 || query.trim().is_empty() { return Ok(vec![]); }
        self.check_model(&index.store)?;

        let embedder = Arc::clone(&self.embedder);
        let text = query.to_string();
        let query_vec = tokio::task::spawn_blocking(move || embedder.embed_batch(&[text]))
            .await
            .map_err(|e| Error::Operation(format!("query embedding task failed: {e}")))??
            .pop()
            .ok_or_else(|| Error::Operation("embedder returned no vector".into()))?;

        let hits = index.vectors.search(query_vec, top_k).await?;
        let mut joined: Vec<(ChunkId, QueryResult)> = hits
            .into_iter()
            .filter_map(|hit| {
                let (text, meta) = index.store.get(hit.id)?;
                Some((hit.id, QueryResult { score: hit.score, text: text.to_string(), source: meta.source.clone() }))
            })
            .collect();
        joined.sort_by(|(a_id, a), (b_id, b)| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then(a_id.cmp(b_id)));
        joined.truncate(top_k);
        debug!(query, results = joined.len(), "Retrieved");
        Ok(joined.into_iter().map(|(_, r)| r).collect())
    }

    fn check_model(&self, store: &MetadataStore) -> Result<()> {
        let query_model = self.embedder.model_id();
        if let Some(indexed) = store.model.as_deref() {
            if indexed != query_model {
                return Err(Error::ModelMismatch { indexed: indexed.to_string(), query: query_model.to_string() });
            }
        }
        if let Some(dim) = store.dim {
            if dim != self.embedder.dim() {
                return Err(Error::ModelMismatch {
                    indexed: format!("{} (dim {dim})", store.model.as_deref().unwrap_or("unknown")),
                    query: format!("{query_model} (dim {})", self.embedder.dim()),
                });
            }
        }
        Ok(())
    }
}
