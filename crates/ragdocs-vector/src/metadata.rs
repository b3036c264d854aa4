//! The JSON store that travels alongside the vector table.
//!
//! Layout: `{"model": .., "dim": .., "texts": [..], "meta": [{"source", "chunk_index"}, ..]}`.
//! Entry `i` of `texts` and `meta` describes row id `i` of the index.
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

use ragdocs_core::error::{Error, Result};
use ragdocs_core::types::{Chunk, ChunkId, ChunkMeta};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataStore {
    /// Embedder id the index was built with. Absent in legacy files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dim: Option<usize>,
    #[serde(default)]
    pub texts: Vec<String>,
    #[serde(default)]
    pub meta: Vec<ChunkMeta>,
}

impl MetadataStore {
    pub fn from_chunks(chunks: &[Chunk], model: &str, dim: usize) -> Self {
        Self {
            model: Some(model.to_string()),
            dim: Some(dim),
            texts: chunks.iter().map(|c| c.text.clone()).collect(),
            meta: chunks.iter().map(|c| ChunkMeta { source: c.source.clone(), chunk_index: c.position }).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let store: Self = serde_json::from_str(&raw)?;
        if store.texts.len() != store.meta.len() {
            return Err(Error::Operation(format!(
                "{}: {} texts but {} meta entries",
                path.display(),
                store.texts.len(),
                store.meta.len()
            )));
        }
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = std::io::BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize { self.texts.len() }

    pub fn is_empty(&self) -> bool { self.texts.is_empty() }

    /// Text and provenance for an index id, `None` for ids outside `[0, len)`.
    pub fn get(&self, id: ChunkId) -> Option<(&str, &ChunkMeta)> {
        let idx = usize::try_from(id).ok()?;
        Some((self.texts.get(idx)?.as_str(), self.meta.get(idx)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, source: &str, position: usize) -> Chunk {
        Chunk { text: text.into(), source: source.into(), position }
    }

    #[test]
    fn save_and_load_preserve_alignment() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested/metadata.json");
        let store = MetadataStore::from_chunks(&[chunk("a", "x.pdf", 0), chunk("b", "y.pdf", 0), chunk("c", "y.pdf", 1)], "m", 3);
        store.save(&path).unwrap();

        let loaded = MetadataStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.get(2).map(|(t, m)| (t, m.source.as_str(), m.chunk_index)), Some(("c", "y.pdf", 1)));
    }

    #[test]
    fn out_of_range_ids_are_rejected() {
        let store = MetadataStore::from_chunks(&[chunk("a", "x.pdf", 0)], "m", 3);
        assert!(store.get(-1).is_none());
        assert!(store.get(1).is_none());
        assert!(store.get(0).is_some());
    }

    #[test]
    fn legacy_file_without_model_loads() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("metadata.json");
        fs::write(&path, r#"{"texts": ["t"], "meta": [{"source": "s.pdf", "chunk_index": 0}]}"#).unwrap();
        let store = MetadataStore::load(&path).unwrap();
        assert_eq!(store.model, None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn misaligned_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("metadata.json");
        fs::write(&path, r#"{"texts": ["t", "u"], "meta": [{"source": "s.pdf", "chunk_index": 0}]}"#).unwrap();
        assert!(MetadataStore::load(&path).is_err());
    }
}
