//! Domain types shared by the ingestion and serving paths.

use serde::{Deserialize, Serialize};

/// Row id inside the vector index; also the position in the metadata arrays.
pub type ChunkId = i64;

/// A contiguous slice of a document's tokens, independently embedded.
///
/// - `text`: the chunk payload (tokens joined by single spaces)
/// - `source`: file name the chunk was extracted from
/// - `position`: index of the chunk within its source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub position: usize,
}

/// Per-chunk provenance as persisted in the metadata file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub source: String,
    pub chunk_index: usize,
}

/// A single retrieval hit. `score` is a similarity, higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub score: f32,
    pub text: String,
    pub source: String,
}

/// The answer to one question together with the chunks it was built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<QueryResult>,
}
