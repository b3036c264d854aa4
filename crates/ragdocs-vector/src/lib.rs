//! Persisted vector index: a LanceDB table of `(id, vector)` rows plus the
//! id-aligned JSON metadata store.
pub mod index_build;
pub mod metadata;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use metadata::MetadataStore;
pub use search::{VectorHit, VectorIndex};
pub use writer::{build_index, embed_chunks, IndexSummary, IndexWriter};
