//! Nearest-neighbour lookups against the persisted index table.
use anyhow::{anyhow, Result};
use arrow_array::{Float32Array, Int64Array};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{DistanceType, Table};
use std::path::Path;

use ragdocs_core::types::ChunkId;

use crate::schema::TABLE_NAME;
use crate::table::open_table_if_exists;

/// One raw neighbour: index id plus cosine similarity (`1 - distance`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorHit { pub id: ChunkId, pub score: f32 }

#[derive(Clone)]
pub struct VectorIndex { table: Table }

impl VectorIndex {
	/// Open the index table under `index_path`, `None` if nothing was ingested there.
	pub async fn open(index_path: &Path) -> Result<Option<Self>> {
		Ok(open_table_if_exists(index_path, TABLE_NAME).await?.map(|table| Self { table }))
	}

	pub async fn count(&self) -> Result<usize> {
		Ok(self.table.count_rows(None).await?)
	}

	/// Up to `k` neighbours of `query_vec`, best first.
	pub async fn search(&self, query_vec: Vec<f32>, k: usize) -> Result<Vec<VectorHit>> {
		if k == 0 { return Ok(vec![]); }
		let mut stream = self.table
			.vector_search(query_vec)?
			.distance_type(DistanceType::Cosine)
			.select(Select::columns(&["id"]))
			.limit(k)
			.execute()
			.await?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			let ids = batch.column_by_name("id").and_then(|c| c.as_any().downcast_ref::<Int64Array>()).ok_or_else(|| anyhow!("index result missing id column"))?;
			let distances = batch.column_by_name("_distance").and_then(|c| c.as_any().downcast_ref::<Float32Array>()).ok_or_else(|| anyhow!("index result missing _distance column"))?;
			for i in 0..batch.num_rows() {
				hits.push(VectorHit { id: ids.value(i), score: 1.0 - distances.value(i) });
			}
		}
		Ok(hits)
	}
}
