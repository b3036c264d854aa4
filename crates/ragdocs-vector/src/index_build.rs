//! IVF-PQ index training for large tables.
//!
//! Small tables are searched exactly by a flat scan; once the row count reaches
//! `ann_min_rows` an IVF-PQ index over `vector` (cosine) replaces the scan.
use anyhow::Result;
use lancedb::index::{vector::IvfPqIndexBuilder, Index};
use lancedb::{DistanceType, Table};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IvfPqParams {
    pub nlist: usize,
    pub m: usize,
}

pub fn compute_ivfpq_params(total_rows: usize, dim: usize) -> IvfPqParams {
    let sqrt_n = (total_rows as f64).sqrt() as usize;
    let nlist = sqrt_n.clamp(1, 4096);
    // PQ sub-vectors must divide the dimension; keep at least 8 dims per sub-vector
    let m = [96, 64, 48, 32, 24, 16, 12, 8, 4, 2]
        .into_iter()
        .find(|m| dim % m == 0 && dim / m >= 8)
        .unwrap_or(1);
    IvfPqParams { nlist, m }
}

pub async fn build_ivfpq_index(table: &Table, index_name: &str, params: &IvfPqParams) -> Result<()> {
    info!(index = index_name, nlist = params.nlist, m = params.m, "Training IVF-PQ index");
    table
        .create_index(
            &["vector"],
            Index::IvfPq(
                IvfPqIndexBuilder::default()
                    .distance_type(DistanceType::Cosine)
                    .num_partitions(params.nlist as u32)
                    .num_sub_vectors(params.m as u32),
            ),
        )
        .name(index_name.to_string())
        .execute()
        .await?;
    Ok(())
}

/// Train an ANN index when the table is large enough. Returns the index name.
pub async fn maybe_build_ann_index(table: &Table, rows: usize, dim: usize, ann_min_rows: usize) -> Result<Option<String>> {
    if rows < ann_min_rows { return Ok(None); }
    let params = compute_ivfpq_params(rows, dim);
    let index_name = format!("ivfpq-{}", chrono::Utc::now().format("%Y%m%d-%H%M%S"));
    build_ivfpq_index(table, &index_name, &params).await?;
    Ok(Some(index_name))
}
