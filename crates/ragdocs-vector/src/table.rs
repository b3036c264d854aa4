//! LanceDB connection and housekeeping helpers.
use anyhow::Result;
use lancedb::{connect, Connection, Table};
use std::path::Path;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

/// Open `name` under the database at `db_path`, `None` when it does not exist.
pub async fn open_table_if_exists(db_path: &Path, name: &str) -> Result<Option<Table>> {
    if !db_path.exists() { return Ok(None); }
    let conn = open_db(db_path.to_string_lossy().as_ref()).await?;
    if !table_exists(&conn, name).await? { return Ok(None); }
    Ok(Some(conn.open_table(name).execute().await?))
}
