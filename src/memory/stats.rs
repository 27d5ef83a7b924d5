use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::migrations;
use crate::error::Result;
use crate::memory::types::{MemoryType, TrustLevel};

/// Store-wide counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub memories: u64,
    pub relations: u64,
    /// Rows in the embedding cache.
    pub embeddings: u64,
    /// Memories with no vector-index entry, invisible to recall until reindexed.
    pub missing_index: u64,
    pub by_type: BTreeMap<String, u64>,
    pub by_trust: BTreeMap<String, u64>,
    /// Model that last wrote vectors into the index.
    pub embedding_model: Option<String>,
    /// Model of the provider the store is open with. Unset below the engine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_model: Option<String>,
}

impl Stats {
    /// The index was built by a different model than the active one, so
    /// recall compares vectors from two embedding spaces until a reindex.
    pub fn model_mismatch(&self) -> bool {
        matches!(
            (&self.embedding_model, &self.active_model),
            (Some(recorded), Some(active)) if recorded != active
        )
    }
}

/// Compute store statistics.
pub fn memory_stats(conn: &Connection) -> Result<Stats> {
    Ok(Stats {
        memories: count(conn, "SELECT COUNT(*) FROM memories")?,
        relations: count(conn, "SELECT COUNT(*) FROM relations")?,
        embeddings: count(conn, "SELECT COUNT(*) FROM embeddings")?,
        missing_index: count(
            conn,
            "SELECT COUNT(*) FROM memories WHERE id NOT IN (SELECT memory_id FROM vec_memories)",
        )?,
        by_type: count_grouped(
            conn,
            "SELECT type, COUNT(*) FROM memories GROUP BY type",
            MemoryType::ALL.iter().map(MemoryType::as_str),
        )?,
        by_trust: count_grouped(
            conn,
            "SELECT trust, COUNT(*) FROM memories GROUP BY trust",
            TrustLevel::ALL.iter().map(TrustLevel::as_str),
        )?,
        embedding_model: migrations::get_embedding_model(conn)?,
        active_model: None,
    })
}

fn count(conn: &Connection, sql: &str) -> Result<u64> {
    let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n as u64)
}

/// Group counts with every known key present, zero when absent.
fn count_grouped<'a>(
    conn: &Connection,
    sql: &str,
    keys: impl Iterator<Item = &'a str>,
) -> Result<BTreeMap<String, u64>> {
    let mut map: BTreeMap<String, u64> = keys.map(|k| (k.to_string(), 0)).collect();

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    for (key, n) in rows {
        map.insert(key, n as u64);
    }
    Ok(map)
}
