//! Embedding cache (`embeddings`) and vector index (`vec_memories`) writes.
//!
//! The cache holds the raw vector and the model that produced it; the vec0
//! index is derived from it and can be rebuilt without calling the provider.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::migrations;
use crate::error::{Error, Result};
use crate::memory::lifecycle::{format_timestamp, now};
use crate::memory::{bytes_to_vector, vector_to_bytes};

/// A cached embedding as read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEmbedding {
    pub memory_id: String,
    pub vector: Vec<f32>,
    pub model: String,
}

/// Reject vectors whose width differs from the index.
fn check_width(conn: &Connection, vector: &[f32]) -> Result<()> {
    if let Some(dims) = migrations::get_embedding_dimensions(conn)? {
        if vector.len() != dims {
            return Err(Error::Validation(format!(
                "embedding has {} dimensions, index expects {dims}",
                vector.len()
            )));
        }
    }
    Ok(())
}

/// Write the cache row and refresh the vector index entry for `memory_id`.
///
/// vec0 has no upsert, so the index row is deleted then re-inserted. The two
/// statements are not wrapped in a transaction: a failure in between leaves
/// the memory without an index entry until the next save or reindex.
pub fn save_embedding(conn: &Connection, memory_id: &str, vector: &[f32], model: &str) -> Result<()> {
    check_width(conn, vector)?;
    let bytes = vector_to_bytes(vector);

    conn.execute(
        "INSERT INTO embeddings (memory_id, embedding, model, created_at) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(memory_id) DO UPDATE SET \
             embedding = excluded.embedding, model = excluded.model, created_at = excluded.created_at",
        params![memory_id, bytes, model, format_timestamp(&now())],
    )?;

    write_index_entry(conn, memory_id, &bytes)?;

    tracing::debug!(memory_id, model, "embedding saved");
    Ok(())
}

fn write_index_entry(conn: &Connection, memory_id: &str, bytes: &[u8]) -> Result<()> {
    conn.execute("DELETE FROM vec_memories WHERE memory_id = ?1", params![memory_id])?;
    conn.execute(
        "INSERT INTO vec_memories (memory_id, embedding) VALUES (?1, ?2)",
        params![memory_id, bytes],
    )?;
    Ok(())
}

/// Read the cached embedding for a memory.
pub fn get_embedding(conn: &Connection, memory_id: &str) -> Result<Option<StoredEmbedding>> {
    let row = conn
        .query_row(
            "SELECT memory_id, embedding, model FROM embeddings WHERE memory_id = ?1",
            params![memory_id],
            |row| {
                let bytes: Vec<u8> = row.get(1)?;
                Ok(StoredEmbedding {
                    memory_id: row.get(0)?,
                    vector: bytes_to_vector(&bytes),
                    model: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(row)
}

pub fn has_index_entry(conn: &Connection, memory_id: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT COUNT(*) > 0 FROM vec_memories WHERE memory_id = ?1",
        params![memory_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Re-insert index rows from cache rows produced by `model` whose index entry
/// is missing. Returns how many entries were restored.
pub fn restore_index_from_cache(conn: &Connection, model: &str) -> Result<usize> {
    let cached: Vec<(String, Vec<u8>)> = {
        let mut stmt = conn.prepare(
            "SELECT e.memory_id, e.embedding FROM embeddings e \
             WHERE e.model = ?1 \
               AND e.memory_id NOT IN (SELECT memory_id FROM vec_memories)",
        )?;
        let rows = stmt
            .query_map(params![model], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };

    let dims = migrations::get_embedding_dimensions(conn)?;
    let mut restored = 0;
    for (memory_id, bytes) in cached {
        if dims.is_some_and(|d| bytes.len() != d * 4) {
            tracing::warn!(memory_id = %memory_id, "cached embedding has the wrong width, skipping");
            continue;
        }
        write_index_entry(conn, &memory_id, &bytes)?;
        restored += 1;
    }

    if restored > 0 {
        tracing::info!(restored, model, "vector index entries restored from cache");
    }
    Ok(restored)
}

/// `(id, content)` of memories that need a fresh embedding from `model`:
/// those without a cache row for that model, or every memory when `force`.
pub fn memories_needing_embedding(
    conn: &Connection,
    model: &str,
    force: bool,
) -> Result<Vec<(String, String)>> {
    let map = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(String, String)> {
        Ok((row.get(0)?, row.get(1)?))
    };
    let rows = if force {
        let mut stmt = conn.prepare("SELECT id, content FROM memories ORDER BY created_at, rowid")?;
        let rows = stmt.query_map([], map)?.collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    } else {
        let mut stmt = conn.prepare(
            "SELECT m.id, m.content FROM memories m \
             LEFT JOIN embeddings e ON e.memory_id = m.id AND e.model = ?1 \
             WHERE e.memory_id IS NULL ORDER BY m.created_at, m.rowid",
        )?;
        let rows = stmt
            .query_map(params![model], map)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };
    Ok(rows)
}
