//! Memory-record repository: upsert, point reads, filtered listing, counters.
//!
//! The keyword index is maintained by triggers on `memories` (see
//! [`crate::db::schema`]), so every write here updates it inside the same
//! statement transaction.

use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::memory::lifecycle::{format_timestamp, now, parse_timestamp};
use crate::memory::types::{ListOptions, Memory, TrustLevel};

/// Column list matching [`memory_from_row`].
pub(crate) const MEMORY_COLUMNS: &str =
    "id, content, type, topic_key, tags, trust, metadata, created_at, updated_at, access_count";

/// Map a row selected with [`MEMORY_COLUMNS`] into a [`Memory`].
pub(crate) fn memory_from_row(row: &Row<'_>) -> rusqlite::Result<Memory> {
    let tags: Option<String> = row.get(4)?;
    let metadata: Option<String> = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;
    let access_count: i64 = row.get(9)?;

    Ok(Memory {
        id: row.get(0)?,
        content: row.get(1)?,
        memory_type: row.get(2)?,
        topic_key: row
            .get::<_, Option<String>>(3)?
            .filter(|key| !key.is_empty()),
        tags: json_column(4, tags.as_deref())?,
        trust: row.get(5)?,
        metadata: json_column(6, metadata.as_deref())?,
        created_at: parse_timestamp(&created_at).map_err(|e| conversion_error(7, e))?,
        updated_at: parse_timestamp(&updated_at).map_err(|e| conversion_error(8, e))?,
        access_count: access_count.max(0) as u64,
    })
}

/// Decode a JSON column. SQL `NULL`, an empty string and JSON `null` all
/// read as the empty value; older writers stored untagged memories that way.
fn json_column<T: DeserializeOwned + Default>(idx: usize, raw: Option<&str>) -> rusqlite::Result<T> {
    match raw.map(str::trim).filter(|text| !text.is_empty()) {
        None => Ok(T::default()),
        Some(text) => serde_json::from_str::<Option<T>>(text)
            .map(Option::unwrap_or_default)
            .map_err(|e| conversion_error(idx, e)),
    }
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Insert a memory, or update every mutable column of the row with the same id.
///
/// `created_at` and `access_count` are never overwritten on update: identity
/// timestamps stay fixed and the counter only moves through
/// [`increment_access_count`].
pub fn save_memory(conn: &Connection, memory: &Memory) -> Result<()> {
    let tags = serde_json::to_string(&memory.tags)?;
    let metadata = serde_json::to_string(&memory.metadata)?;

    conn.execute(
        "INSERT INTO memories (id, content, type, topic_key, tags, trust, metadata, created_at, updated_at, access_count) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
         ON CONFLICT(id) DO UPDATE SET \
             content = excluded.content, \
             type = excluded.type, \
             topic_key = excluded.topic_key, \
             tags = excluded.tags, \
             trust = excluded.trust, \
             metadata = excluded.metadata, \
             updated_at = excluded.updated_at",
        params![
            memory.id,
            memory.content,
            memory.memory_type,
            memory.topic_key,
            tags,
            memory.trust,
            metadata,
            format_timestamp(&memory.created_at),
            format_timestamp(&memory.updated_at),
            memory.access_count as i64,
        ],
    )?;

    tracing::debug!(memory_id = %memory.id, "memory row saved");
    Ok(())
}

/// Fetch a memory by id.
pub fn get_memory(conn: &Connection, id: &str) -> Result<Option<Memory>> {
    let memory = conn
        .query_row(
            &format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1"),
            params![id],
            memory_from_row,
        )
        .optional()?;
    Ok(memory)
}

/// Most recently updated memory carrying `topic_key`.
pub fn get_memory_by_topic_key(conn: &Connection, topic_key: &str) -> Result<Option<Memory>> {
    let memory = conn
        .query_row(
            &format!(
                "SELECT {MEMORY_COLUMNS} FROM memories WHERE topic_key = ?1 \
                 ORDER BY updated_at DESC, rowid DESC LIMIT 1"
            ),
            params![topic_key],
            memory_from_row,
        )
        .optional()?;
    Ok(memory)
}

pub fn memory_exists(conn: &Connection, id: &str) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT COUNT(*) > 0 FROM memories WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// List memories matching every supplied filter, newest update first.
pub fn list_memories(conn: &Connection, filter: &ListOptions) -> Result<Vec<Memory>> {
    let mut conditions: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if !filter.types.is_empty() {
        conditions.push(format!("type IN ({})", placeholders(filter.types.len())));
        values.extend(filter.types.iter().map(|t| Value::Text(t.as_str().into())));
    }

    if !filter.trust_levels.is_empty() {
        conditions.push(format!("trust IN ({})", placeholders(filter.trust_levels.len())));
        values.extend(filter.trust_levels.iter().map(|t| Value::Text(t.as_str().into())));
    }

    if let Some(project) = &filter.project {
        conditions.push("json_extract(metadata, '$.project') = ?".into());
        values.push(Value::Text(project.clone()));
    }

    if let Some(prefix) = filter.topic_key_prefix.as_deref().filter(|p| !p.is_empty()) {
        // substr keeps the match literal and case-sensitive, unlike LIKE
        conditions.push("substr(topic_key, 1, ?) = ?".into());
        values.push(Value::Integer(prefix.chars().count() as i64));
        values.push(Value::Text(prefix.to_string()));
    }

    let mut sql = format!("SELECT {MEMORY_COLUMNS} FROM memories");
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY updated_at DESC, rowid DESC");

    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(limit as i64));
    }

    let mut stmt = conn.prepare(&sql)?;
    let memories = stmt
        .query_map(params_from_iter(values.iter()), memory_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(memories)
}

/// Bump the recall counter. Returns `false` if the memory no longer exists.
pub fn increment_access_count(conn: &Connection, id: &str) -> Result<bool> {
    let rows = conn.execute(
        "UPDATE memories SET access_count = access_count + 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(rows > 0)
}

/// Set the trust level and touch `updated_at`.
pub fn update_trust(conn: &Connection, id: &str, trust: TrustLevel) -> Result<()> {
    let rows = conn.execute(
        "UPDATE memories SET trust = ?1, updated_at = ?2 WHERE id = ?3",
        params![trust, format_timestamp(&now()), id],
    )?;
    if rows == 0 {
        return Err(Error::memory_not_found(id));
    }
    tracing::info!(memory_id = %id, trust = %trust, "trust updated");
    Ok(())
}

/// `?, ?, ?` with `n` markers.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
