//! SQL DDL for all Cortex tables.
//!
//! Defines the `memories`, `relations`, `embeddings`, `fts_memories` (FTS5),
//! `vec_memories` (vec0) and `schema_meta` tables. All DDL uses
//! `IF NOT EXISTS` for idempotent initialization.

use rusqlite::Connection;

/// Core tables plus the keyword index and the triggers that keep it in lockstep
/// with `memories`.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'general'
        CHECK(type IN ('general','error','pattern','decision','context','procedure')),
    topic_key TEXT,
    tags TEXT NOT NULL DEFAULT '[]',
    trust TEXT NOT NULL DEFAULT 'proposed'
        CHECK(trust IN ('proposed','validated','proven','disputed','obsolete')),
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    access_count INTEGER NOT NULL DEFAULT 0 CHECK(access_count >= 0)
);

CREATE INDEX IF NOT EXISTS idx_memories_topic_key ON memories(topic_key);
CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(type);
CREATE INDEX IF NOT EXISTS idx_memories_trust ON memories(trust);
CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(created_at);

CREATE TABLE IF NOT EXISTS relations (
    id TEXT PRIMARY KEY,
    from_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    to_id TEXT NOT NULL REFERENCES memories(id) ON DELETE CASCADE,
    type TEXT NOT NULL
        CHECK(type IN ('causes','solves','replaces','requires','related_to','part_of','contradicts')),
    note TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_relations_from ON relations(from_id);
CREATE INDEX IF NOT EXISTS idx_relations_to ON relations(to_id);
CREATE INDEX IF NOT EXISTS idx_relations_type ON relations(type);

-- Raw vectors (little-endian f32), the source for rebuilding vec_memories
CREATE TABLE IF NOT EXISTS embeddings (
    memory_id TEXT PRIMARY KEY REFERENCES memories(id) ON DELETE CASCADE,
    embedding BLOB NOT NULL,
    model TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE VIRTUAL TABLE IF NOT EXISTS fts_memories USING fts5(
    content,
    topic_key,
    tags,
    content='memories',
    content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS memories_ai AFTER INSERT ON memories BEGIN
    INSERT INTO fts_memories(rowid, content, topic_key, tags)
    VALUES (new.rowid, new.content, new.topic_key, new.tags);
END;

CREATE TRIGGER IF NOT EXISTS memories_ad AFTER DELETE ON memories BEGIN
    INSERT INTO fts_memories(fts_memories, rowid, content, topic_key, tags)
    VALUES ('delete', old.rowid, old.content, old.topic_key, old.tags);
END;

CREATE TRIGGER IF NOT EXISTS memories_au AFTER UPDATE OF content, topic_key, tags ON memories BEGIN
    INSERT INTO fts_memories(fts_memories, rowid, content, topic_key, tags)
    VALUES ('delete', old.rowid, old.content, old.topic_key, old.tags);
    INSERT INTO fts_memories(rowid, content, topic_key, tags)
    VALUES (new.rowid, new.content, new.topic_key, new.tags);
END;

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// vec0 DDL; the vector width is fixed at creation time.
fn vec_table_sql(dimensions: usize) -> String {
    format!(
        "CREATE VIRTUAL TABLE IF NOT EXISTS vec_memories USING vec0(\
         memory_id TEXT PRIMARY KEY, embedding FLOAT[{dimensions}])"
    )
}

/// Initialize all schema tables. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection, dimensions: usize) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute_batch(&vec_table_sql(dimensions))?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('embedding_dimensions', ?1)",
        [dimensions.to_string()],
    )?;

    Ok(())
}
