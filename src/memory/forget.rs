//! Permanent memory deletion.
//!
//! Removes the vector-index entry and the memory row in one transaction. The
//! foreign keys cascade to relations and the embedding cache; the delete
//! trigger clears the keyword index.

use rusqlite::{params, Connection};

use crate::error::{Error, Result};

/// Delete a memory and everything derived from it.
pub fn delete_memory(conn: &mut Connection, memory_id: &str) -> Result<()> {
    let tx = conn.transaction()?;

    let exists: bool = tx.query_row(
        "SELECT COUNT(*) > 0 FROM memories WHERE id = ?1",
        params![memory_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(Error::memory_not_found(memory_id));
    }

    let relations: i64 = tx.query_row(
        "SELECT COUNT(*) FROM relations WHERE from_id = ?1 OR to_id = ?1",
        params![memory_id],
        |row| row.get(0),
    )?;

    // vec0 is a virtual table, outside the reach of the cascade
    tx.execute("DELETE FROM vec_memories WHERE memory_id = ?1", params![memory_id])?;
    tx.execute("DELETE FROM memories WHERE id = ?1", params![memory_id])?;

    tx.commit()?;

    tracing::info!(memory_id, relations_removed = relations, "memory deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::embeddings::{get_embedding, has_index_entry, save_embedding};
    use crate::memory::relations::{create_relation, get_relations};
    use crate::memory::store::tests::{sample, test_db};
    use crate::memory::store::{get_memory, save_memory};
    use crate::memory::types::RelationType;

    fn spike(i: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; 8];
        v[i] = 1.0;
        v
    }

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn delete_removes_from_all_tables() {
        let mut conn = test_db();
        let m = sample("ephemeral quantum note");
        save_memory(&conn, &m).unwrap();
        save_embedding(&conn, &m.id, &spike(0), "test").unwrap();

        delete_memory(&mut conn, &m.id).unwrap();

        assert!(get_memory(&conn, &m.id).unwrap().is_none());
        assert!(get_embedding(&conn, &m.id).unwrap().is_none());
        assert!(!has_index_entry(&conn, &m.id).unwrap());
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM fts_memories WHERE fts_memories MATCH 'quantum'"),
            0
        );
    }

    #[test]
    fn delete_cascades_relations() {
        let mut conn = test_db();
        let a = sample("a");
        let b = sample("b");
        let c = sample("c");
        for m in [&a, &b, &c] {
            save_memory(&conn, m).unwrap();
        }
        create_relation(&conn, &a.id, &b.id, RelationType::Solves, None).unwrap();
        create_relation(&conn, &c.id, &a.id, RelationType::Causes, None).unwrap();
        create_relation(&conn, &b.id, &c.id, RelationType::RelatedTo, None).unwrap();

        delete_memory(&mut conn, &a.id).unwrap();

        assert_eq!(count(&conn, "SELECT COUNT(*) FROM relations"), 1);
        assert_eq!(get_relations(&conn, &b.id).unwrap().len(), 1);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let mut conn = test_db();
        let err = delete_memory(&mut conn, "nonexistent").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_leaves_other_memories() {
        let mut conn = test_db();
        let keep = sample("keep");
        let gone = sample("gone");
        save_memory(&conn, &keep).unwrap();
        save_memory(&conn, &gone).unwrap();
        save_embedding(&conn, &keep.id, &spike(0), "test").unwrap();
        save_embedding(&conn, &gone.id, &spike(1), "test").unwrap();

        delete_memory(&mut conn, &gone.id).unwrap();

        assert!(get_memory(&conn, &keep.id).unwrap().is_some());
        assert!(has_index_entry(&conn, &keep.id).unwrap());
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM vec_memories"), 1);
    }
}
