//! Directed, typed edges between memories.
//!
//! Duplicate edges are allowed. Both endpoints are checked at call time;
//! deleting either endpoint later cascades the edge away.

use rusqlite::{params, Connection, Row};

use crate::error::{Error, Result};
use crate::memory::lifecycle::{format_timestamp, new_id, now, parse_timestamp};
use crate::memory::store::memory_exists;
use crate::memory::types::{Relation, RelationType};

const RELATION_COLUMNS: &str = "id, from_id, to_id, type, note, created_at";

fn relation_from_row(row: &Row<'_>) -> rusqlite::Result<Relation> {
    let created_at: String = row.get(5)?;
    Ok(Relation {
        id: row.get(0)?,
        from_id: row.get(1)?,
        to_id: row.get(2)?,
        relation_type: row.get(3)?,
        note: row.get(4)?,
        created_at: parse_timestamp(&created_at).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

/// Create the edge `from_id -[relation_type]-> to_id`.
pub fn create_relation(
    conn: &Connection,
    from_id: &str,
    to_id: &str,
    relation_type: RelationType,
    note: Option<&str>,
) -> Result<Relation> {
    for id in [from_id, to_id] {
        if !memory_exists(conn, id)? {
            return Err(Error::memory_not_found(id));
        }
    }

    let relation = Relation {
        id: new_id(),
        from_id: from_id.to_string(),
        to_id: to_id.to_string(),
        relation_type,
        note: note.map(str::to_string).filter(|n| !n.trim().is_empty()),
        created_at: now(),
    };

    conn.execute(
        "INSERT INTO relations (id, from_id, to_id, type, note, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            relation.id,
            relation.from_id,
            relation.to_id,
            relation.relation_type,
            relation.note,
            format_timestamp(&relation.created_at),
        ],
    )?;

    tracing::info!(
        relation_id = %relation.id,
        from_id,
        to_id,
        relation_type = %relation_type,
        "relation stored"
    );
    Ok(relation)
}

/// Every edge touching `memory_id`: outgoing first, then incoming, each in
/// creation order. A self-loop is reported once, as outgoing.
pub fn get_relations(conn: &Connection, memory_id: &str) -> Result<Vec<Relation>> {
    let mut relations = query_relations(
        conn,
        &format!(
            "SELECT {RELATION_COLUMNS} FROM relations WHERE from_id = ?1 \
             ORDER BY created_at, rowid"
        ),
        memory_id,
    )?;
    relations.extend(query_relations(
        conn,
        &format!(
            "SELECT {RELATION_COLUMNS} FROM relations WHERE to_id = ?1 AND from_id <> ?1 \
             ORDER BY created_at, rowid"
        ),
        memory_id,
    )?);
    Ok(relations)
}

fn query_relations(conn: &Connection, sql: &str, memory_id: &str) -> Result<Vec<Relation>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![memory_id], relation_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::store::save_memory;
    use crate::memory::store::tests::{sample, test_db};
    use crate::memory::types::Direction;

    #[test]
    fn test_store_relation_basic() {
        let conn = test_db();
        let a = sample("TypeError in handler");
        let b = sample("guard against undefined");
        save_memory(&conn, &a).unwrap();
        save_memory(&conn, &b).unwrap();

        let rel = create_relation(&conn, &b.id, &a.id, RelationType::Solves, Some("seen twice")).unwrap();
        assert_eq!(rel.from_id, b.id);
        assert_eq!(rel.to_id, a.id);
        assert_eq!(rel.note.as_deref(), Some("seen twice"));

        let from_b = get_relations(&conn, &b.id).unwrap();
        let from_a = get_relations(&conn, &a.id).unwrap();
        assert_eq!(from_b, vec![rel.clone()]);
        assert_eq!(from_a, vec![rel.clone()]);
        assert_eq!(from_b[0].direction_from(&b.id), Some(Direction::Outgoing));
        assert_eq!(from_a[0].direction_from(&a.id), Some(Direction::Incoming));
    }

    #[test]
    fn test_duplicates_are_kept() {
        let conn = test_db();
        let a = sample("a");
        let b = sample("b");
        save_memory(&conn, &a).unwrap();
        save_memory(&conn, &b).unwrap();

        let r1 = create_relation(&conn, &a.id, &b.id, RelationType::Requires, None).unwrap();
        let r2 = create_relation(&conn, &a.id, &b.id, RelationType::Requires, None).unwrap();
        assert_ne!(r1.id, r2.id);
        assert_eq!(get_relations(&conn, &a.id).unwrap().len(), 2);
    }

    #[test]
    fn test_store_relation_not_found() {
        let conn = test_db();
        let a = sample("a");
        save_memory(&conn, &a).unwrap();

        let err = create_relation(&conn, &a.id, "ghost", RelationType::Causes, None).unwrap_err();
        assert!(err.is_not_found());
        let err = create_relation(&conn, "ghost", &a.id, RelationType::Causes, None).unwrap_err();
        assert!(err.is_not_found());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM relations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_self_loop_reported_once() {
        let conn = test_db();
        let a = sample("a");
        save_memory(&conn, &a).unwrap();
        create_relation(&conn, &a.id, &a.id, RelationType::RelatedTo, None).unwrap();

        let rels = get_relations(&conn, &a.id).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].direction_from(&a.id), Some(Direction::Outgoing));
    }

    #[test]
    fn test_blank_note_dropped() {
        let conn = test_db();
        let a = sample("a");
        let b = sample("b");
        save_memory(&conn, &a).unwrap();
        save_memory(&conn, &b).unwrap();
        let rel = create_relation(&conn, &a.id, &b.id, RelationType::PartOf, Some("  ")).unwrap();
        assert!(rel.note.is_none());
    }

    #[test]
    fn test_unknown_memory_has_no_relations() {
        let conn = test_db();
        assert!(get_relations(&conn, "ghost").unwrap().is_empty());
    }
}
