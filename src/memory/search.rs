//! Hybrid recall: vector KNN ranks, keyword hits boost.
//!
//! Results keep the order the vector index returned them in; the keyword
//! signal only adds a flat bonus to the score used for thresholding.

use std::collections::HashSet;

use rusqlite::Connection;

use crate::error::Result;
use crate::memory::store;
use crate::memory::types::{MatchType, Memory, RecallOptions, ScoredMemory, TrustLevel};
use crate::memory::vector_to_bytes;

pub const DEFAULT_LIMIT: usize = 5;
pub const DEFAULT_MIN_SCORE: f64 = 0.3;

/// Weight of vector similarity in the final score.
pub const SEMANTIC_WEIGHT: f64 = 0.7;
/// Flat bonus for a candidate that is also a keyword hit. Additive, so a
/// boosted score can exceed [`SEMANTIC_WEIGHT`].
pub const KEYWORD_BOOST: f64 = 0.15;
/// Each search fetches this many times `limit` candidates.
pub const CANDIDATE_MULTIPLIER: usize = 2;

/// First KNN pass fetches this many times the wanted count; each widening doubles it.
const KNN_OVERSAMPLE: usize = 4;
/// sqlite-vec rejects larger `k`.
const MAX_KNN: usize = 4096;

/// Map L2 distance between unit vectors (0..=2) to a similarity in 0..=1.
pub fn similarity(distance: f64) -> f64 {
    (1.0 - distance / 2.0).clamp(0.0, 1.0)
}

/// One KNN pass: the `k` nearest index entries with the trust of their memory,
/// `None` when the memory row is gone.
fn nearest(
    conn: &Connection,
    embedding: &[f32],
    k: usize,
) -> Result<Vec<(String, f64, Option<TrustLevel>)>> {
    let mut stmt = conn.prepare(
        "SELECT v.memory_id, v.distance, m.trust FROM \
             (SELECT memory_id, distance FROM vec_memories WHERE embedding MATCH ?1 AND k = ?2) v \
         LEFT JOIN memories m ON m.id = v.memory_id \
         ORDER BY v.distance",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![vector_to_bytes(embedding), k as i64], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Walk the index nearest-first until `want` entries pass `accept`.
///
/// `k` starts at `want * KNN_OVERSAMPLE` and doubles while too few entries
/// pass, stopping once the index is exhausted or `k` reaches [`MAX_KNN`].
fn collect_nearest<T>(
    conn: &Connection,
    embedding: &[f32],
    want: usize,
    mut accept: impl FnMut(&str, f64, Option<TrustLevel>) -> Result<Option<T>>,
) -> Result<Vec<T>> {
    let mut k = want.saturating_mul(KNN_OVERSAMPLE).clamp(1, MAX_KNN);
    loop {
        let neighbours = nearest(conn, embedding, k)?;
        let exhausted = neighbours.len() < k || k == MAX_KNN;

        let mut kept = Vec::new();
        for (id, distance, trust) in &neighbours {
            if let Some(item) = accept(id, *distance, *trust)? {
                kept.push(item);
                if kept.len() == want {
                    break;
                }
            }
        }

        if kept.len() == want || exhausted {
            tracing::debug!(k, scanned = neighbours.len(), kept = kept.len(), "vector search");
            return Ok(kept);
        }
        k = k.saturating_mul(2).min(MAX_KNN);
    }
}

/// Nearest neighbours of `embedding` whose memory has one of `trust_levels`,
/// as `(memory_id, distance)` ascending by distance, at most `limit` long.
pub fn vector_search(
    conn: &Connection,
    embedding: &[f32],
    limit: usize,
    trust_levels: &[TrustLevel],
) -> Result<Vec<(String, f64)>> {
    if limit == 0 || trust_levels.is_empty() {
        return Ok(Vec::new());
    }

    collect_nearest(conn, embedding, limit, |id, distance, trust| {
        Ok(trust
            .filter(|t| trust_levels.contains(t))
            .map(|_| (id.to_string(), distance)))
    })
}

/// Memory ids matching every term of `query`, best BM25 rank first.
pub fn keyword_search(conn: &Connection, query: &str, limit: usize) -> Result<Vec<String>> {
    let escaped = escape_fts_query(query);
    if escaped.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT m.id FROM fts_memories f JOIN memories m ON m.rowid = f.rowid \
         WHERE fts_memories MATCH ?1 ORDER BY f.rank LIMIT ?2",
    )?;
    let ids = stmt
        .query_map(rusqlite::params![escaped, limit as i64], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    tracing::debug!(hits = ids.len(), "keyword search");
    Ok(ids)
}

/// Escape a user query for FTS5 MATCH syntax.
///
/// Wraps each whitespace-delimited word in double quotes so FTS5 treats them
/// as plain terms (implicit AND). Embedded quotes are stripped.
pub fn escape_fts_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| word.replace('"', ""))
        .filter(|word| !word.is_empty())
        .map(|word| format!("\"{word}\""))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Post-fetch filters: type, tags (any of), project, topic-key prefix, trust.
fn matches_filters(memory: &Memory, options: &RecallOptions, trust_levels: &[TrustLevel]) -> bool {
    if !trust_levels.contains(&memory.trust) {
        return false;
    }
    if !options.types.is_empty() && !options.types.contains(&memory.memory_type) {
        return false;
    }
    if !options.tags.is_empty() && !memory.tags.iter().any(|t| options.tags.contains(t)) {
        return false;
    }
    if let Some(project) = &options.project {
        if memory.metadata.project.as_ref() != Some(project) {
            return false;
        }
    }
    if let Some(prefix) = options.topic_key_prefix.as_deref().filter(|p| !p.is_empty()) {
        if !memory.topic_key.as_deref().is_some_and(|k| k.starts_with(prefix)) {
            return false;
        }
    }
    true
}

/// Rank memories for `query` given its embedding.
///
/// A vector-search failure aborts; a keyword-search failure degrades to an
/// empty keyword set. Every candidate that clears `min_score` has its access
/// counter bumped before the list is cut to `limit`.
pub fn recall_by_query(
    conn: &Connection,
    query_embedding: &[f32],
    query_text: &str,
    options: &RecallOptions,
) -> Result<Vec<ScoredMemory>> {
    let limit = if options.limit == 0 {
        DEFAULT_LIMIT
    } else {
        options.limit
    };
    let trust_levels: &[TrustLevel] = if options.trust_levels.is_empty() {
        TrustLevel::RECALL_DEFAULT
    } else {
        &options.trust_levels
    };
    let candidate_limit = limit.saturating_mul(CANDIDATE_MULTIPLIER);

    // Record filters run inside the KNN walk so they cannot starve the candidate set.
    let candidates = collect_nearest(conn, query_embedding, candidate_limit, |id, distance, trust| {
        if !trust.is_some_and(|t| trust_levels.contains(&t)) {
            return Ok(None);
        }
        // Deleted between the index read and the fetch.
        let Some(memory) = store::get_memory(conn, id)? else {
            return Ok(None);
        };
        Ok(matches_filters(&memory, options, trust_levels).then_some((memory, distance)))
    })?;

    let keyword_hits: HashSet<String> = match keyword_search(conn, query_text, candidate_limit) {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => {
            tracing::warn!(error = %e, "keyword search failed, ranking on vectors only");
            HashSet::new()
        }
    };

    let candidate_count = candidates.len();
    let mut kept: Vec<ScoredMemory> = Vec::new();
    for (memory, distance) in candidates {
        let boosted = keyword_hits.contains(&memory.id);
        let boost = if boosted { KEYWORD_BOOST } else { 0.0 };
        let score = SEMANTIC_WEIGHT * similarity(distance) + boost;
        if score < options.min_score {
            continue;
        }

        kept.push(ScoredMemory {
            memory,
            score,
            match_type: if boosted {
                MatchType::Hybrid
            } else {
                MatchType::Semantic
            },
        });
    }

    for hit in &mut kept {
        match store::increment_access_count(conn, &hit.memory.id) {
            Ok(true) => hit.memory.access_count += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(memory_id = %hit.memory.id, error = %e, "failed to record access");
            }
        }
    }

    kept.truncate(limit);
    tracing::debug!(
        candidates = candidate_count,
        keyword_hits = keyword_hits.len(),
        returned = kept.len(),
        "recall complete"
    );
    Ok(kept)
}
