//! Upsert-by-topic-key planning, identifier allocation and timestamps.
//!
//! [`plan_store`] is pure: given the record currently holding the topic key (if
//! any) it produces the record to persist. The engine does the lookup and the
//! write around it.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{Error, Result};
use crate::memory::types::{Memory, Metadata, StoreOptions};

/// Allocate a new memory or relation identifier (122 random bits).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Current time, truncated to the precision timestamps are persisted with.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    parse_timestamp(&format_timestamp(&now)).unwrap_or(now)
}

/// ISO-8601 UTC with microseconds and a `Z` suffix; sorts lexicographically.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// The record to persist for a store call, and whether it evolves an existing one.
#[derive(Debug)]
pub struct StorePlan {
    pub memory: Memory,
    pub updated: bool,
}

/// Non-empty, trimmed topic key, if one was supplied.
pub fn effective_topic_key(options: &StoreOptions) -> Option<&str> {
    options
        .topic_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
}

/// Trim, drop blanks, and de-duplicate keeping first occurrence.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Decide the record a store call persists.
///
/// With an `existing` record: content and `updated_at` always change; tags, type
/// and trust change only where the option was supplied; id, `created_at`,
/// metadata and the access counter are kept. Without one: a fresh record with
/// defaults for anything not supplied.
pub fn plan_store(
    existing: Option<Memory>,
    content: &str,
    options: &StoreOptions,
    now: DateTime<Utc>,
) -> Result<StorePlan> {
    if content.trim().is_empty() {
        return Err(Error::Validation("content must not be empty".into()));
    }

    if let Some(mut memory) = existing {
        memory.content = content.to_string();
        memory.updated_at = now;
        if let Some(tags) = &options.tags {
            memory.tags = normalize_tags(tags);
        }
        if let Some(memory_type) = options.memory_type {
            memory.memory_type = memory_type;
        }
        if let Some(trust) = options.trust {
            memory.trust = trust;
        }
        return Ok(StorePlan {
            memory,
            updated: true,
        });
    }

    let memory = Memory {
        id: new_id(),
        content: content.to_string(),
        memory_type: options.memory_type.unwrap_or_default(),
        topic_key: effective_topic_key(options).map(str::to_string),
        tags: options.tags.as_deref().map(normalize_tags).unwrap_or_default(),
        trust: options.trust.unwrap_or_default(),
        metadata: Metadata {
            source: options.source.clone(),
            project: options.project.clone(),
            author: options.author.clone(),
            extra: options.extra.clone(),
        },
        created_at: now,
        updated_at: now,
        access_count: 0,
    };

    Ok(StorePlan {
        memory,
        updated: false,
    })
}
