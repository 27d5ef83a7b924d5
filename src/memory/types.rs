//! Core memory type definitions.
//!
//! Defines [`MemoryType`], [`TrustLevel`] and [`RelationType`] (the closed
//! vocabularies stored as text columns), [`Memory`] and [`Relation`] (full
//! records), and the per-call option values the engine operations take.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Implements `as_str`, `Display`, `FromStr` and the rusqlite text conversions
/// for a closed string vocabulary.
macro_rules! text_enum {
    ($name:ident, $label:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All values, in declaration order.
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            /// SQL-compatible string representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => {
                        let valid: Vec<&str> = Self::ALL.iter().map(|v| v.as_str()).collect();
                        Err(Error::Validation(format!(
                            "unknown {}: {s} (expected one of: {})",
                            $label,
                            valid.join(", ")
                        )))
                    }
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

/// What kind of knowledge a memory holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    #[default]
    General,
    /// Something that failed.
    Error,
    /// A reusable solution.
    Pattern,
    /// Why something was chosen.
    Decision,
    /// Project state or background.
    Context,
    /// How to do something.
    Procedure,
}

text_enum!(MemoryType, "memory type", {
    General => "general",
    Error => "error",
    Pattern => "pattern",
    Decision => "decision",
    Context => "context",
    Procedure => "procedure",
});

/// Validation state of a memory. Gates default recall visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    /// Suggested by an agent, not yet confirmed.
    #[default]
    Proposed,
    /// Confirmed by a human or used successfully.
    Validated,
    /// Used successfully many times.
    Proven,
    /// Someone questioned it.
    Disputed,
    /// No longer applies.
    Obsolete,
}

text_enum!(TrustLevel, "trust level", {
    Proposed => "proposed",
    Validated => "validated",
    Proven => "proven",
    Disputed => "disputed",
    Obsolete => "obsolete",
});

impl TrustLevel {
    /// Levels visible to recall when the caller does not choose.
    pub const RECALL_DEFAULT: &'static [TrustLevel] = &[TrustLevel::Validated, TrustLevel::Proven];
}

/// Label of a directed edge `from -> to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Causes,
    Solves,
    Replaces,
    Requires,
    RelatedTo,
    PartOf,
    Contradicts,
}

text_enum!(RelationType, "relation type", {
    Causes => "causes",
    Solves => "solves",
    Replaces => "replaces",
    Requires => "requires",
    RelatedTo => "related_to",
    PartOf => "part_of",
    Contradicts => "contradicts",
});

/// Open extension data stored as a JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// A memory record, matching the `memories` table schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub memory_type: MemoryType,
    /// Logical-evolution key; repeated stores against it update this record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_key: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub trust: TrustLevel,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of times this memory was returned by recall.
    pub access_count: u64,
}

/// A directed, typed edge between two memories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    #[serde(rename = "type")]
    pub relation_type: RelationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Which end of a relation a given memory sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Relation {
    /// Direction of this edge as seen from `memory_id`, or `None` if it is not an endpoint.
    pub fn direction_from(&self, memory_id: &str) -> Option<Direction> {
        if self.from_id == memory_id {
            Some(Direction::Outgoing)
        } else if self.to_id == memory_id {
            Some(Direction::Incoming)
        } else {
            None
        }
    }

    /// The endpoint that is not `memory_id`.
    pub fn other_end(&self, memory_id: &str) -> &str {
        if self.from_id == memory_id {
            &self.to_id
        } else {
            &self.from_id
        }
    }
}

/// How a recall hit was matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Vector similarity only.
    Semantic,
    /// Vector similarity plus a keyword hit.
    Hybrid,
}

/// A recall hit with its blended score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMemory {
    pub memory: Memory,
    pub score: f64,
    pub match_type: MatchType,
}

/// Options for [`crate::Engine::store`]. `None` means "not supplied".
#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub topic_key: Option<String>,
    pub tags: Option<Vec<String>>,
    pub memory_type: Option<MemoryType>,
    pub trust: Option<TrustLevel>,
    pub project: Option<String>,
    pub source: Option<String>,
    pub author: Option<String>,
    pub extra: BTreeMap<String, String>,
}

/// Options for [`crate::Engine::recall`].
#[derive(Debug, Clone)]
pub struct RecallOptions {
    /// Maximum number of results; `0` means the default.
    pub limit: usize,
    pub min_score: f64,
    pub types: Vec<MemoryType>,
    /// Matches records carrying at least one of these tags.
    pub tags: Vec<String>,
    /// Empty means [`TrustLevel::RECALL_DEFAULT`].
    pub trust_levels: Vec<TrustLevel>,
    pub project: Option<String>,
    pub topic_key_prefix: Option<String>,
}

impl Default for RecallOptions {
    fn default() -> Self {
        Self {
            limit: crate::memory::search::DEFAULT_LIMIT,
            min_score: crate::memory::search::DEFAULT_MIN_SCORE,
            types: Vec::new(),
            tags: Vec::new(),
            trust_levels: TrustLevel::RECALL_DEFAULT.to_vec(),
            project: None,
            topic_key_prefix: None,
        }
    }
}

/// Filter for [`crate::Engine::list`]. Empty collections and `None` mean "no filter".
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub types: Vec<MemoryType>,
    pub trust_levels: Vec<TrustLevel>,
    pub project: Option<String>,
    pub topic_key_prefix: Option<String>,
    pub limit: Option<usize>,
}
