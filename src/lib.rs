//! Long-term memory for coding agents.
//!
//! Cortex stores short textual memories (errors seen, patterns that worked,
//! decisions taken) in a single SQLite file and recalls them by meaning. Each
//! memory carries a type, tags, a trust level and optional project metadata;
//! memories can be linked by typed, directed relations.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with FTS5 for keyword search and
//!   [sqlite-vec](https://github.com/asg017/sqlite-vec) for vector search
//! - **Embeddings**: an HTTP provider (OpenAI or Ollama) behind the
//!   [`embedding::EmbeddingProvider`] trait
//! - **Recall**: vector nearest neighbours ranked in index order, with a flat
//!   bonus for keyword hits, filtered by trust level
//! - **Evolution**: storing against an existing topic key updates that memory
//!   in place instead of adding a new one
//!
//! ```no_run
//! use cortex::config::CortexConfig;
//! use cortex::memory::types::{RecallOptions, StoreOptions};
//!
//! # fn main() -> cortex::Result<()> {
//! let config = CortexConfig::default();
//! cortex::with_engine(&config, |engine| {
//!     engine.store("cargo test needs --features vtab for sqlite-vec", &StoreOptions::default())?;
//!     for hit in engine.recall("sqlite-vec build flags", &RecallOptions::default())? {
//!         println!("{:.2} {}", hit.score, hit.memory.content);
//!     }
//!     Ok(())
//! })
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema and migrations
//! - [`embedding`]: text-to-vector providers
//! - [`memory`]: repositories, recall and the store lifecycle
//! - [`engine`]: the [`Engine`] facade tying them together

pub mod config;
pub mod db;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod memory;

pub use engine::{with_engine, Engine, ReindexReport, StoreOutcome};
pub use error::{ConsistencyWarning, Error, Result, WarningStage};
