//! The public facade over storage, embeddings and retrieval.
//!
//! An [`Engine`] owns one SQLite connection and one embedding provider. Every
//! operation runs synchronously on the caller's thread.

use std::path::Path;

use rusqlite::Connection;
use serde::Serialize;

use crate::config::{CortexConfig, RetrievalConfig};
use crate::db::{self, migrations};
use crate::embedding::{self, EmbeddingProvider};
use crate::error::{ConsistencyWarning, Error, Result, WarningStage};
use crate::memory::lifecycle::{effective_topic_key, now, plan_store};
use crate::memory::stats::Stats;
use crate::memory::types::{
    ListOptions, Memory, RecallOptions, Relation, RelationType, ScoredMemory, StoreOptions,
    TrustLevel,
};
use crate::memory::{embeddings, forget, relations, search, stats, store};

/// Memories sent to the provider per `embed_batch` call during reindex.
pub const REINDEX_BATCH_SIZE: usize = 32;

/// Result of [`Engine::store`].
#[derive(Debug, Clone, Serialize)]
pub struct StoreOutcome {
    pub memory: Memory,
    /// `true` when an existing memory with the same topic key was evolved.
    pub updated: bool,
    /// Set when the record was saved but its embedding was not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<ConsistencyWarning>,
}

/// Result of [`Engine::reindex`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    /// Index entries rebuilt from the embedding cache.
    pub restored: usize,
    /// Memories embedded by the provider and written through.
    pub embedded: usize,
    /// Memories whose embedding or write failed.
    pub failed: usize,
}

pub struct Engine {
    conn: Connection,
    provider: Box<dyn EmbeddingProvider>,
    retrieval: RetrievalConfig,
}

impl Engine {
    /// Build the provider from `config`, then open the store it points at.
    pub fn open(config: &CortexConfig) -> Result<Self> {
        let provider = embedding::create_provider(&config.embedding)?;
        let path = config.resolved_db_path();
        let mut engine = Self::open_at(&path, provider)?;
        engine.retrieval = config.retrieval.clone();
        Ok(engine)
    }

    /// Open the store at `path` with an already-built provider.
    pub fn open_at(path: impl AsRef<Path>, provider: Box<dyn EmbeddingProvider>) -> Result<Self> {
        let conn = db::open_database(path, provider.dimensions())?;
        Self::with_provider(conn, provider)
    }

    /// Wrap an initialized connection. The index width must match the provider.
    pub fn with_provider(conn: Connection, provider: Box<dyn EmbeddingProvider>) -> Result<Self> {
        if let Some(stored) = migrations::get_embedding_dimensions(&conn)? {
            if stored != provider.dimensions() {
                return Err(Error::Config(format!(
                    "store holds {stored}-dimensional vectors but provider {} produces {}",
                    provider.model(),
                    provider.dimensions()
                )));
            }
        }
        if let Some(recorded) = migrations::get_embedding_model(&conn)? {
            if recorded != provider.model() {
                tracing::warn!(
                    recorded = %recorded,
                    active = %provider.model(),
                    "index was built with another embedding model, run reindex"
                );
            }
        }
        Ok(Self {
            conn,
            provider,
            retrieval: RetrievalConfig::default(),
        })
    }

    /// Release the store.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Storage(e))
    }

    /// Recall options seeded from the configured limit and threshold.
    pub fn recall_options(&self) -> RecallOptions {
        RecallOptions {
            limit: self.retrieval.default_limit,
            min_score: self.retrieval.min_score,
            ..RecallOptions::default()
        }
    }

    /// Save `content` as a new memory, or evolve the one holding `options.topic_key`.
    ///
    /// The record is durable once this returns `Ok`. Embedding is best-effort:
    /// a provider or index failure comes back as [`StoreOutcome::warning`].
    pub fn store(&self, content: &str, options: &StoreOptions) -> Result<StoreOutcome> {
        let existing = match effective_topic_key(options) {
            Some(key) => store::get_memory_by_topic_key(&self.conn, key)?,
            None => None,
        };

        let plan = plan_store(existing, content, options, now())?;
        store::save_memory(&self.conn, &plan.memory)?;
        tracing::info!(
            memory_id = %plan.memory.id,
            updated = plan.updated,
            memory_type = %plan.memory.memory_type,
            "memory stored"
        );

        let warning = self.embed_and_index(&plan.memory);
        Ok(StoreOutcome {
            memory: plan.memory,
            updated: plan.updated,
            warning,
        })
    }

    fn embed_and_index(&self, memory: &Memory) -> Option<ConsistencyWarning> {
        let vector = match self.provider.embed(&memory.content) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(memory_id = %memory.id, error = %format!("{e:#}"), "embedding failed, memory not indexed");
                return Some(ConsistencyWarning {
                    memory_id: memory.id.clone(),
                    stage: WarningStage::Embed,
                    message: format!("{e:#}"),
                });
            }
        };

        if let Err(e) = embeddings::save_embedding(&self.conn, &memory.id, &vector, self.provider.model()) {
            tracing::warn!(memory_id = %memory.id, error = %e, "index write failed, memory not indexed");
            return Some(ConsistencyWarning {
                memory_id: memory.id.clone(),
                stage: WarningStage::Index,
                message: e.to_string(),
            });
        }

        if let Err(e) = migrations::set_embedding_model(&self.conn, self.provider.model()) {
            tracing::warn!(error = %e, "failed to record embedding model");
        }
        None
    }

    /// Hybrid recall for `query`. Fails if the query cannot be embedded.
    pub fn recall(&self, query: &str, options: &RecallOptions) -> Result<Vec<ScoredMemory>> {
        if query.trim().is_empty() {
            return Err(Error::Validation("query must not be empty".into()));
        }
        let embedding = self.provider.embed(query).map_err(Error::Provider)?;
        search::recall_by_query(&self.conn, &embedding, query, options)
    }

    pub fn get(&self, id: &str) -> Result<Memory> {
        store::get_memory(&self.conn, id)?.ok_or_else(|| Error::memory_not_found(id))
    }

    pub fn list(&self, options: &ListOptions) -> Result<Vec<Memory>> {
        store::list_memories(&self.conn, options)
    }

    /// Delete a memory, its relations, its cached embedding and both index entries.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        forget::delete_memory(&mut self.conn, id)
    }

    /// Set the trust level; `None` promotes to [`TrustLevel::Validated`].
    pub fn validate(&self, id: &str, trust: Option<TrustLevel>) -> Result<()> {
        store::update_trust(&self.conn, id, trust.unwrap_or(TrustLevel::Validated))
    }

    pub fn relate(
        &self,
        from_id: &str,
        to_id: &str,
        relation_type: RelationType,
        note: Option<&str>,
    ) -> Result<Relation> {
        relations::create_relation(&self.conn, from_id, to_id, relation_type, note)
    }

    /// Outgoing and incoming edges of `id`, each once.
    pub fn get_relations(&self, id: &str) -> Result<Vec<Relation>> {
        relations::get_relations(&self.conn, id)
    }

    /// Store statistics, including the active provider's model.
    pub fn stats(&self) -> Result<Stats> {
        let mut stats = stats::memory_stats(&self.conn)?;
        stats.active_model = Some(self.provider.model().to_string());
        Ok(stats)
    }

    /// Bring the vector index back in line with the memory table.
    ///
    /// First restores index entries from cached embeddings of the active model,
    /// then embeds every memory lacking such a cache row (every memory when
    /// `force`). `progress` receives `(done, total)` for the embedding pass.
    /// A failed batch is counted in [`ReindexReport::failed`] and the pass continues.
    pub fn reindex(&self, force: bool, mut progress: impl FnMut(usize, usize)) -> Result<ReindexReport> {
        let model = self.provider.model().to_string();
        let restored = embeddings::restore_index_from_cache(&self.conn, &model)?;
        let pending = embeddings::memories_needing_embedding(&self.conn, &model, force)?;

        let total = pending.len();
        let mut report = ReindexReport {
            restored,
            ..ReindexReport::default()
        };
        let mut done = 0;
        progress(done, total);

        for chunk in pending.chunks(REINDEX_BATCH_SIZE) {
            let texts: Vec<&str> = chunk.iter().map(|(_, content)| content.as_str()).collect();

            match self.provider.embed_batch(&texts) {
                Ok(vectors) if vectors.len() == chunk.len() => {
                    for ((id, _), vector) in chunk.iter().zip(vectors.iter()) {
                        match embeddings::save_embedding(&self.conn, id, vector, &model) {
                            Ok(()) => report.embedded += 1,
                            Err(e) => {
                                tracing::warn!(memory_id = %id, error = %e, "reindex write failed");
                                report.failed += 1;
                            }
                        }
                    }
                }
                Ok(vectors) => {
                    tracing::warn!(expected = chunk.len(), got = vectors.len(), "provider returned a short batch");
                    report.failed += chunk.len();
                }
                Err(e) => {
                    tracing::warn!(batch_size = chunk.len(), error = %format!("{e:#}"), "reindex batch failed");
                    report.failed += chunk.len();
                }
            }

            done += chunk.len();
            progress(done, total);
        }

        if report.embedded > 0 {
            migrations::set_embedding_model(&self.conn, &model)?;
        }

        tracing::info!(
            restored = report.restored,
            embedded = report.embedded,
            failed = report.failed,
            "reindex complete"
        );
        Ok(report)
    }
}

/// Open an engine for `config`, run `f`, and close the engine whether or not
/// `f` succeeded. An error from `f` takes precedence over a close error.
pub fn with_engine<T>(config: &CortexConfig, f: impl FnOnce(&mut Engine) -> Result<T>) -> Result<T> {
    let mut engine = Engine::open(config)?;
    let result = f(&mut engine);
    let closed = engine.close();

    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), closed) => {
            if let Err(close_err) = closed {
                tracing::warn!(error = %close_err, "failed to close store after error");
            }
            Err(e)
        }
    }
}
