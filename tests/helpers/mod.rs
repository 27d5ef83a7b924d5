#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use cortex::embedding::EmbeddingProvider;
use cortex::memory::types::{StoreOptions, TrustLevel};
use cortex::Engine;
use rusqlite::Connection;

/// Vector width used by every test store.
pub const DIMS: usize = 16;
pub const MODEL: &str = "fake-embed-1";

/// Unit vector along dimension `i`.
pub fn spike(i: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    v[i % DIMS] = 1.0;
    v
}

/// Unit vector in the plane of dimensions 0 and 1, `theta` radians from `spike(0)`.
pub fn at_angle(theta: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; DIMS];
    v[0] = theta.cos();
    v[1] = theta.sin();
    v
}

/// Deterministic embedding provider.
///
/// Texts registered with [`FakeProvider::with`] map to their vector; anything
/// else maps to a spike chosen by an FNV hash of the text. Flipping the shared
/// switch makes every call fail.
pub struct FakeProvider {
    script: HashMap<String, Vec<f32>>,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    model: String,
    dimensions: usize,
    output_width: usize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            failing: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
            model: MODEL.to_string(),
            dimensions: DIMS,
            output_width: DIMS,
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.script.insert(text.to_string(), vector);
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Report and produce vectors of a different width.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self.output_width = dimensions;
        self
    }

    /// Keep reporting the configured width but produce vectors of `width`.
    pub fn with_output_width(mut self, width: usize) -> Self {
        self.output_width = width;
        self
    }

    /// Shared switch: `store(true)` makes the provider fail.
    pub fn fail_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.failing)
    }

    /// Shared counter of `embed_batch` calls.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.script.get(text) {
            let mut v = v.clone();
            v.resize(self.output_width, 0.0);
            return v;
        }
        let mut hash: u64 = 0xcbf29ce484222325;
        for b in text.bytes() {
            hash ^= b as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        let mut v = vec![0.0f32; self.output_width];
        v[(hash % self.output_width as u64) as usize] = 1.0;
        v
    }
}

impl EmbeddingProvider for FakeProvider {
    fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("embedding service unavailable");
        }
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Engine over a private in-memory store.
pub fn memory_engine(provider: FakeProvider) -> Engine {
    let conn = cortex::db::open_in_memory(provider.dimensions).unwrap();
    Engine::with_provider(conn, Box::new(provider)).unwrap()
}

/// Engine over an on-disk store at `path`.
pub fn disk_engine(path: &Path, provider: FakeProvider) -> Engine {
    Engine::open_at(path, Box::new(provider)).unwrap()
}

/// Second raw connection to an on-disk store, for inspecting or damaging it.
pub fn raw_connection(path: &Path) -> Connection {
    cortex::db::load_sqlite_vec();
    let conn = Connection::open(path).unwrap();
    conn.pragma_update(None, "foreign_keys", "ON").unwrap();
    conn
}

pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

/// Options for a memory visible to default recall.
pub fn validated() -> StoreOptions {
    StoreOptions {
        trust: Some(TrustLevel::Validated),
        ..StoreOptions::default()
    }
}

pub fn with_topic(key: &str) -> StoreOptions {
    StoreOptions {
        topic_key: Some(key.to_string()),
        ..StoreOptions::default()
    }
}
