mod helpers;

use std::sync::atomic::Ordering;

use cortex::config::{CortexConfig, EmbeddingConfig, StorageConfig};
use cortex::memory::embeddings::get_embedding;
use cortex::memory::types::RecallOptions;
use cortex::{Engine, WarningStage};
use helpers::{count, disk_engine, memory_engine, raw_connection, spike, validated, FakeProvider, DIMS};
use tempfile::TempDir;

#[test]
fn provider_outage_keeps_record_and_reindex_repairs() {
    let provider = FakeProvider::new();
    let switch = provider.fail_switch();
    let engine = memory_engine(provider);

    switch.store(true, Ordering::SeqCst);
    let outcome = engine.store("written while offline", &validated()).unwrap();
    let warning = outcome.warning.expect("embedding failure is reported");
    assert_eq!(warning.stage, WarningStage::Embed);
    assert_eq!(warning.memory_id, outcome.memory.id);

    // Durable, but invisible to vector search.
    assert_eq!(engine.get(&outcome.memory.id).unwrap().content, "written while offline");
    let stats = engine.stats().unwrap();
    assert_eq!((stats.memories, stats.embeddings, stats.missing_index), (1, 0, 1));

    switch.store(false, Ordering::SeqCst);
    assert!(engine
        .recall("written while offline", &RecallOptions::default())
        .unwrap()
        .is_empty());

    let report = engine.reindex(false, |_, _| {}).unwrap();
    assert_eq!((report.restored, report.embedded, report.failed), (0, 1, 0));
    assert_eq!(engine.stats().unwrap().missing_index, 0);

    let hits = engine.recall("written while offline", &RecallOptions::default()).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].memory.id, outcome.memory.id);
}

#[test]
fn wrong_width_vector_is_an_index_warning() {
    let engine = memory_engine(FakeProvider::new().with_output_width(DIMS + 1));
    let outcome = engine.store("misshapen", &validated()).unwrap();
    let warning = outcome.warning.expect("index failure is reported");
    assert_eq!(warning.stage, WarningStage::Index);
    assert!(engine.get(&outcome.memory.id).is_ok());
}

#[test]
fn reindex_restores_from_cache_without_provider() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cortex.db");
    let provider = FakeProvider::new();
    let calls = provider.call_counter();
    let engine = disk_engine(&path, provider);

    let id = engine.store("cached vector", &validated()).unwrap().memory.id;
    let raw = raw_connection(&path);
    raw.execute("DELETE FROM vec_memories", []).unwrap();
    assert_eq!(engine.stats().unwrap().missing_index, 1);

    let before = calls.load(Ordering::SeqCst);
    let report = engine.reindex(false, |_, _| {}).unwrap();
    assert_eq!((report.restored, report.embedded, report.failed), (1, 0, 0));
    assert_eq!(calls.load(Ordering::SeqCst), before);

    let hits = engine.recall("cached vector", &RecallOptions::default()).unwrap();
    assert_eq!(hits[0].memory.id, id);
}

#[test]
fn reindex_force_reembeds_everything_and_counts_failures() {
    let provider = FakeProvider::new();
    let switch = provider.fail_switch();
    let engine = memory_engine(provider);
    for i in 0..40 {
        engine.store(&format!("note {i}"), &validated()).unwrap();
    }

    let mut seen = Vec::new();
    let report = engine.reindex(true, |done, total| seen.push((done, total))).unwrap();
    assert_eq!(report.embedded, 40);
    assert_eq!(seen.first(), Some(&(0, 40)));
    assert_eq!(seen.last(), Some(&(40, 40)));
    assert_eq!(seen.len(), 3, "two batches plus the initial tick");

    switch.store(true, Ordering::SeqCst);
    let report = engine.reindex(true, |_, _| {}).unwrap();
    assert_eq!((report.embedded, report.failed), (0, 40));
    assert_eq!(engine.stats().unwrap().missing_index, 0);
}

#[test]
fn model_change_triggers_reembedding() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cortex.db");

    let engine = disk_engine(&path, FakeProvider::new().with_model("old-model"));
    let id = engine.store("portable", &validated()).unwrap().memory.id;
    engine.close().unwrap();

    let engine = disk_engine(&path, FakeProvider::new().with_model("new-model"));
    let stats = engine.stats().unwrap();
    assert_eq!(stats.embedding_model.as_deref(), Some("old-model"));
    assert_eq!(stats.active_model.as_deref(), Some("new-model"));
    assert!(stats.model_mismatch());

    let report = engine.reindex(false, |_, _| {}).unwrap();
    assert_eq!((report.restored, report.embedded), (0, 1));
    assert!(!engine.stats().unwrap().model_mismatch());
    engine.close().unwrap();

    let raw = raw_connection(&path);
    assert_eq!(get_embedding(&raw, &id).unwrap().unwrap().model, "new-model");
    assert_eq!(
        cortex::db::migrations::get_embedding_model(&raw).unwrap().as_deref(),
        Some("new-model")
    );
}

#[test]
fn stored_embedding_reads_back_bit_identical() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cortex.db");
    let mut vector = spike(3);
    vector[5] = -0.123_456_79;
    vector[7] = 1.0e-12;
    let engine = disk_engine(&path, FakeProvider::new().with("precise", vector.clone()));

    let id = engine.store("precise", &validated()).unwrap().memory.id;
    engine.close().unwrap();

    let raw = raw_connection(&path);
    let stored = get_embedding(&raw, &id).unwrap().unwrap();
    let bits = |v: &[f32]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&stored.vector), bits(&vector));
    assert_eq!(count(&raw, "SELECT COUNT(*) FROM vec_memories"), 1);
}

#[test]
fn reopening_with_other_width_is_a_config_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("cortex.db");
    disk_engine(&path, FakeProvider::new()).close().unwrap();

    let err = Engine::open_at(&path, Box::new(FakeProvider::new().with_dimensions(DIMS * 2)))
        .err()
        .expect("width mismatch must fail");
    assert!(matches!(err, cortex::Error::Config(_)));
}

#[test]
fn with_engine_propagates_closure_error_and_releases_store() {
    let tmp = TempDir::new().unwrap();
    let config = CortexConfig {
        storage: StorageConfig {
            db_path: tmp.path().join("cortex.db").to_string_lossy().into_owned(),
        },
        embedding: EmbeddingConfig {
            provider: "ollama".into(),
            dimensions: Some(DIMS),
            ..EmbeddingConfig::default()
        },
        ..CortexConfig::default()
    };

    let err = cortex::with_engine(&config, |engine| engine.get("nope")).unwrap_err();
    assert!(err.is_not_found());

    let stats = cortex::with_engine(&config, |engine| engine.stats()).unwrap();
    assert_eq!(stats.memories, 0);
}

#[test]
fn unknown_provider_fails_construction() {
    let config = CortexConfig {
        embedding: EmbeddingConfig {
            provider: "word2vec".into(),
            ..EmbeddingConfig::default()
        },
        ..CortexConfig::default()
    };
    let err = Engine::open(&config).err().expect("unknown provider must fail");
    assert!(matches!(err, cortex::Error::Config(_)));
}
