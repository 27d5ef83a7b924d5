mod helpers;

use cortex::memory::types::{Direction, RelationType, StoreOptions};
use helpers::{memory_engine, FakeProvider};

#[test]
fn relation_visible_from_both_ends() {
    let engine = memory_engine(FakeProvider::new());
    let a = engine.store("guard against undefined props", &StoreOptions::default()).unwrap().memory.id;
    let b = engine.store("TypeError: cannot read property", &StoreOptions::default()).unwrap().memory.id;

    let rel = engine.relate(&a, &b, RelationType::Solves, None).unwrap();

    let from_a = engine.get_relations(&a).unwrap();
    let from_b = engine.get_relations(&b).unwrap();
    assert_eq!(from_a.len(), 1);
    assert_eq!(from_b.len(), 1);
    assert_eq!(from_a[0].id, rel.id);
    assert_eq!(from_b[0].id, rel.id);
    assert_eq!(from_a[0].direction_from(&a), Some(Direction::Outgoing));
    assert_eq!(from_b[0].direction_from(&b), Some(Direction::Incoming));
    assert_eq!(from_b[0].other_end(&b), a);
}

#[test]
fn relate_requires_both_endpoints() {
    let engine = memory_engine(FakeProvider::new());
    let a = engine.store("exists", &StoreOptions::default()).unwrap().memory.id;

    let err = engine.relate(&a, "missing", RelationType::Requires, None).unwrap_err();
    assert!(err.is_not_found());
    let err = engine.relate("missing", &a, RelationType::Requires, None).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(engine.stats().unwrap().relations, 0);
}

#[test]
fn delete_removes_touching_edges() {
    let mut engine = memory_engine(FakeProvider::new());
    let a = engine.store("a", &StoreOptions::default()).unwrap().memory.id;
    let b = engine.store("b", &StoreOptions::default()).unwrap().memory.id;
    let c = engine.store("c", &StoreOptions::default()).unwrap().memory.id;
    engine.relate(&a, &b, RelationType::Causes, Some("observed in prod")).unwrap();
    engine.relate(&c, &a, RelationType::Replaces, None).unwrap();
    engine.relate(&b, &c, RelationType::RelatedTo, None).unwrap();

    engine.delete(&a).unwrap();

    assert!(engine.get(&a).unwrap_err().is_not_found());
    assert!(engine.get_relations(&a).unwrap().is_empty());
    let from_b = engine.get_relations(&b).unwrap();
    assert_eq!(from_b.len(), 1);
    assert_eq!(from_b[0].relation_type, RelationType::RelatedTo);
    assert_eq!(engine.stats().unwrap().relations, 1);
}

#[test]
fn outgoing_edges_listed_before_incoming() {
    let engine = memory_engine(FakeProvider::new());
    let hub = engine.store("hub", &StoreOptions::default()).unwrap().memory.id;
    let x = engine.store("x", &StoreOptions::default()).unwrap().memory.id;
    let y = engine.store("y", &StoreOptions::default()).unwrap().memory.id;

    engine.relate(&x, &hub, RelationType::PartOf, None).unwrap();
    engine.relate(&hub, &y, RelationType::Contradicts, None).unwrap();

    let rels = engine.get_relations(&hub).unwrap();
    let directions: Vec<_> = rels.iter().map(|r| r.direction_from(&hub)).collect();
    assert_eq!(directions, vec![Some(Direction::Outgoing), Some(Direction::Incoming)]);
}
