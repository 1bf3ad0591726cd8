//! TableStore Tests
//!
//! Record access on a table database over the fake server.

#[path = "../common/mod.rs"]
mod common;

use common::FakeServer;
use tyrantkv::{GetListShape, IndexType, Record, RecordMap, TableStore, TyrantError};

fn user(name: &str, age: u32) -> Record {
    Record::from_pairs([("name", name.to_string()), ("age", age.to_string())])
}

// =============================================================================
// Single Records
// =============================================================================

#[test]
fn test_set_then_get_record() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    table.set(b"u1", &user("ann", 31)).unwrap();

    let record = table.get(b"u1").unwrap();
    assert_eq!(record.get_str("name"), Some("ann"));
    assert_eq!(record.get_str("age"), Some("31"));
    assert_eq!(record.len(), 2);
}

#[test]
fn test_get_missing_record() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    assert!(matches!(table.get(b"nobody"), Err(TyrantError::KeyNotFound(_))));
    assert!(!table.contains(b"nobody").unwrap());
}

#[test]
fn test_empty_record_round_trips() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    table.set(b"blank", &Record::new()).unwrap();
    assert!(table.get(b"blank").unwrap().is_empty());
}

#[test]
fn test_set_replaces_whole_record() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    table.set(b"u1", &user("ann", 31)).unwrap();
    table.set(b"u1", &Record::from_pairs([("city", "oslo")])).unwrap();

    let record = table.get(b"u1").unwrap();
    assert_eq!(record.get_str("name"), None);
    assert_eq!(record.get_str("city"), Some("oslo"));
}

#[test]
fn test_setdefault_returns_stored_record() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    assert_eq!(table.setdefault(b"u1", user("ann", 31)).unwrap(), user("ann", 31));
    assert_eq!(table.setdefault(b"u1", user("bob", 40)).unwrap(), user("ann", 31));
}

#[test]
fn test_connection_stays_usable_after_failed_record_calls() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    table.set(b"u1", &user("ann", 31)).unwrap();
    assert_eq!(table.setdefault(b"u1", user("bob", 40)).unwrap(), user("ann", 31));
    assert!(matches!(table.get(b"nobody"), Err(TyrantError::KeyNotFound(_))));

    table.set(b"u2", &user("cat", 47)).unwrap();
    assert_eq!(table.get(b"u2").unwrap(), user("cat", 47));
    assert_eq!(table.len().unwrap(), 2);
}

#[test]
fn test_concat_adds_columns() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    table.set(b"u1", &Record::from_pairs([("name", "ann")])).unwrap();
    table.concat(b"u1", &Record::from_pairs([("city", "oslo")]), None).unwrap();

    let record = table.get(b"u1").unwrap();
    assert_eq!(record.get_str("name"), Some("ann"));
    assert_eq!(record.get_str("city"), Some("oslo"));
}

#[test]
fn test_concat_with_width_is_unsupported() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    let err = table.concat(b"u1", &user("ann", 31), Some(4)).unwrap_err();
    assert!(matches!(err, TyrantError::Unsupported(_)));
    assert_eq!(table.len().unwrap(), 0);
}

#[test]
fn test_remove_record() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    table.set(b"u1", &user("ann", 31)).unwrap();
    table.remove(b"u1").unwrap();
    assert!(table.is_empty().unwrap());
}

// =============================================================================
// Bulk Records
// =============================================================================

#[test]
fn test_multi_set_and_multi_get() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config_with_shape(GetListShape::Interleaved)).unwrap();

    table
        .multi_set(vec![("u1", user("ann", 31)), ("u2", user("bob", 40))], false)
        .unwrap();

    let keys = vec![b"u2".to_vec(), b"missing".to_vec(), b"u1".to_vec()];
    let records = table.multi_get(&keys, false).unwrap();
    assert_eq!(records, vec![Some(user("bob", 40)), None, Some(user("ann", 31))]);
}

#[test]
fn test_multi_get_legacy_layout() {
    let server = FakeServer::start_legacy();
    let table = TableStore::open(&server.config()).unwrap();

    table.update(vec![("u1", user("ann", 31))]).unwrap();
    let records = table.multi_get(&[b"u1".to_vec()], false).unwrap();
    assert_eq!(records, vec![Some(user("ann", 31))]);
}

#[test]
fn test_column_values_with_zero_byte_cannot_be_joined() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    let bad = Record::from_pairs([("bin", b"a\x00b".as_slice())]);
    let err = table.multi_set(vec![("u1", bad)], false).unwrap_err();
    assert!(matches!(err, TyrantError::Unsupported(_)));
}

#[test]
fn test_keys_over_table() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    table.update(vec![("u1", user("ann", 31)), ("u2", user("bob", 40))]).unwrap();
    let mut keys = table.keys_vec().unwrap();
    keys.sort();
    assert_eq!(keys, vec![b"u1".to_vec(), b"u2".to_vec()]);
}

// =============================================================================
// Table Administration
// =============================================================================

#[test]
fn test_set_index_sends_type_code() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    table.set_index("name", IndexType::Lexical, false).unwrap();
    table.set_index("age", IndexType::Decimal, true).unwrap();
    table.set_index("age", IndexType::Void, false).unwrap();

    assert_eq!(
        server.state().indexes,
        vec![
            ("name".to_string(), 0),
            ("age".to_string(), 1 | (1 << 24)),
            ("age".to_string(), 9999),
        ]
    );
}

#[test]
fn test_gen_uid_increases() {
    let server = FakeServer::start();
    let table = TableStore::open(&server.config()).unwrap();

    let first = table.gen_uid().unwrap();
    let second = table.gen_uid().unwrap();
    assert!(second > first);
}
