//! KvStore Tests
//!
//! Dict-style access to a flat database over the fake server.

#[path = "../common/mod.rs"]
mod common;

use std::collections::BTreeMap;

use common::FakeServer;
use tyrantkv::{Config, GetListShape, KvStore, RecordMap, TyrantError};

fn open(config: &Config) -> KvStore {
    KvStore::open(config).unwrap()
}

fn keys(names: &[&str]) -> Vec<Vec<u8>> {
    names.iter().map(|n| n.as_bytes().to_vec()).collect()
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_set_get_contains_remove() {
    let server = FakeServer::start();
    let store = open(&server.config());

    store.set(b"k", &b"v".to_vec()).unwrap();
    assert!(store.contains(b"k").unwrap());
    assert_eq!(store.get(b"k").unwrap(), b"v");

    store.remove(b"k").unwrap();
    assert!(!store.contains(b"k").unwrap());
}

#[test]
fn test_missing_key_errors() {
    let server = FakeServer::start();
    let store = open(&server.config());

    match store.get(b"ghost") {
        Err(TyrantError::KeyNotFound(key)) => assert_eq!(key, b"ghost"),
        other => panic!("expected KeyNotFound, got {:?}", other),
    }
    assert!(matches!(store.remove(b"ghost"), Err(TyrantError::KeyNotFound(_))));
    assert!(matches!(store.get_size(b"ghost"), Err(TyrantError::KeyNotFound(_))));
}

#[test]
fn test_setdefault_keeps_existing() {
    let server = FakeServer::start();
    let store = open(&server.config());

    assert_eq!(store.setdefault(b"k", b"first".to_vec()).unwrap(), b"first");
    assert_eq!(store.setdefault(b"k", b"second".to_vec()).unwrap(), b"first");
    assert_eq!(store.get(b"k").unwrap(), b"first");
}

#[test]
fn test_len_clear_is_empty() {
    let server = FakeServer::start();
    let store = open(&server.config());

    assert!(store.is_empty().unwrap());
    store.set(b"a", &b"1".to_vec()).unwrap();
    store.set(b"b", &b"2".to_vec()).unwrap();
    assert_eq!(store.len().unwrap(), 2);

    store.clear().unwrap();
    assert_eq!(store.len().unwrap(), 0);
}

#[test]
fn test_concat_with_and_without_width() {
    let server = FakeServer::start();
    let store = open(&server.config());

    store.concat(b"log", &b"abc".to_vec(), None).unwrap();
    store.concat(b"log", &b"def".to_vec(), None).unwrap();
    assert_eq!(store.get(b"log").unwrap(), b"abcdef");

    store.concat(b"log", &b"gh".to_vec(), Some(3)).unwrap();
    assert_eq!(store.get(b"log").unwrap(), b"fgh");
    assert_eq!(store.get_size(b"log").unwrap(), 3);
}

// =============================================================================
// Bulk Operations
// =============================================================================

#[test]
fn test_update_from_map_and_pairs() {
    let server = FakeServer::start();
    let store = open(&server.config());

    let mut map = BTreeMap::new();
    map.insert(b"a".to_vec(), b"1".to_vec());
    map.insert(b"b".to_vec(), b"2".to_vec());
    store.update(map).unwrap();

    store.update(vec![("c", b"3".to_vec())]).unwrap();
    assert_eq!(store.len().unwrap(), 3);
    assert_eq!(store.get(b"c").unwrap(), b"3");
}

#[test]
fn test_multi_get_interleaved_marks_missing() {
    let server = FakeServer::start();
    let store = open(&server.config_with_shape(GetListShape::Interleaved));

    store.multi_set(vec![("a", b"1".to_vec()), ("c", b"3".to_vec())], false).unwrap();

    let values = store.multi_get(&keys(&["a", "b", "c"]), false).unwrap();
    assert_eq!(values, vec![Some(b"1".to_vec()), None, Some(b"3".to_vec())]);
}

#[test]
fn test_multi_get_auto_detects_interleaved() {
    let server = FakeServer::start();
    let store = open(&server.config());

    store.multi_set(vec![("a", b"1".to_vec()), ("b", b"2".to_vec())], true).unwrap();

    let values = store.multi_get(&keys(&["b", "a"]), false).unwrap();
    assert_eq!(values, vec![Some(b"2".to_vec()), Some(b"1".to_vec())]);
}

#[test]
fn test_multi_get_legacy_server() {
    let server = FakeServer::start_legacy();
    let store = open(&server.config());

    store.multi_set(vec![("a", b"1".to_vec()), ("b", b"2".to_vec())], false).unwrap();
    let values = store.multi_get(&keys(&["a", "b"]), false).unwrap();
    assert_eq!(values, vec![Some(b"1".to_vec()), Some(b"2".to_vec())]);

    // A legacy server drops missing keys, leaving values unattributable
    let err = store.multi_get(&keys(&["a", "zz", "b"]), false).unwrap_err();
    assert!(matches!(err, TyrantError::UnusableResponse(_)));
}

#[test]
fn test_multi_del() {
    let server = FakeServer::start();
    let store = open(&server.config());

    store.update(vec![("a", b"1".to_vec()), ("b", b"2".to_vec()), ("c", b"3".to_vec())]).unwrap();
    store.multi_del(&keys(&["a", "c", "missing"]), false).unwrap();
    assert_eq!(store.keys_vec().unwrap(), keys(&["b"]));
}

// =============================================================================
// Iteration
// =============================================================================

#[test]
fn test_keys_yields_each_key_once() {
    let server = FakeServer::start();
    let store = open(&server.config());

    for i in 0..40 {
        store.set(format!("k{:03}", i).as_bytes(), &Vec::new()).unwrap();
    }

    let mut all: Vec<Vec<u8>> = store.keys().unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(all.len(), 40);
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 40);
}

#[test]
fn test_keys_on_empty_store() {
    let server = FakeServer::start();
    let store = open(&server.config());
    assert!(store.keys_vec().unwrap().is_empty());
}

#[test]
fn test_prefix_keys() {
    let server = FakeServer::start();
    let store = open(&server.config());

    store.update(vec![("ab1", Vec::new()), ("ab2", Vec::new()), ("b", Vec::new())]).unwrap();

    let mut found = store.prefix_keys(b"ab", None).unwrap();
    found.sort();
    assert_eq!(found, keys(&["ab1", "ab2"]));
    assert_eq!(store.prefix_keys(b"ab", Some(1)).unwrap().len(), 1);
}

// =============================================================================
// Extras
// =============================================================================

#[test]
fn test_call_func_sets_lock_flags() {
    let server = FakeServer::start();
    let store = open(&server.config());

    assert_eq!(store.call_func("f", b"k", b"v", false, false).unwrap(), b"f:k:v:0");
    assert_eq!(store.call_func("f", b"k", b"v", true, false).unwrap(), b"f:k:v:1");
    assert_eq!(store.call_func("f", b"k", b"v", true, true).unwrap(), b"f:k:v:3");
}

#[test]
fn test_get_stats() {
    let server = FakeServer::start();
    let store = open(&server.config());

    store.set(b"a", &b"1".to_vec()).unwrap();
    let stats = store.get_stats().unwrap();
    assert_eq!(stats.get("rnum").map(String::as_str), Some("1"));
    assert!(stats.contains_key("version"));
}
