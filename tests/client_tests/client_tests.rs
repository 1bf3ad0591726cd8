//! Client Tests
//!
//! Round trips against the in-process fake server.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::thread;

use common::FakeServer;
use tyrantkv::{Client, ExtOptions, MiscOptions, TyrantError};

fn connect(server: &FakeServer) -> Client {
    Client::open(&server.config()).unwrap()
}

// =============================================================================
// Put / Get
// =============================================================================

#[test]
fn test_put_then_get_returns_same_bytes() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.put(b"bin\x00key", b"\x00\xFFvalue").unwrap();
    assert_eq!(client.get(b"bin\x00key").unwrap(), b"\x00\xFFvalue");

    client.put(b"empty", b"").unwrap();
    assert_eq!(client.get(b"empty").unwrap(), b"");
}

#[test]
fn test_get_missing_is_protocol_error() {
    let server = FakeServer::start();
    let client = connect(&server);

    let err = client.get(b"nope").unwrap_err();
    assert!(err.is_protocol());
    assert_eq!(err.status_code(), Some(1));

    // Connection stays usable after a failure status
    client.put(b"k", b"v").unwrap();
    assert_eq!(client.get(b"k").unwrap(), b"v");
}

#[test]
fn test_putkeep_does_not_overwrite() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.putkeep(b"k", b"first").unwrap();
    let err = client.putkeep(b"k", b"second").unwrap_err();
    assert!(matches!(err, TyrantError::Protocol(_)));
    assert_eq!(client.get(b"k").unwrap(), b"first");
}

#[test]
fn test_putcat_appends() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.putcat(b"k", b"ab").unwrap();
    client.putcat(b"k", b"cd").unwrap();
    assert_eq!(client.get(b"k").unwrap(), b"abcd");
}

#[test]
fn test_putshl_keeps_tail() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.put(b"k", b"abc").unwrap();
    client.putshl(b"k", b"def", 4).unwrap();
    assert_eq!(client.get(b"k").unwrap(), b"cdef");
}

#[test]
fn test_putnr_reads_no_reply() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.putnr(b"a", b"1").unwrap();
    client.putnr(b"b", b"2").unwrap();
    // Next reply on the wire belongs to this get
    assert_eq!(client.get(b"a").unwrap(), b"1");
    assert_eq!(client.rnum().unwrap(), 2);
}

#[test]
fn test_out() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.put(b"k", b"v").unwrap();
    client.out(b"k").unwrap();
    assert!(client.get(b"k").unwrap_err().is_protocol());
    assert!(client.out(b"k").unwrap_err().is_protocol());
}

#[test]
fn test_mget_returns_found_pairs() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.put(b"a", b"1").unwrap();
    client.put(b"c", b"3").unwrap();

    let keys = vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()];
    let mut pairs = client.mget(&keys).unwrap();
    pairs.sort();
    assert_eq!(
        pairs,
        vec![(b"a".to_vec(), b"1".to_vec()), (b"c".to_vec(), b"3".to_vec())]
    );
}

#[test]
fn test_vsiz() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.put(b"k", b"12345").unwrap();
    assert_eq!(client.vsiz(b"k").unwrap(), 5);
    assert!(client.vsiz(b"missing").unwrap_err().is_protocol());
}

// =============================================================================
// Iteration and prefix search
// =============================================================================

#[test]
fn test_iterate_every_key_once() {
    let server = FakeServer::start();
    let client = connect(&server);

    for i in 0..25 {
        client.put(format!("key{:02}", i).as_bytes(), b"v").unwrap();
    }

    client.iterinit().unwrap();
    let mut seen = Vec::new();
    loop {
        match client.iternext() {
            Ok(key) => seen.push(key),
            Err(e) if e.is_protocol() => break,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(seen.len(), 25);
    seen.dedup();
    assert_eq!(seen.len(), 25);
}

#[test]
fn test_fwmkeys_respects_prefix_and_max() {
    let server = FakeServer::start();
    let client = connect(&server);

    for key in ["user:1", "user:2", "user:3", "group:1"] {
        client.put(key.as_bytes(), b"").unwrap();
    }

    let mut keys = client.fwmkeys(b"user:", 10).unwrap();
    keys.sort();
    assert_eq!(keys, vec![b"user:1".to_vec(), b"user:2".to_vec(), b"user:3".to_vec()]);
    assert_eq!(client.fwmkeys(b"user:", 2).unwrap().len(), 2);
    assert!(client.fwmkeys(b"none:", 10).unwrap().is_empty());
}

// =============================================================================
// Counters
// =============================================================================

#[test]
fn test_addint_accumulates() {
    let server = FakeServer::start();
    let client = connect(&server);

    assert_eq!(client.addint(b"n", 3).unwrap(), 3);
    assert_eq!(client.addint(b"n", -5).unwrap(), -2);
}

#[test]
fn test_adddouble_accumulates() {
    let server = FakeServer::start();
    let client = connect(&server);

    let first = client.adddouble(b"d", 0.5).unwrap();
    assert!((first - 0.5).abs() < 1e-9);

    let second = client.adddouble(b"d", 0.25).unwrap();
    assert!((second - 0.75).abs() < 1e-9);
}

#[test]
fn test_adddouble_on_non_double_value_fails() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.put(b"d", b"text").unwrap();
    assert!(client.adddouble(b"d", 1.0).unwrap_err().is_protocol());
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn test_ext_sends_name_key_value_and_options() {
    let server = FakeServer::start();
    let client = connect(&server);

    let reply = client.ext("echo", ExtOptions::LOCK_GLOBAL, b"k", b"v").unwrap();
    assert_eq!(reply, b"echo:k:v:2");
}

#[test]
fn test_misc_unknown_function_fails_cleanly() {
    let server = FakeServer::start();
    let client = connect(&server);

    let err = client.misc("nosuchfn", MiscOptions::NONE, &[]).unwrap_err();
    assert!(err.is_protocol());

    // The failure's record count is consumed, so later replies line up
    client.put(b"k", b"v").unwrap();
    assert_eq!(client.get(b"k").unwrap(), b"v");
    assert_eq!(client.rnum().unwrap(), 1);
}

#[test]
fn test_misc_putlist_then_getlist() {
    let server = FakeServer::start();
    let client = connect(&server);

    let args = vec![b"a".to_vec(), b"1".to_vec(), b"b".to_vec(), b"2".to_vec()];
    assert!(client.misc("putlist", MiscOptions::NONE, &args).unwrap().is_empty());

    let reply = client
        .misc("getlist", MiscOptions::NONE, &[b"a".to_vec(), b"b".to_vec()])
        .unwrap();
    assert_eq!(reply, args);
}

// =============================================================================
// Administration
// =============================================================================

#[test]
fn test_rnum_size_and_vanish() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.put(b"ab", b"cde").unwrap();
    client.put(b"f", b"g").unwrap();
    assert_eq!(client.rnum().unwrap(), 2);
    assert_eq!(client.size().unwrap(), 7);

    client.vanish().unwrap();
    assert_eq!(client.rnum().unwrap(), 0);
    client.sync().unwrap();
}

#[test]
fn test_stat_report() {
    let server = FakeServer::start();
    let client = connect(&server);

    let report = String::from_utf8(client.stat().unwrap()).unwrap();
    assert!(report.contains("version\t"));
    assert!(report.contains("rnum\t0"));
}

#[test]
fn test_copy_restore_setmst_reach_server() {
    let server = FakeServer::start();
    let client = connect(&server);

    client.copy("/backup/db.tch").unwrap();
    client.restore("/var/ulog", 1_700_000_000_000).unwrap();
    client.setmst("master.local", 1978).unwrap();

    let state = server.state();
    assert_eq!(
        state.admin_calls,
        vec![
            (0x72, "/backup/db.tch".to_string(), 0),
            (0x73, "/var/ulog".to_string(), 1_700_000_000_000),
            (0x78, "master.local".to_string(), 1978),
        ]
    );
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_shared_client_serializes_round_trips() {
    let server = FakeServer::start();
    let client = Arc::new(connect(&server));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let client = Arc::clone(&client);
            thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("t{}-{}", t, i);
                    client.put(key.as_bytes(), key.as_bytes()).unwrap();
                    assert_eq!(client.get(key.as_bytes()).unwrap(), key.as_bytes());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(client.rnum().unwrap(), 200);
}

#[test]
fn test_close() {
    let server = FakeServer::start();
    let client = connect(&server);
    client.put(b"k", b"v").unwrap();
    client.close().unwrap();

    let client = connect(&server);
    assert_eq!(client.get(b"k").unwrap(), b"v");
}
