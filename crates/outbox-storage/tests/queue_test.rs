//! Durable queue behavior against a real SQLite file.
//!
//! - ids strictly increase and are never reused, even after clear
//! - list_all is FIFO by id
//! - records survive closing and reopening the store
//! - two engines on one file see each other's writes
//! - an unopenable store is reported as unavailable, not as empty

use std::sync::Arc;

use chrono::{Duration, Utc};
use outbox_core::models::MutationSpec;
use outbox_core::traits::{IMutationQueue, ISyncStateStore};
use outbox_storage::StorageEngine;
use proptest::prelude::*;

fn spec(method: &str, url: &str) -> MutationSpec {
    MutationSpec::new(method, url)
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"name":"A"}"#)
}

fn temp_store() -> (tempfile::TempDir, StorageEngine) {
    let dir = tempfile::tempdir().unwrap();
    let store = StorageEngine::open(&dir.path().join("outbox.db")).unwrap();
    (dir, store)
}

// ═══════════════════════════════════════════════════════════════════════════
// APPEND / LIST / DELETE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn append_assigns_increasing_ids_and_lists_fifo() {
    let (_dir, store) = temp_store();
    let a = store.append(&spec("POST", "https://api.test/a")).unwrap();
    let b = store.append(&spec("PUT", "https://api.test/b")).unwrap();
    let c = store.append(&spec("DELETE", "https://api.test/c")).unwrap();
    assert!(a < b && b < c);

    let all = store.list_all().unwrap();
    let ids: Vec<i64> = all.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![a, b, c]);
    assert_eq!(all[1].method, "PUT");
    assert_eq!(all[0].retry_count, 0);
    assert_eq!(
        all[0].headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
}

#[test]
fn stored_record_preserves_every_field() {
    let (_dir, store) = temp_store();
    let original = spec("PATCH", "https://api.test/items/9?draft=1");
    let id = store.append(&original).unwrap();
    let stored = store.get(id).unwrap().unwrap();
    assert_eq!(stored.url, original.url);
    assert_eq!(stored.method, original.method);
    assert_eq!(stored.headers, original.headers);
    assert_eq!(stored.body, original.body);
    assert_eq!(stored.timestamp, original.timestamp);
}

#[test]
fn delete_absent_id_is_a_no_op() {
    let (_dir, store) = temp_store();
    let id = store.append(&spec("POST", "https://api.test/a")).unwrap();
    store.delete_by_id(id + 100).unwrap();
    assert_eq!(store.count().unwrap(), 1);
    store.delete_by_id(id).unwrap();
    store.delete_by_id(id).unwrap();
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn ids_are_never_reused_after_clear() {
    let (_dir, store) = temp_store();
    store.append(&spec("POST", "https://api.test/a")).unwrap();
    let last = store.append(&spec("POST", "https://api.test/b")).unwrap();
    assert_eq!(store.clear().unwrap(), 2);
    assert!(store.list_all().unwrap().is_empty());

    let next = store.append(&spec("POST", "https://api.test/c")).unwrap();
    assert!(next > last);
}

#[test]
fn clear_on_empty_queue_returns_zero() {
    let (_dir, store) = temp_store();
    assert_eq!(store.clear().unwrap(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// DURABILITY / SHARING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outbox.db");
    let id = {
        let store = StorageEngine::open(&path).unwrap();
        store.append(&spec("POST", "https://api.test/a")).unwrap()
    };
    let store = StorageEngine::open(&path).unwrap();
    let all = store.list_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, id);
    assert_eq!(store.schema_version().unwrap(), 3);
}

#[test]
fn two_contexts_share_one_queue() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outbox.db");
    let page = StorageEngine::open(&path).unwrap();
    let worker = StorageEngine::open(&path).unwrap();

    let id = page.append(&spec("POST", "https://api.test/a")).unwrap();
    assert_eq!(worker.list_all().unwrap()[0].id, id);

    worker.delete_by_id(id).unwrap();
    assert_eq!(page.count().unwrap(), 0);
}

#[test]
fn concurrent_appends_keep_unique_ids() {
    let (_dir, store) = temp_store();
    let store = Arc::new(store);
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        store
                            .append(&spec("POST", &format!("https://api.test/{t}/{i}")))
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids: Vec<i64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 100);
    assert_eq!(store.count().unwrap(), 100);
}

#[test]
fn unopenable_store_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be opened as a database file.
    let err = StorageEngine::open(dir.path()).err().unwrap();
    assert!(err.is_store_unavailable(), "got {err}");
}

// ═══════════════════════════════════════════════════════════════════════════
// RETRY BOOKKEEPING / DEAD LETTERS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn record_failure_increments_and_schedules() {
    let (_dir, store) = temp_store();
    let id = store.append(&spec("POST", "https://api.test/a")).unwrap();
    let at = Utc::now() + Duration::seconds(30);

    assert_eq!(store.record_failure(id, "HTTP 503", Some(at)).unwrap(), 1);
    assert_eq!(store.record_failure(id, "timeout", Some(at)).unwrap(), 2);

    let record = store.get(id).unwrap().unwrap();
    assert_eq!(record.retry_count, 2);
    assert_eq!(record.last_error.as_deref(), Some("timeout"));
    assert_eq!(record.next_attempt_at, Some(at));
    assert!(!record.is_due(Utc::now()));
}

#[test]
fn record_failure_on_missing_record_is_not_found() {
    let (_dir, store) = temp_store();
    assert!(store.record_failure(99, "x", None).is_err());
}

#[test]
fn dead_letter_moves_record_out_of_queue() {
    let (_dir, store) = temp_store();
    let keep = store.append(&spec("POST", "https://api.test/keep")).unwrap();
    let drop = store.append(&spec("POST", "https://api.test/drop")).unwrap();
    store.record_failure(drop, "HTTP 404", None).unwrap();

    store.dead_letter(drop, "rejected 3 times").unwrap();

    let remaining: Vec<i64> = store.list_all().unwrap().iter().map(|m| m.id).collect();
    assert_eq!(remaining, vec![keep]);
    let dead = store.list_dead_letters().unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].mutation.id, drop);
    assert_eq!(dead[0].mutation.retry_count, 1);
    assert_eq!(dead[0].mutation.last_error.as_deref(), Some("HTTP 404"));
    assert_eq!(dead[0].reason, "rejected 3 times");

    assert!(store.dead_letter(drop, "again").is_err());
}

#[test]
fn last_sync_at_round_trips() {
    let (_dir, store) = temp_store();
    assert!(store.last_sync_at().unwrap().is_none());
    let now = Utc::now();
    store.set_last_sync_at(now).unwrap();
    store.set_last_sync_at(now).unwrap();
    assert_eq!(store.last_sync_at().unwrap(), Some(now));
}

// ═══════════════════════════════════════════════════════════════════════════
// PROPERTIES
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Any interleaving of appends and deletes leaves the survivors in
    /// ascending id order.
    #[test]
    fn survivors_stay_fifo(ops in proptest::collection::vec(any::<bool>(), 1..40)) {
        let store = StorageEngine::open_in_memory().unwrap();
        let mut expected: Vec<i64> = Vec::new();
        for (i, append) in ops.into_iter().enumerate() {
            if append || expected.is_empty() {
                let id = store.append(&spec("POST", &format!("https://api.test/{i}"))).unwrap();
                prop_assert!(expected.last().map_or(true, |last| id > *last));
                expected.push(id);
            } else {
                let victim = expected.remove(i % expected.len());
                store.delete_by_id(victim).unwrap();
            }
        }
        let ids: Vec<i64> = store.list_all().unwrap().iter().map(|m| m.id).collect();
        prop_assert_eq!(ids, expected);
    }
}
