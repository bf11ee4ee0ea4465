//! Drain semantics against a real SQLite queue and a scripted network.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use outbox_core::config::{OrderingMode, SyncConfig};
use outbox_core::models::{ReplayOutcome, SkipReason};
use outbox_core::traits::{IMutationQueue, ISyncStateStore};
use outbox_storage::StorageEngine;
use outbox_sync::{ConnectivityMonitor, SyncEngine, SyncEvent, SyncGuard, SyncMode};
use outbox_test_fixtures::{
    mutation, temp_store, ReplayScenario, ScriptedStep, ScriptedTransport, UnavailableStore,
};

struct Harness {
    _dir: tempfile::TempDir,
    store: Arc<StorageEngine>,
    net: Arc<ScriptedTransport>,
    monitor: Arc<ConnectivityMonitor>,
    engine: Arc<SyncEngine>,
}

fn harness(config: SyncConfig) -> Harness {
    let (dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let monitor = Arc::new(ConnectivityMonitor::new("test", true));
    let engine = SyncEngine::new(
        "test",
        store.clone(),
        net.clone(),
        Arc::clone(&monitor),
        &config,
    )
    .with_state_store(store.clone());
    Harness {
        _dir: dir,
        store,
        net,
        monitor,
        engine: Arc::new(engine),
    }
}

fn immediate_retries() -> SyncConfig {
    SyncConfig {
        initial_retry_delay_ms: 0,
        ..Default::default()
    }
}

fn queued_ids(store: &StorageEngine) -> Vec<i64> {
    store.list_all().unwrap().iter().map(|m| m.id).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// BASIC DRAIN
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn all_succeeding_drain_empties_the_queue() {
    let h = harness(SyncConfig::default());
    for i in 0..4 {
        h.store.append(&mutation("POST", &format!("https://api.test/items/{i}"))).unwrap();
    }

    let report = h.engine.sync().unwrap();
    assert_eq!(report.attempted, 4);
    assert_eq!(report.succeeded, report.attempted);
    assert_eq!(report.failed, 0);
    assert_eq!(report.remaining, 0);
    assert!(report.is_clean());
    assert!(h.store.list_all().unwrap().is_empty());
}

#[test]
fn replays_in_insertion_order_with_exact_requests() {
    let h = harness(SyncConfig::default());
    h.store.append(&mutation("POST", "https://api.test/items")).unwrap();
    h.store.append(&mutation("PUT", "https://api.test/items/1")).unwrap();
    h.store.append(&mutation("DELETE", "https://api.test/items/1")).unwrap();

    h.engine.sync().unwrap();

    assert_eq!(
        h.net.call_keys(),
        vec![
            "POST https://api.test/items",
            "PUT https://api.test/items/1",
            "DELETE https://api.test/items/1",
        ]
    );
    let first = &h.net.calls()[0];
    assert_eq!(first.body, r#"{"name":"A"}"#);
    assert_eq!(
        first.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
}

#[test]
fn single_failure_leaves_only_that_record() {
    let h = harness(SyncConfig::default());
    let a = h.store.append(&mutation("POST", "https://api.test/a")).unwrap();
    let k = h.store.append(&mutation("POST", "https://api.test/k")).unwrap();
    let c = h.store.append(&mutation("POST", "https://api.test/c")).unwrap();
    h.net.script("POST", "https://api.test/k", ScriptedStep::status(503, "{}"));

    let report = h.engine.sync().unwrap();

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(queued_ids(&h.store), vec![k]);
    assert!(!queued_ids(&h.store).contains(&a) && !queued_ids(&h.store).contains(&c));

    let survivor = h.store.get(k).unwrap().unwrap();
    assert_eq!(survivor.retry_count, 1);
    assert_eq!(survivor.last_error.as_deref(), Some("HTTP 503"));
    assert!(survivor.next_attempt_at.is_some());
}

#[test]
fn network_failure_counts_as_transient() {
    let h = harness(SyncConfig::default());
    let id = h.store.append(&mutation("POST", "https://api.test/a")).unwrap();
    h.net.script("POST", "https://api.test/a", ScriptedStep::unreachable());

    let report = h.engine.sync().unwrap();
    assert_eq!(report.failed, 1);
    assert!(matches!(
        report.outcomes[0].outcome,
        ReplayOutcome::Retrying { status: None, attempt: 1, .. }
    ));
    assert_eq!(queued_ids(&h.store), vec![id]);
}

#[test]
fn empty_queue_drain_reports_nothing() {
    let h = harness(SyncConfig::default());
    let report = h.engine.sync().unwrap();
    assert!(!report.was_skipped());
    assert_eq!(report.attempted, 0);
    assert_eq!(h.net.call_count(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// GUARDS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn offline_drain_is_a_no_op() {
    let h = harness(SyncConfig::default());
    h.store.append(&mutation("POST", "https://api.test/a")).unwrap();
    h.monitor.go_offline();

    let report = h.engine.sync().unwrap();
    assert_eq!(report.skipped, Some(SkipReason::Offline));
    assert_eq!(h.net.call_count(), 0);
    assert_eq!(h.store.count().unwrap(), 1);
}

#[test]
fn concurrent_sync_is_a_no_op() {
    let h = harness(SyncConfig::default());
    h.store.append(&mutation("POST", "https://api.test/a")).unwrap();
    h.store.append(&mutation("POST", "https://api.test/b")).unwrap();
    h.net.set_delay(Some(Duration::from_millis(150)));

    let engine = Arc::clone(&h.engine);
    let first = thread::spawn(move || engine.sync().unwrap());
    assert!(h.net.wait_for_calls(1, Duration::from_secs(5)));

    let before = h.store.count().unwrap();
    let second = h.engine.sync().unwrap();
    assert_eq!(second.skipped, Some(SkipReason::InFlight));
    assert_eq!(second.attempted, 0);
    assert_eq!(h.store.count().unwrap(), before);

    let first = first.join().unwrap();
    assert_eq!(first.succeeded, 2);
    assert!(!h.engine.is_syncing());
}

#[test]
fn shared_guard_spans_engines() {
    let (_dir, store) = temp_store();
    store.append(&mutation("POST", "https://api.test/a")).unwrap();
    let net = Arc::new(ScriptedTransport::new());
    net.set_delay(Some(Duration::from_millis(150)));
    let guard = SyncGuard::new();

    let page = Arc::new(
        SyncEngine::new(
            "client",
            store.clone(),
            net.clone(),
            Arc::new(ConnectivityMonitor::new("client", true)),
            &SyncConfig::default(),
        )
        .with_guard(Arc::clone(&guard)),
    );
    let worker = SyncEngine::new(
        "worker",
        store.clone(),
        net.clone(),
        Arc::new(ConnectivityMonitor::new("worker", true)),
        &SyncConfig::default(),
    )
    .with_guard(Arc::clone(&guard));

    let p = Arc::clone(&page);
    let running = thread::spawn(move || p.sync().unwrap());
    assert!(net.wait_for_calls(1, Duration::from_secs(5)));
    assert_eq!(worker.sync().unwrap().skipped, Some(SkipReason::InFlight));
    running.join().unwrap();
    assert_eq!(net.call_count(), 1);
}

#[test]
fn guard_resets_after_store_failure() {
    let net = Arc::new(ScriptedTransport::new());
    let engine = SyncEngine::new(
        "test",
        Arc::new(UnavailableStore),
        net,
        Arc::new(ConnectivityMonitor::new("test", true)),
        &SyncConfig::default(),
    );

    let err = engine.sync().unwrap_err();
    assert!(err.is_store_unavailable());
    assert!(!engine.is_syncing());
    assert!(engine.sync().is_err(), "second drain must run, not report in-flight");
}

#[test]
fn append_during_drain_waits_for_next_pass() {
    let h = harness(SyncConfig::default());
    h.store.append(&mutation("POST", "https://api.test/a")).unwrap();
    h.net.set_delay(Some(Duration::from_millis(100)));

    let engine = Arc::clone(&h.engine);
    let drain = thread::spawn(move || engine.sync().unwrap());
    assert!(h.net.wait_for_calls(1, Duration::from_secs(5)));
    let late = h.store.append(&mutation("POST", "https://api.test/late")).unwrap();

    let report = drain.join().unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.remaining, 1);
    assert_eq!(queued_ids(&h.store), vec![late]);
}

// ═══════════════════════════════════════════════════════════════════════════
// RETRY POLICY
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn backoff_defers_until_due_and_force_overrides() {
    let h = harness(SyncConfig::default());
    let id = h.store.append(&mutation("POST", "https://api.test/a")).unwrap();
    h.net.script("POST", "https://api.test/a", ScriptedStep::status(500, "{}"));

    assert_eq!(h.engine.sync().unwrap().failed, 1);

    let deferred = h.engine.sync().unwrap();
    assert_eq!(deferred.attempted, 0);
    assert_eq!(deferred.deferred, 1);
    assert_eq!(h.net.call_count(), 1);

    let forced = h.engine.sync_with(SyncMode::Force).unwrap();
    assert_eq!(forced.succeeded, 1);
    assert!(h.store.get(id).unwrap().is_none());
}

#[test]
fn transient_failures_dead_letter_after_max_attempts() {
    let h = harness(SyncConfig {
        max_attempts: 3,
        ..immediate_retries()
    });
    let id = h.store.append(&mutation("POST", "https://api.test/a")).unwrap();
    h.net.set_fallback(ScriptedStep::status(502, "{}"));

    for attempt in 1..3 {
        let report = h.engine.sync().unwrap();
        assert!(matches!(
            report.outcomes[0].outcome,
            ReplayOutcome::Retrying { attempt: a, .. } if a == attempt
        ));
    }
    let last = h.engine.sync().unwrap();
    assert_eq!(last.dropped, 1);
    assert!(h.store.list_all().unwrap().is_empty());

    let dead = h.store.list_dead_letters().unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].mutation.id, id);
    assert_eq!(dead[0].mutation.retry_count, 3);
}

#[test]
fn permanent_rejection_is_kept_then_dead_lettered() {
    let h = harness(immediate_retries());
    let id = h.store.append(&mutation("PUT", "https://api.test/missing")).unwrap();
    h.net.set_fallback(ScriptedStep::status(404, "{}"));

    let first = h.engine.sync().unwrap();
    assert!(matches!(
        first.outcomes[0].outcome,
        ReplayOutcome::Rejected { status: 404, attempt: 1 }
    ));
    assert_eq!(queued_ids(&h.store), vec![id]);

    h.engine.sync().unwrap();
    let third = h.engine.sync().unwrap();
    assert!(matches!(
        third.outcomes[0].outcome,
        ReplayOutcome::DeadLettered { status: Some(404), .. }
    ));
    assert_eq!(h.store.count().unwrap(), 0);
}

#[test]
fn conflict_drops_record_and_reports_server_body() {
    let h = harness(SyncConfig::default());
    let id = h.store.append(&mutation("PATCH", "https://api.test/r/3")).unwrap();
    h.net.script(
        "PATCH",
        "https://api.test/r/3",
        ScriptedStep::status(409, r#"{"version":7}"#),
    );
    let conflicts = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&conflicts);
    let _sub = h.engine.subscribe(move |event| {
        if let SyncEvent::Conflict { id, server_body, .. } = event {
            sink.lock().unwrap().push((*id, server_body.clone()));
        }
    });

    let report = h.engine.sync().unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.dropped, 1);
    assert_eq!(h.store.count().unwrap(), 0);
    assert_eq!(
        *conflicts.lock().unwrap(),
        vec![(id, Some(r#"{"version":7}"#.to_string()))]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// ORDERING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn independent_ordering_lets_later_records_through() {
    let h = harness(SyncConfig::default());
    h.store.append(&mutation("POST", "https://api.test/items/1")).unwrap();
    h.store.append(&mutation("PUT", "https://api.test/items/1?field=name")).unwrap();
    h.net.script("POST", "https://api.test/items/1", ScriptedStep::status(500, "{}"));

    let report = h.engine.sync().unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.blocked, 0);
}

#[test]
fn resource_barrier_holds_dependent_records() {
    let h = harness(SyncConfig {
        ordering: OrderingMode::ResourceBarrier,
        ..Default::default()
    });
    let create = h.store.append(&mutation("POST", "https://api.test/items/1")).unwrap();
    let update = h.store.append(&mutation("PUT", "https://api.test/items/1?field=name")).unwrap();
    let other = h.store.append(&mutation("POST", "https://api.test/orders")).unwrap();
    h.net.script("POST", "https://api.test/items/1", ScriptedStep::unreachable());

    let report = h.engine.sync().unwrap();
    assert_eq!(report.attempted, 2);
    assert_eq!(report.blocked, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(queued_ids(&h.store), vec![create, update]);
    assert!(!queued_ids(&h.store).contains(&other));
    assert_eq!(
        h.net.call_keys(),
        vec!["POST https://api.test/items/1", "POST https://api.test/orders"]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// NOTIFICATIONS / STATE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn drain_notifies_start_then_completion() {
    let h = harness(SyncConfig::default());
    h.store.append(&mutation("POST", "https://api.test/a")).unwrap();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let sub = h.engine.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    h.engine.sync().unwrap();
    sub.unsubscribe();
    h.engine.sync().unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], SyncEvent::Started);
    match &events[1] {
        SyncEvent::Completed(report) => assert_eq!(report.succeeded, 1),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn completion_time_is_persisted() {
    let h = harness(SyncConfig::default());
    assert!(h.store.last_sync_at().unwrap().is_none());
    let report = h.engine.sync().unwrap();
    assert_eq!(h.store.last_sync_at().unwrap(), report.finished_at);
}

#[test]
fn skipped_drains_do_not_touch_last_sync() {
    let h = harness(SyncConfig::default());
    h.monitor.go_offline();
    h.engine.sync().unwrap();
    assert!(h.store.last_sync_at().unwrap().is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// SCENARIOS
// ═══════════════════════════════════════════════════════════════════════════

fn run_scenario(name: &str) {
    let scenario = ReplayScenario::load(name);
    let (_dir, store) = temp_store();
    let net = Arc::new(scenario.transport());
    let monitor = Arc::new(ConnectivityMonitor::new("scenario", false));
    let engine = SyncEngine::new(
        "scenario",
        store.clone(),
        net,
        Arc::clone(&monitor),
        &SyncConfig::default(),
    );

    for m in &scenario.mutations {
        store.append(&m.to_spec()).unwrap();
    }
    assert_eq!(store.count().unwrap(), scenario.mutations.len(), "{}", scenario.name);

    let completed = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&completed);
    let _sub = engine.subscribe(move |event| {
        if let SyncEvent::Completed(report) = event {
            *sink.lock().unwrap() = Some(report.succeeded);
        }
    });

    monitor.go_online();
    let report = engine.sync().unwrap();

    assert_eq!(report.succeeded, scenario.expected.succeeded, "{}", scenario.name);
    assert_eq!(report.failed, scenario.expected.failed, "{}", scenario.name);
    assert_eq!(store.count().unwrap(), scenario.expected.remaining, "{}", scenario.name);
    assert_eq!(
        *completed.lock().unwrap(),
        Some(scenario.expected.sync_complete_count),
        "{}",
        scenario.name
    );
}

#[test]
fn scenario_offline_then_online() {
    run_scenario("offline_then_online");
}

#[test]
fn scenario_permanent_rejection() {
    run_scenario("permanent_rejection");
}

#[test]
fn scenario_stale_write_conflict() {
    run_scenario("stale_write_conflict");
}
