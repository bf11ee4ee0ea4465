//! The page facade: read-after-write, store failures, replay paths.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use outbox_client::{ClientEvent, OfflineClient};
use outbox_core::config::{SyncConfig, WorkerConfig};
use outbox_core::constants::SYNC_TAG;
use outbox_core::models::{OutboundRequest, SkipReason, WorkerMessage};
use outbox_core::traits::{IMutationQueue, ISyncStateStore};
use outbox_storage::StorageEngine;
use outbox_sync::SyncGuard;
use outbox_test_fixtures::{
    mutation, temp_store, ReplayScenario, ScriptedStep, ScriptedTransport, UnavailableStore,
};
use outbox_worker::{WorkerHandle, WorkerRegistration, WorkerRuntime, WorkerServices};

const CREATE: &str = "http://localhost/api/trpc/orders.create";

fn immediate() -> SyncConfig {
    SyncConfig {
        initial_retry_delay_ms: 0,
        periodic_sync_interval_secs: 0,
        ..Default::default()
    }
}

fn client(store: &Arc<StorageEngine>, net: &Arc<ScriptedTransport>, online: bool) -> OfflineClient {
    OfflineClient::builder(store.clone(), net.clone())
        .sync_config(immediate())
        .state_store(store.clone())
        .online(online)
        .build()
}

fn recorder(client: &OfflineClient) -> Arc<Mutex<Vec<ClientEvent>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    client.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
    seen
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

// ═══════════════════════════════════════════════════════════════════════════
// QUEUEING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn queued_count_reflects_each_write_immediately() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let page = client(&store, &net, false);

    for n in 1..=4 {
        page.queue_mutation(mutation("POST", &format!("{CREATE}?n={n}")))
            .unwrap();
        assert_eq!(page.queued_count().unwrap(), n);
    }
    let urls: Vec<_> = page
        .queued_mutations()
        .unwrap()
        .into_iter()
        .map(|m| m.url)
        .collect();
    assert_eq!(
        urls,
        (1..=4).map(|n| format!("{CREATE}?n={n}")).collect::<Vec<_>>()
    );
}

#[test]
fn queueing_notifies_with_updated_depth() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let page = client(&store, &net, false);
    let seen = recorder(&page);

    let id = page.queue_mutation(mutation("POST", CREATE)).unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![ClientEvent::MutationQueued { id, queued_count: 1 }]
    );
}

#[test]
fn unavailable_store_is_a_hard_failure() {
    let net = Arc::new(ScriptedTransport::new());
    let page = OfflineClient::builder(Arc::new(UnavailableStore), net).build();
    let seen = recorder(&page);

    let err = page.queue_mutation(mutation("POST", CREATE)).unwrap_err();
    assert!(err.is_store_unavailable());
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn tabs_sharing_a_store_see_the_same_queue() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let tab_a = client(&store, &net, false);
    let tab_b = client(&store, &net, false);

    tab_a.queue_mutation(mutation("POST", CREATE)).unwrap();
    assert_eq!(tab_b.queued_count().unwrap(), 1);
    tab_b.clear_queue().unwrap();
    assert_eq!(tab_a.queued_count().unwrap(), 0);
}

#[test]
fn clear_queue_reports_removed_records() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let page = client(&store, &net, false);
    page.queue_mutation(mutation("POST", CREATE)).unwrap();
    page.queue_mutation(mutation("POST", CREATE)).unwrap();
    let seen = recorder(&page);

    assert_eq!(page.clear_queue().unwrap(), 2);
    assert_eq!(
        *seen.lock().unwrap(),
        vec![ClientEvent::QueueCleared { removed: 2 }]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// SEND
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn offline_write_is_deferred_and_queued() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let page = client(&store, &net, false);

    let resp = page
        .send(OutboundRequest::post(CREATE).with_body(r#"{"name":"A"}"#))
        .unwrap();
    assert!(resp.is_deferred());
    assert_eq!(net.call_count(), 0);
    assert_eq!(page.queued_mutations().unwrap()[0].body, r#"{"name":"A"}"#);
}

#[test]
fn write_failing_at_the_network_boundary_is_queued() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    net.script("POST", CREATE, ScriptedStep::unreachable());
    let page = client(&store, &net, true);

    let resp = page.send(OutboundRequest::post(CREATE)).unwrap();
    assert!(resp.is_deferred());
    assert_eq!(page.queued_count().unwrap(), 1);
}

#[test]
fn server_errors_are_returned_not_queued() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    net.script("POST", CREATE, ScriptedStep::status(422, r#"{"error":"bad"}"#));
    let page = client(&store, &net, true);

    let resp = page.send(OutboundRequest::post(CREATE)).unwrap();
    assert_eq!(resp.status, 422);
    assert_eq!(page.queued_count().unwrap(), 0);
}

#[test]
fn failed_reads_are_errors() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    net.set_online(false);
    let page = client(&store, &net, true);

    let err = page
        .send(OutboundRequest::get("http://localhost/api/trpc/orders.list"))
        .unwrap_err();
    assert!(err.is_network_failure());
    assert_eq!(page.queued_count().unwrap(), 0);
}

// ═══════════════════════════════════════════════════════════════════════════
// PAGE-CONTEXT SYNC
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn sync_now_drains_and_records_status() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let page = client(&store, &net, true);
    for _ in 0..3 {
        store.append(&mutation("POST", CREATE)).unwrap();
    }
    let seen = recorder(&page);

    let report = page.sync_now().unwrap();
    assert_eq!((report.attempted, report.succeeded, report.failed), (3, 3, 0));
    assert_eq!(page.queued_count().unwrap(), 0);

    let status = page.status();
    assert!(!status.is_syncing);
    assert_eq!(status.success_count, 3);
    assert!(status.last_sync_at.is_some());
    assert!(store.last_sync_at().unwrap().is_some());

    let events = seen.lock().unwrap();
    assert_eq!(events.first(), Some(&ClientEvent::SyncStarted));
    assert!(matches!(
        events.last(),
        Some(ClientEvent::SyncFinished { remaining: 0, .. })
    ));
}

#[test]
fn sync_now_while_offline_is_a_no_op() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let page = client(&store, &net, false);
    page.queue_mutation(mutation("POST", CREATE)).unwrap();

    let report = page.sync_now().unwrap();
    assert_eq!(report.skipped, Some(SkipReason::Offline));
    assert_eq!(page.queued_count().unwrap(), 1);
    assert_eq!(net.call_count(), 0);
}

#[test]
fn permanent_rejection_keeps_only_the_failing_record() {
    let scenario = ReplayScenario::load("permanent_rejection");
    let (_dir, store) = temp_store();
    let net = Arc::new(scenario.transport());
    let page = client(&store, &net, true);
    for m in &scenario.mutations {
        page.queue_mutation(m.to_spec()).unwrap();
    }

    let report = page.sync_now().unwrap();
    assert_eq!(report.succeeded, scenario.expected.succeeded);
    assert_eq!(report.failed, scenario.expected.failed);
    assert_eq!(page.queued_count().unwrap(), scenario.expected.remaining);
    assert_eq!(page.status().failure_count, 1);
}

#[test]
fn reconnect_edge_triggers_a_drain() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let page = client(&store, &net, false);
    page.queue_mutation(mutation("POST", CREATE)).unwrap();
    page.queue_mutation(mutation("PATCH", CREATE)).unwrap();
    let seen = recorder(&page);

    assert!(page.set_online(true));
    assert!(!page.set_online(true), "edge-triggered");
    assert!(wait_until(|| page.queued_count().unwrap() == 0));
    assert!(wait_until(|| !page.status().is_syncing));

    let events = seen.lock().unwrap();
    assert_eq!(events[0], ClientEvent::ConnectivityChanged { is_online: true });
}

#[test]
fn conflicts_are_reported_and_dead_lettered() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    net.script("POST", CREATE, ScriptedStep::status(409, "{}"));
    let page = client(&store, &net, true);
    let id = store.append(&mutation("POST", CREATE)).unwrap();
    let seen = recorder(&page);

    page.sync_now().unwrap();
    assert!(seen.lock().unwrap().contains(&ClientEvent::Conflict {
        id,
        url: CREATE.to_string(),
        status: 409,
    }));
    let dead = page.dead_letters().unwrap();
    assert_eq!(dead.len(), 1);
    assert_eq!(dead[0].mutation.id, id);
}

#[test]
fn snapshot_renders_connectivity_and_depth() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let page = client(&store, &net, false);
    page.queue_mutation(mutation("POST", CREATE)).unwrap();
    page.queue_mutation(mutation("POST", CREATE)).unwrap();

    let snap = page.snapshot().unwrap();
    assert!(!snap.is_online);
    assert_eq!(snap.queued_count, 2);
    assert!(!snap.is_syncing);
    assert_eq!(snap.last_sync_at, None);
}

#[test]
fn last_sync_time_survives_a_reload() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    {
        let page = client(&store, &net, true);
        store.append(&mutation("POST", CREATE)).unwrap();
        page.sync_now().unwrap();
    }
    let reloaded = client(&store, &net, true);
    assert!(reloaded.status().last_sync_at.is_some());
    assert!(reloaded.last_sync_at().is_some());
}

#[test]
fn unsubscribed_listeners_stop_receiving() {
    let (_dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let page = client(&store, &net, false);
    let seen = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&seen);
    let sub = page.subscribe(move |_| *sink.lock().unwrap() += 1);

    page.queue_mutation(mutation("POST", CREATE)).unwrap();
    sub.unsubscribe();
    page.queue_mutation(mutation("POST", CREATE)).unwrap();
    assert_eq!(*seen.lock().unwrap(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// WITH A WORKER
// ═══════════════════════════════════════════════════════════════════════════

struct Site {
    _dir: tempfile::TempDir,
    store: Arc<StorageEngine>,
    net: Arc<ScriptedTransport>,
    guard: Arc<SyncGuard>,
    worker: WorkerHandle,
}

fn site() -> Site {
    let (dir, store) = temp_store();
    let net = Arc::new(ScriptedTransport::new());
    let guard = SyncGuard::new();
    let services = WorkerServices::new(
        store.clone(),
        store.clone(),
        net.clone(),
        &WorkerConfig::default(),
        immediate(),
    )
    .with_guard(Arc::clone(&guard))
    .with_sync_state(store.clone());
    let registration = Arc::new(WorkerRegistration::new(services));
    registration.register(WorkerConfig::default()).unwrap();
    let worker = WorkerRuntime::start(registration).unwrap();
    Site {
        _dir: dir,
        store,
        net,
        guard,
        worker,
    }
}

fn attached(site: &Site) -> OfflineClient {
    OfflineClient::builder(site.store.clone(), site.net.clone())
        .sync_config(immediate())
        .state_store(site.store.clone())
        .guard(Arc::clone(&site.guard))
        .worker(site.worker.clone())
        .build()
}

#[test]
fn worker_drains_offline_writes_and_announces_count() {
    let site = site();
    let page = attached(&site);
    let seen = recorder(&page);

    site.worker.set_online(false).unwrap();
    site.net.set_online(false);
    for _ in 0..3 {
        page.queue_mutation(mutation("POST", CREATE)).unwrap();
    }
    assert_eq!(page.queued_count().unwrap(), 3);

    site.net.set_online(true);
    site.worker.set_online(true).unwrap();

    assert!(wait_until(|| seen.lock().unwrap().iter().any(|e| matches!(
        e,
        ClientEvent::Worker(WorkerMessage::SyncComplete { count: 3, .. })
    ))));
    assert_eq!(page.queued_count().unwrap(), 0);
    assert!(wait_until(|| page.status().success_count == 3));
    site.worker.shutdown();
}

#[test]
fn sync_now_is_delegated_to_the_worker() {
    let site = site();
    let page = attached(&site);
    site.store.append(&mutation("POST", CREATE)).unwrap();
    site.store.append(&mutation("POST", CREATE)).unwrap();

    let report = page.sync_now().unwrap();
    assert_eq!(report.succeeded, 2);
    assert_eq!(page.status().success_count, 2);
    assert!(!page.engine().is_syncing());
    site.worker.shutdown();
}

#[test]
fn sync_now_falls_back_to_the_page_when_the_worker_is_gone() {
    let site = site();
    let page = attached(&site);
    site.worker.shutdown();
    site.store.append(&mutation("POST", CREATE)).unwrap();

    let report = page.sync_now().unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(page.queued_count().unwrap(), 0);
}

#[test]
fn writes_sent_through_the_worker_are_deferred_by_it() {
    let site = site();
    let page = attached(&site);
    let seen = recorder(&page);
    site.net.set_online(false);

    let resp = page.send(OutboundRequest::post(CREATE)).unwrap();
    assert!(resp.is_deferred());
    assert_eq!(page.queued_count().unwrap(), 1);
    assert!(wait_until(|| seen.lock().unwrap().iter().any(|e| matches!(
        e,
        ClientEvent::Worker(WorkerMessage::MutationQueued { .. })
    ))));
    site.worker.shutdown();
}

#[test]
fn worker_drains_show_as_syncing_without_an_explicit_guard() {
    let site = site();
    let page = OfflineClient::builder(site.store.clone(), site.net.clone())
        .sync_config(immediate())
        .worker(site.worker.clone())
        .build();
    assert!(Arc::ptr_eq(page.engine().guard(), &site.guard));

    site.store.append(&mutation("POST", CREATE)).unwrap();
    site.store.append(&mutation("POST", CREATE)).unwrap();
    site.net.set_delay(Some(Duration::from_millis(200)));
    site.worker.fire_sync(SYNC_TAG).unwrap();

    assert!(wait_until(|| page.snapshot().unwrap().is_syncing));
    assert!(page.status().is_syncing);
    assert!(wait_until(|| page.queued_count().unwrap() == 0));
    assert!(wait_until(|| !page.snapshot().unwrap().is_syncing));
    site.worker.shutdown();
}

#[test]
fn dropping_the_client_releases_its_worker_channel() {
    let site = site();
    let page = attached(&site);
    let id = page.worker_client_id().unwrap();
    assert!(site.worker.registration().clients().contains(id));

    drop(page);
    assert!(!site.worker.registration().clients().contains(id));
    site.worker.shutdown();
}
