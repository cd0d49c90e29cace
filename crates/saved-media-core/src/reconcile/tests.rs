use super::*;
use crate::testing::{item, FakeApi};
use saved_media_store::MemoryStore;
use std::sync::atomic::Ordering;

fn setup(api: FakeApi) -> (Arc<FakeApi>, CollectionStore, Arc<Reconciler>) {
    let api = Arc::new(api);
    let store = CollectionStore::new(Arc::new(MemoryStore::new()));
    let reconciler = Arc::new(Reconciler::new(api.clone(), store.clone()));
    (api, store, reconciler)
}

fn ids(collection: &Collection) -> Vec<u64> {
    collection.iter().filter_map(|i| i.id).collect()
}

#[tokio::test]
async fn test_guest_toggle_adds_without_network() {
    let (api, store, reconciler) = setup(FakeApi::new());
    store
        .save(keys::WATCHLIST, &Collection::from_items(vec![item(1)]))
        .unwrap();
    reconciler.reload();

    let outcome = reconciler.toggle(item(42)).await.unwrap();
    assert!(outcome.added);
    assert!(outcome.applied);
    assert_eq!(api.toggle_calls.load(Ordering::SeqCst), 0);

    assert_eq!(ids(&reconciler.items()), vec![42, 1]);
    assert_eq!(ids(&store.load(keys::WATCHLIST)), vec![42, 1]);
}

#[tokio::test]
async fn test_guest_double_toggle_restores_membership() {
    let (_api, store, reconciler) = setup(FakeApi::new());

    reconciler.toggle(item(5)).await.unwrap();
    let second = reconciler.toggle(item(5)).await.unwrap();
    assert!(!second.added);
    assert!(reconciler.items().is_empty());
    assert!(store.load(keys::WATCHLIST).is_empty());
}

#[tokio::test]
async fn test_guest_can_toggle_items_without_id() {
    let (_api, _store, reconciler) = setup(FakeApi::new());
    let mut local = SavedItem::default();
    local.slug = "phim-le".to_string();

    assert!(reconciler.toggle(local.clone()).await.unwrap().added);
    assert!(reconciler.contains(&ItemKey::Slug("phim-le".to_string())));
}

#[tokio::test]
async fn test_authenticated_toggle_removes_saved_item() {
    let (api, store, reconciler) = setup(FakeApi::with_server_items(vec![item(7)]));
    api.set_access_token(Some("t".to_string()));
    store
        .save(keys::WATCHLIST, &Collection::from_items(vec![item(3), item(7)]))
        .unwrap();
    reconciler.reload();

    let outcome = reconciler.toggle(item(7)).await.unwrap();
    assert!(!outcome.added);
    assert_eq!(api.toggle_calls.load(Ordering::SeqCst), 1);
    assert!(!reconciler.contains(&ItemKey::Id(7)));
    assert_eq!(ids(&store.load(keys::WATCHLIST)), vec![3]);
}

#[tokio::test]
async fn test_backend_decides_membership() {
    // Local copy says absent, server already has it: server wins
    let (api, _store, reconciler) = setup(FakeApi::with_server_items(vec![item(11)]));
    api.set_access_token(Some("t".to_string()));

    let outcome = reconciler.toggle(item(11)).await.unwrap();
    assert!(!outcome.added);
    assert!(reconciler.items().is_empty());
}

#[tokio::test]
async fn test_authenticated_double_toggle_restores_membership() {
    let (api, _store, reconciler) = setup(FakeApi::new());
    api.set_access_token(Some("t".to_string()));

    assert!(reconciler.toggle(item(8)).await.unwrap().added);
    assert!(reconciler.contains(&ItemKey::Id(8)));
    assert!(!reconciler.toggle(item(8)).await.unwrap().added);
    assert!(!reconciler.contains(&ItemKey::Id(8)));
    assert!(!api.server_contains(8));
}

#[tokio::test]
async fn test_failed_toggle_leaves_collection_untouched() {
    let (api, store, reconciler) = setup(FakeApi::new());
    api.set_access_token(Some("t".to_string()));
    store
        .save(keys::WATCHLIST, &Collection::from_items(vec![item(2)]))
        .unwrap();
    reconciler.reload();
    api.set_offline(true);

    let result = reconciler.toggle(item(9)).await;
    assert!(matches!(result, Err(ReconcileError::Backend(BackendError::Network(_)))));
    assert_eq!(ids(&reconciler.items()), vec![2]);
    assert_eq!(ids(&store.load(keys::WATCHLIST)), vec![2]);
}

#[tokio::test]
async fn test_authenticated_toggle_needs_backend_id() {
    let (api, _store, reconciler) = setup(FakeApi::new());
    api.set_access_token(Some("t".to_string()));
    let mut local = SavedItem::default();
    local.slug = "no-id".to_string();

    let result = reconciler.toggle(local).await;
    assert!(matches!(result, Err(ReconcileError::Unreconcilable(slug)) if slug == "no-id"));
    assert_eq!(api.toggle_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_stale_response_is_discarded() {
    let (api, _store, reconciler) = setup(FakeApi::new());
    api.set_access_token(Some("t".to_string()));
    let mut arrivals = api.arrivals();
    let first_gate = api.push_gate();
    let second_gate = api.push_gate();

    let first = tokio::spawn({
        let reconciler = reconciler.clone();
        async move { reconciler.toggle(item(4)).await }
    });
    assert_eq!(arrivals.recv().await, Some(4));

    let second = tokio::spawn({
        let reconciler = reconciler.clone();
        async move { reconciler.toggle(item(4)).await }
    });
    assert_eq!(arrivals.recv().await, Some(4));

    // Second reply lands first
    second_gate.send(()).unwrap();
    let second = second.await.unwrap().unwrap();
    assert!(!second.added);
    assert!(second.applied);

    first_gate.send(()).unwrap();
    let first = first.await.unwrap().unwrap();
    assert!(first.added);
    assert!(!first.applied);
    assert!(first.sequence < second.sequence);

    // Local copy agrees with the server
    assert!(!api.server_contains(4));
    assert!(!reconciler.contains(&ItemKey::Id(4)));
}

#[tokio::test]
async fn test_failed_newer_toggle_lets_older_reply_apply() {
    let (api, _store, reconciler) = setup(FakeApi::new());
    api.set_access_token(Some("t".to_string()));
    let mut arrivals = api.arrivals();
    let gate = api.push_gate();

    let first = tokio::spawn({
        let reconciler = reconciler.clone();
        async move { reconciler.toggle(item(6)).await }
    });
    assert_eq!(arrivals.recv().await, Some(6));

    api.set_offline(true);
    assert!(reconciler.toggle(item(6)).await.is_err());
    api.set_offline(false);

    gate.send(()).unwrap();
    let first = first.await.unwrap().unwrap();
    assert!(first.applied);
    assert!(reconciler.contains(&ItemKey::Id(6)));
}

#[tokio::test]
async fn test_discarded_reply_applies_when_newer_toggle_fails() {
    let (api, store, reconciler) = setup(FakeApi::new());
    api.set_access_token(Some("t".to_string()));
    let mut arrivals = api.arrivals();
    let first_gate = api.push_gate();
    let second_gate = api.push_failing_gate();

    let first = tokio::spawn({
        let reconciler = reconciler.clone();
        async move { reconciler.toggle(item(4)).await }
    });
    assert_eq!(arrivals.recv().await, Some(4));

    let second = tokio::spawn({
        let reconciler = reconciler.clone();
        async move { reconciler.toggle(item(4)).await }
    });
    assert_eq!(arrivals.recv().await, Some(4));

    // Older reply lands while the newer toggle is still in flight
    first_gate.send(()).unwrap();
    let first = first.await.unwrap().unwrap();
    assert!(first.added);
    assert!(!first.applied);
    assert!(!reconciler.contains(&ItemKey::Id(4)));

    // The newer toggle never reached the server
    second_gate.send(()).unwrap();
    assert!(second.await.unwrap().is_err());

    assert!(api.server_contains(4));
    assert!(reconciler.contains(&ItemKey::Id(4)));
    assert_eq!(ids(&store.load(keys::WATCHLIST)), vec![4]);
}

#[tokio::test]
async fn test_hydrate_replaces_local_collection() {
    let (api, store, reconciler) = setup(FakeApi::with_server_items(vec![item(5), item(9)]));
    api.set_access_token(Some("t".to_string()));

    let outcome = reconciler.hydrate().await.unwrap();
    assert_eq!(outcome, HydrateOutcome::Replaced { count: 2 });
    assert_eq!(ids(&reconciler.items()), vec![5, 9]);
    assert_eq!(ids(&store.load(keys::WATCHLIST)), vec![5, 9]);

    let state = reconciler.snapshot();
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_hydrate_is_replace_not_merge() {
    let (api, store, reconciler) = setup(FakeApi::with_server_items(vec![item(5)]));
    api.set_access_token(Some("t".to_string()));
    store
        .save(keys::WATCHLIST, &Collection::from_items(vec![item(1), item(2)]))
        .unwrap();
    reconciler.reload();

    reconciler.hydrate().await.unwrap();
    assert_eq!(ids(&reconciler.items()), vec![5]);
}

#[tokio::test]
async fn test_hydrate_failure_keeps_stale_items() {
    let (api, store, reconciler) = setup(FakeApi::with_server_items(vec![item(5)]));
    api.set_access_token(Some("t".to_string()));
    store
        .save(keys::WATCHLIST, &Collection::from_items(vec![item(1)]))
        .unwrap();
    reconciler.reload();
    api.set_offline(true);

    assert!(reconciler.hydrate().await.is_err());
    let state = reconciler.snapshot();
    assert_eq!(ids(&state.items), vec![1]);
    assert!(state.error.is_some());
    assert!(!state.loading);

    // Next successful hydrate clears the error
    api.set_offline(false);
    reconciler.hydrate().await.unwrap();
    assert!(reconciler.snapshot().error.is_none());
}

#[tokio::test]
async fn test_hydrate_skipped_for_guest() {
    let (api, _store, reconciler) = setup(FakeApi::with_server_items(vec![item(5)]));
    assert_eq!(reconciler.hydrate().await.unwrap(), HydrateOutcome::Guest);
    assert_eq!(api.fetch_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_duplicates_after_mixed_operations() {
    let (api, _store, reconciler) = setup(FakeApi::with_server_items(vec![item(1), item(2)]));
    reconciler.toggle(item(1)).await.unwrap();
    reconciler.toggle(item(3)).await.unwrap();

    api.set_access_token(Some("t".to_string()));
    reconciler.hydrate().await.unwrap();
    reconciler.toggle(item(3)).await.unwrap();
    reconciler.toggle(item(3)).await.unwrap();
    reconciler.toggle(item(1)).await.unwrap();

    let items = reconciler.items();
    let mut seen = std::collections::HashSet::new();
    assert!(items.iter().all(|i| seen.insert(i.key())));
}

#[tokio::test]
async fn test_clear_local() {
    let (_api, store, reconciler) = setup(FakeApi::new());
    reconciler.toggle(item(1)).await.unwrap();
    reconciler.clear_local().unwrap();
    assert!(reconciler.items().is_empty());
    assert_eq!(store.read_raw(keys::WATCHLIST).unwrap(), None);
}

#[tokio::test]
async fn test_legacy_favorites_leave_local_state_alone() {
    let (api, _store, reconciler) = setup(FakeApi::with_server_items(vec![item(2)]));
    api.set_access_token(Some("t".to_string()));
    api.set_legacy_favorites(vec![item(11), item(12)]);

    let legacy = reconciler.legacy_favorites().await.unwrap();
    assert_eq!(legacy.iter().filter_map(|i| i.id).collect::<Vec<_>>(), vec![11, 12]);
    assert!(reconciler.items().is_empty());
}
