use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use notify::event::{
    AccessKind, AccessMode, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind,
};
use notify::{Event, EventKind};
use tempfile::TempDir;

use super::watcher::{OnFire, PathFilter, Worker, is_relevant};
use super::*;
use crate::actor::Notifier;
use crate::actor::messages::WsMsg;
use crate::document::DocumentStore;
use crate::utils::path::normalize_path;

fn make_event(paths: Vec<&str>, kind: EventKind) -> Event {
    Event {
        kind,
        paths: paths.into_iter().map(PathBuf::from).collect(),
        attrs: Default::default(),
    }
}

fn modify_kind() -> EventKind {
    EventKind::Modify(ModifyKind::Data(DataChange::Any))
}

fn counting_worker(min_interval: Duration) -> (Worker, Arc<AtomicUsize>) {
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let worker = Worker {
        name: "test",
        state: Arc::new(DebounceState::new(min_interval)),
        on_fire: Arc::new(move || -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        filter: None,
    };
    (worker, fired)
}

/// Poll `check` until it holds or a few seconds pass.
fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}

// ============================================================================
// Event filtering
// ============================================================================

#[test]
fn test_content_events_relevant() {
    for kind in [
        EventKind::Create(CreateKind::File),
        EventKind::Remove(RemoveKind::File),
        modify_kind(),
        EventKind::Modify(ModifyKind::Any),
        EventKind::Access(AccessKind::Close(AccessMode::Write)),
    ] {
        assert!(is_relevant(&make_event(vec!["/p/a.md"], kind), None), "{kind:?}");
    }
}

#[test]
fn test_metadata_and_access_ignored() {
    let metadata = EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime));
    assert!(!is_relevant(&make_event(vec!["/p/a.md"], metadata), None));
    for access in [
        AccessKind::Any,
        AccessKind::Open(AccessMode::Write),
        AccessKind::Close(AccessMode::Read),
    ] {
        let event = make_event(vec!["/p/a.md"], EventKind::Access(access));
        assert!(!is_relevant(&event, None), "{access:?}");
    }
}

#[test]
fn test_temp_files_ignored_by_default() {
    let event = make_event(vec!["/p/.a.md.swp", "/p/a.md~"], modify_kind());
    assert!(!is_relevant(&event, None));
}

#[test]
fn test_filter_replaces_default() {
    let filter: PathFilter = Arc::new(|p: &Path| p.ends_with(".notes"));
    assert!(is_relevant(&make_event(vec!["/p/.notes"], modify_kind()), Some(&filter)));
    assert!(!is_relevant(&make_event(vec!["/p/other"], modify_kind()), Some(&filter)));
}

#[test]
fn test_any_matching_path_is_enough() {
    // rename-over-save reports both paths
    let filter: PathFilter = Arc::new(|p: &Path| p.ends_with("notes.md"));
    let event = make_event(vec!["/p/notes.md.tmp", "/p/notes.md"], modify_kind());
    assert!(is_relevant(&event, Some(&filter)));
}

// ============================================================================
// Debounce through the worker
// ============================================================================

#[test]
fn test_burst_fires_once() {
    let (worker, fired) = counting_worker(Duration::from_secs(60));
    let event = make_event(vec!["/p/a.md"], modify_kind());

    worker.handle(&event);
    worker.handle(&event);
    worker.handle(&event);

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_spaced_events_fire_twice() {
    let (worker, fired) = counting_worker(Duration::from_millis(20));
    let event = make_event(vec!["/p/a.md"], modify_kind());

    worker.handle(&event);
    std::thread::sleep(Duration::from_millis(60));
    worker.handle(&event);

    assert_eq!(fired.load(Ordering::SeqCst), 2);
}

#[test]
fn test_irrelevant_event_does_not_consume_window() {
    let (worker, fired) = counting_worker(Duration::from_secs(60));

    worker.handle(&make_event(vec!["/p/.a.swp"], modify_kind()));
    worker.handle(&make_event(vec!["/p/a.md"], modify_kind()));

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_callback_still_stamps() {
    let worker = Worker {
        name: "test",
        state: Arc::new(DebounceState::new(Duration::from_secs(60))),
        on_fire: Arc::new(|| -> anyhow::Result<()> { anyhow::bail!("broken") }),
        filter: None,
    };
    worker.handle(&make_event(vec!["/p/a.md"], modify_kind()));
    assert!(worker.state.last_fire().is_some());
}

// ============================================================================
// Real subscriptions
// ============================================================================

#[test]
fn test_missing_path_is_setup_error() {
    let dir = TempDir::new().unwrap();
    let options = WatchOptions::new("test", dir.path().join("nope"), Duration::ZERO);
    let on_fire: OnFire = Arc::new(|| -> anyhow::Result<()> { Ok(()) });
    let result = DebouncedWatcher::new(options, on_fire);
    assert!(matches!(result, Err(WatchError::Setup(..))));
}

#[test]
fn test_fire_now_ignores_window() {
    let dir = TempDir::new().unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    let options = WatchOptions::new("test", dir.path(), Duration::from_secs(60));
    let watcher = DebouncedWatcher::new(
        options,
        Arc::new(move || -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    )
    .unwrap();

    watcher.fire_now().unwrap();
    watcher.fire_now().unwrap();

    assert_eq!(fired.load(Ordering::SeqCst), 2);
    assert!(watcher.state().last_fire().is_some());
}

#[test]
fn test_fire_now_returns_callback_error() {
    let dir = TempDir::new().unwrap();
    let options = WatchOptions::new("test", dir.path(), Duration::ZERO);
    let on_fire: OnFire = Arc::new(|| -> anyhow::Result<()> { anyhow::bail!("no") });
    let watcher = DebouncedWatcher::new(options, on_fire).unwrap();
    assert!(watcher.fire_now().is_err());
}

#[test]
fn test_target_seed_loads_file() {
    let dir = TempDir::new().unwrap();
    let path = normalize_path(dir.path()).join("notes.md");
    fs::write(&path, "first").unwrap();

    let store = Arc::new(DocumentStore::new());
    let target = TargetWatch::new(
        &path,
        Arc::clone(&store),
        Notifier::disabled(),
        Duration::from_millis(10),
    )
    .unwrap();
    target.seed().unwrap();

    assert_eq!(store.get_one(0).unwrap().text, "first");
}

#[test]
fn test_target_seed_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let path = normalize_path(dir.path()).join("absent.md");

    let store = Arc::new(DocumentStore::new());
    let target =
        TargetWatch::new(&path, Arc::clone(&store), Notifier::disabled(), Duration::ZERO).unwrap();

    assert!(target.seed().is_err());
    assert!(store.get_all().is_empty());
}

#[test]
fn test_target_reloads_on_write() {
    let dir = TempDir::new().unwrap();
    let path = normalize_path(dir.path()).join("notes.md");
    fs::write(&path, "before").unwrap();

    let store = Arc::new(DocumentStore::new());
    let (notifier, mut rx) = Notifier::channel();
    let target = TargetWatch::new(
        &path,
        Arc::clone(&store),
        notifier,
        Duration::from_millis(10),
    )
    .unwrap();
    target.seed().unwrap();
    assert!(matches!(rx.try_recv(), Ok(WsMsg::Reload { .. })));

    std::thread::sleep(Duration::from_millis(50));
    fs::write(&path, "after").unwrap();

    assert!(eventually(|| store.get_one(0).is_ok_and(|b| b.text == "after")));
    assert!(eventually(|| matches!(rx.try_recv(), Ok(WsMsg::Reload { .. }))));
}

#[test]
fn test_target_ignores_sibling_files() {
    let dir = TempDir::new().unwrap();
    let root = normalize_path(dir.path());
    let path = root.join("notes.md");
    fs::write(&path, "kept").unwrap();

    let store = Arc::new(DocumentStore::new());
    let target = TargetWatch::new(
        &path,
        Arc::clone(&store),
        Notifier::disabled(),
        Duration::from_millis(10),
    )
    .unwrap();
    target.seed().unwrap();
    store.upsert(3, crate::document::TextBlock::new("local", 0.0, 0.0, 1.0)).unwrap();

    fs::write(root.join("other.md"), "noise").unwrap();
    std::thread::sleep(Duration::from_millis(300));

    assert_eq!(store.get_all().len(), 2);
}

#[test]
fn test_target_follows_rename_over_file() {
    let dir = TempDir::new().unwrap();
    let root = normalize_path(dir.path());
    let path = root.join("notes.md");
    fs::write(&path, "old").unwrap();

    let store = Arc::new(DocumentStore::new());
    let target = TargetWatch::new(
        &path,
        Arc::clone(&store),
        Notifier::disabled(),
        Duration::from_millis(10),
    )
    .unwrap();
    target.seed().unwrap();

    std::thread::sleep(Duration::from_millis(50));
    let staged = root.join("notes.md.new");
    fs::write(&staged, "saved by editor").unwrap();
    fs::rename(&staged, &path).unwrap();

    assert!(eventually(|| store
        .get_one(0)
        .is_ok_and(|b| b.text == "saved by editor")));
}

#[test]
fn test_target_rewrite_with_same_content_drops_local_edits() {
    let dir = TempDir::new().unwrap();
    let path = normalize_path(dir.path()).join("notes.md");
    fs::write(&path, "A").unwrap();

    let store = Arc::new(DocumentStore::new());
    let target = TargetWatch::new(
        &path,
        Arc::clone(&store),
        Notifier::disabled(),
        Duration::from_millis(10),
    )
    .unwrap();
    target.seed().unwrap();
    store.upsert(0, crate::document::TextBlock::new("browser edit", 0.0, 0.0, 1.0)).unwrap();
    store.upsert(4, crate::document::TextBlock::new("extra", 0.0, 0.0, 1.0)).unwrap();

    std::thread::sleep(Duration::from_millis(50));
    fs::write(&path, "A").unwrap();

    assert!(eventually(|| store.get_all().len() == 1
        && store.get_one(0).is_ok_and(|b| b.text == "A")));
}

#[test]
fn test_target_skips_echo_of_own_save() {
    let dir = TempDir::new().unwrap();
    let path = normalize_path(dir.path()).join("notes.md");
    fs::write(&path, "on disk").unwrap();

    let store = Arc::new(DocumentStore::new());
    let target = TargetWatch::new(
        &path,
        Arc::clone(&store),
        Notifier::disabled(),
        Duration::from_millis(200),
    )
    .unwrap();
    target.seed().unwrap();
    store.upsert(0, crate::document::TextBlock::new("from browser", 0.0, 0.0, 1.0)).unwrap();
    store.upsert(2, crate::document::TextBlock::new("kept", 0.0, 0.0, 1.0)).unwrap();

    std::thread::sleep(Duration::from_millis(250));
    store.save_to_file(&path).unwrap();
    std::thread::sleep(Duration::from_millis(300));

    assert_eq!(store.get_all().len(), 2);
}
