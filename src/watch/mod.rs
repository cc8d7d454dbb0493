//! File watching for the source image directory.
//!
//! ```text
//! notify thread --changes_of--> image filter --broadcast--> subscriber channels
//!                                                             |
//!                                     owner tick: try_iter -> WatchListener
//! ```
//!
//! The watcher never calls into its subscribers: each one gets a channel and
//! drains it on its own thread. This keeps owner-side state single-threaded.

mod roots;
mod types;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::Instant;

use crossbeam::channel::{self, Receiver, Sender};
use notify::RecommendedWatcher;
use parking_lot::Mutex;

use crate::core::has_image_extension;
use roots::WatchRoots;
pub use types::{ChangeKind, WatchEvent};

/// Callbacks for file changes, invoked on the subscriber's own thread.
pub trait WatchListener {
    fn on_changed(&mut self, path: &Path, now: Instant);
    fn on_created(&mut self, path: &Path, now: Instant);
    fn on_deleted(&mut self, path: &Path, now: Instant);
}

impl WatchEvent {
    /// Route this event to the matching listener callback.
    pub fn dispatch<L: WatchListener + ?Sized>(&self, listener: &mut L, now: Instant) {
        match self.kind {
            ChangeKind::Created => listener.on_created(&self.path, now),
            ChangeKind::Modified => listener.on_changed(&self.path, now),
            ChangeKind::Removed => listener.on_deleted(&self.path, now),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Subscriber {
    id: SubscriptionId,
    tx: Sender<WatchEvent>,
}

type Registry = Arc<Mutex<Vec<Subscriber>>>;

/// Receiving end of a subscription. Dropping it unsubscribes.
pub struct WatchSubscription {
    id: SubscriptionId,
    rx: Receiver<WatchEvent>,
    registry: Weak<Mutex<Vec<Subscriber>>>,
}

impl WatchSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Events received so far, without blocking.
    pub fn try_iter(&self) -> channel::TryIter<'_, WatchEvent> {
        self.rx.try_iter()
    }

    pub fn receiver(&self) -> &Receiver<WatchEvent> {
        &self.rx
    }
}

impl Drop for WatchSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().retain(|s| s.id != self.id);
        }
    }
}

/// Recursive watcher over the source roots.
///
/// Only files with one of the configured image extensions are forwarded.
pub struct AssetWatcher {
    /// Must be kept alive for events to flow
    watcher: RecommendedWatcher,
    roots: WatchRoots,
    registry: Registry,
    next_id: u64,
}

impl AssetWatcher {
    /// Start watching immediately; roots that don't exist yet are attached
    /// by [`maintain`](Self::maintain) once they appear.
    pub fn new(roots: Vec<PathBuf>, extensions: Vec<String>) -> notify::Result<Self> {
        let registry: Registry = Arc::default();
        let forward = Arc::clone(&registry);

        let mut watcher = notify::recommended_watcher(
            move |res: notify::Result<notify::Event>| match res {
                Ok(event) => broadcast(&forward, &event, &extensions),
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            },
        )?;

        let mut roots = WatchRoots::new(roots);
        roots.attach_existing(&mut watcher)?;

        Ok(Self {
            watcher,
            roots,
            registry,
            next_id: 0,
        })
    }

    pub fn subscribe(&mut self) -> WatchSubscription {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        let (tx, rx) = channel::unbounded();
        self.registry.lock().push(Subscriber { id, tx });
        crate::debug!("watch"; "subscribe {}", id);

        WatchSubscription {
            id,
            rx,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Stop delivering to `id`. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.registry.lock();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        let removed = subscribers.len() != before;
        if removed {
            crate::debug!("watch"; "unsubscribe {}", id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Re-attach roots that were removed and recreated.
    pub fn maintain(&mut self) {
        self.roots.maintain(&mut self.watcher);
    }
}

fn broadcast(registry: &Mutex<Vec<Subscriber>>, event: &notify::Event, extensions: &[String]) {
    let changes: Vec<WatchEvent> = types::changes_of(event)
        .into_iter()
        .filter(|change| has_image_extension(&change.path, extensions))
        .collect();
    if changes.is_empty() {
        return;
    }

    crate::debug!("watch"; "raw notify: {:?} {:?}", event.kind, event.paths);

    // Disconnected receivers are pruned here as well as on drop.
    registry
        .lock()
        .retain(|sub| changes.iter().all(|change| sub.tx.send(change.clone()).is_ok()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec!["png".into()]
    }

    #[derive(Default)]
    struct Recorder(Vec<(&'static str, PathBuf)>);

    impl WatchListener for Recorder {
        fn on_changed(&mut self, path: &Path, _now: Instant) {
            self.0.push(("changed", path.to_path_buf()));
        }
        fn on_created(&mut self, path: &Path, _now: Instant) {
            self.0.push(("created", path.to_path_buf()));
        }
        fn on_deleted(&mut self, path: &Path, _now: Instant) {
            self.0.push(("deleted", path.to_path_buf()));
        }
    }

    #[test]
    fn test_dispatch_routes_by_kind() {
        let mut recorder = Recorder::default();
        let now = Instant::now();
        for kind in [ChangeKind::Created, ChangeKind::Modified, ChangeKind::Removed] {
            WatchEvent { path: "a.png".into(), kind }.dispatch(&mut recorder, now);
        }
        let labels: Vec<_> = recorder.0.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["created", "changed", "deleted"]);
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let dir = TempDir::new().unwrap();
        let mut watcher = AssetWatcher::new(vec![dir.path().to_path_buf()], exts()).unwrap();

        let first = watcher.subscribe();
        let second = watcher.subscribe();
        assert_ne!(first.id(), second.id());
        assert_eq!(watcher.subscriber_count(), 2);

        assert!(watcher.unsubscribe(first.id()));
        assert!(!watcher.unsubscribe(first.id()));
        assert_eq!(watcher.subscriber_count(), 1);

        drop(second);
        assert_eq!(watcher.subscriber_count(), 0);
    }

    #[test]
    fn test_forwards_image_changes_only() {
        let dir = TempDir::new().unwrap();
        let mut watcher = AssetWatcher::new(vec![dir.path().to_path_buf()], exts()).unwrap();
        let sub = watcher.subscribe();

        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("hero.png"), "x").unwrap();

        let event = sub.receiver().recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.path.file_name().unwrap(), "hero.png");
        for event in sub.try_iter() {
            assert_eq!(event.path.file_name().unwrap(), "hero.png");
        }
    }

    #[test]
    fn test_missing_root_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("later");
        let mut watcher = AssetWatcher::new(vec![root.clone()], exts()).unwrap();
        let sub = watcher.subscribe();

        fs::create_dir(&root).unwrap();
        watcher.maintain();
        fs::write(root.join("hero.png"), "x").unwrap();

        let event = sub.receiver().recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.path.file_name().unwrap(), "hero.png");
    }
}
