//! Cooperative debounce timer with per-path change deduplication.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use crate::watch::ChangeKind;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// How long `sleep_duration` reports when nothing is pending.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

/// Coalesced changes handed out when the timer fires.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Trigger {
    /// Sorted by path.
    pub changes: Vec<(PathBuf, ChangeKind)>,
}

impl Trigger {
    /// Short summary for log lines: `3 changed (hero.png, ...)`.
    pub fn describe(&self) -> String {
        match self.changes.as_slice() {
            [] => "rebuild requested".to_string(),
            [(path, kind)] => format!("{} {}", kind.label(), path.display()),
            [(first, _), rest @ ..] => {
                format!("{} changed ({}, +{})", rest.len() + 1, first.display(), rest.len())
            }
        }
    }
}

/// Restartable one-shot timer driven by the owner's clock.
///
/// Every accepted notification pushes the deadline to `now + delay`; the
/// owner calls [`poll`](Self::poll) once per tick and gets at most one
/// [`Trigger`] per quiet period.
pub struct DebounceScheduler {
    delay: Duration,
    deadline: Option<Instant>,
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    changes: FxHashMap<PathBuf, ChangeKind>,
    /// Set by `notify`, so a trigger fires even without recorded paths.
    requested: bool,
}

impl DebounceScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            changes: FxHashMap::default(),
            requested: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the timer without a specific path.
    pub fn notify(&mut self, now: Instant) {
        self.requested = true;
        self.deadline = Some(now + self.delay);
    }

    /// Record a file change and restart the timer.
    ///
    /// Dedup rules:
    /// - Removed + Created/Modified → the restore event
    /// - Modified + Removed → Removed
    /// - Created + Removed → Removed (a rename or restore may have replaced
    ///   a file the atlas still holds)
    /// - otherwise the first event wins
    ///
    /// Editor temp/backup files are ignored and return false.
    pub fn record(&mut self, path: &Path, kind: ChangeKind, now: Instant) -> bool {
        if is_temp_file(path) {
            return false;
        }

        match self.changes.get(path).copied() {
            Some(ChangeKind::Removed) if kind != ChangeKind::Removed => {
                self.changes.insert(path.to_path_buf(), kind);
            }
            Some(ChangeKind::Modified | ChangeKind::Created) if kind == ChangeKind::Removed => {
                self.changes.insert(path.to_path_buf(), ChangeKind::Removed);
            }
            Some(_) => {}
            None => {
                self.changes.insert(path.to_path_buf(), kind);
            }
        }

        self.deadline = Some(now + self.delay);
        true
    }

    /// Fire if the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Trigger> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }

        self.deadline = None;
        let requested = std::mem::take(&mut self.requested);
        let changes = std::mem::take(&mut self.changes);
        if changes.is_empty() && !requested {
            return None;
        }

        let mut changes: Vec<_> = changes.into_iter().collect();
        changes.sort_by(|a, b| a.0.cmp(&b.0));
        Some(Trigger { changes })
    }

    /// Time until the next possible trigger.
    pub fn sleep_duration(&self, now: Instant) -> Duration {
        self.deadline
            .map_or(IDLE_SLEEP, |deadline| deadline.saturating_duration_since(now))
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Stop the timer and forget recorded changes.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.requested = false;
        self.changes.clear();
    }
}

impl Default for DebounceScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: Duration = Duration::from_millis(500);

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_fires_once() {
        let t0 = Instant::now();
        let mut debounce = DebounceScheduler::new(D);

        // Five notifications 100ms apart
        for i in 0..5 {
            let now = t0 + ms(100 * i);
            debounce.record(Path::new("gfx/a.png"), ChangeKind::Modified, now);
            assert!(debounce.poll(now).is_none());
        }

        // Last notify at 400ms: nothing before 900ms
        assert!(debounce.poll(t0 + ms(899)).is_none());
        let trigger = debounce.poll(t0 + ms(900)).unwrap();
        assert_eq!(trigger.changes.len(), 1);
        assert!(debounce.poll(t0 + ms(5000)).is_none());
    }

    #[test]
    fn test_notify_restarts_timer() {
        let t0 = Instant::now();
        let mut debounce = DebounceScheduler::new(D);
        debounce.notify(t0);
        debounce.notify(t0 + ms(400));
        assert!(debounce.poll(t0 + ms(500)).is_none());
        assert_eq!(debounce.poll(t0 + ms(900)), Some(Trigger::default()));
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut debounce = DebounceScheduler::new(D);
        debounce.record(Path::new("a.png"), ChangeKind::Created, t0);
        debounce.cancel();
        assert!(!debounce.is_pending());
        assert!(debounce.poll(t0 + ms(10_000)).is_none());
    }

    #[test]
    fn test_dedup_rules() {
        let t0 = Instant::now();
        let mut debounce = DebounceScheduler::new(D);

        debounce.record(Path::new("restored.png"), ChangeKind::Removed, t0);
        debounce.record(Path::new("restored.png"), ChangeKind::Created, t0);
        debounce.record(Path::new("deleted.png"), ChangeKind::Modified, t0);
        debounce.record(Path::new("deleted.png"), ChangeKind::Removed, t0);
        debounce.record(Path::new("edited.png"), ChangeKind::Created, t0);
        debounce.record(Path::new("edited.png"), ChangeKind::Modified, t0);

        let trigger = debounce.poll(t0 + D).unwrap();
        assert_eq!(
            trigger.changes,
            vec![
                (PathBuf::from("deleted.png"), ChangeKind::Removed),
                (PathBuf::from("edited.png"), ChangeKind::Created),
                (PathBuf::from("restored.png"), ChangeKind::Created),
            ]
        );
    }

    #[test]
    fn test_created_then_removed_still_fires() {
        let t0 = Instant::now();
        let mut debounce = DebounceScheduler::new(D);
        debounce.record(Path::new("tmp.png"), ChangeKind::Created, t0);
        debounce.record(Path::new("tmp.png"), ChangeKind::Removed, t0 + ms(10));

        let trigger = debounce.poll(t0 + ms(1000)).unwrap();
        assert_eq!(trigger.changes, vec![(PathBuf::from("tmp.png"), ChangeKind::Removed)]);
        assert!(!debounce.is_pending());
    }

    #[test]
    fn test_removed_restored_removed_is_a_deletion() {
        let t0 = Instant::now();
        let mut debounce = DebounceScheduler::new(D);
        let path = Path::new("gfx/player.png");
        debounce.record(path, ChangeKind::Removed, t0);
        debounce.record(path, ChangeKind::Created, t0 + ms(100));
        debounce.record(path, ChangeKind::Removed, t0 + ms(200));

        assert!(debounce.poll(t0 + ms(699)).is_none());
        let trigger = debounce.poll(t0 + ms(2000)).unwrap();
        assert_eq!(trigger.changes, vec![(path.to_path_buf(), ChangeKind::Removed)]);
    }

    #[test]
    fn test_temp_files_do_not_restart() {
        let t0 = Instant::now();
        let mut debounce = DebounceScheduler::new(D);
        debounce.record(Path::new("gfx/a.png"), ChangeKind::Modified, t0);

        assert!(!debounce.record(Path::new("gfx/.a.png.swp"), ChangeKind::Modified, t0 + ms(400)));
        assert!(!debounce.record(Path::new("gfx/a.png~"), ChangeKind::Modified, t0 + ms(400)));
        assert!(!debounce.record(Path::new("gfx/a.tmp"), ChangeKind::Created, t0 + ms(400)));

        assert!(debounce.poll(t0 + D).is_some());
    }

    #[test]
    fn test_sleep_duration() {
        let t0 = Instant::now();
        let mut debounce = DebounceScheduler::new(D);
        assert_eq!(debounce.sleep_duration(t0), IDLE_SLEEP);

        debounce.notify(t0);
        assert_eq!(debounce.sleep_duration(t0 + ms(200)), ms(300));
        assert_eq!(debounce.sleep_duration(t0 + ms(700)), Duration::ZERO);
    }

    #[test]
    fn test_describe() {
        assert_eq!(Trigger::default().describe(), "rebuild requested");
        let one = Trigger {
            changes: vec![(PathBuf::from("a.png"), ChangeKind::Modified)],
        };
        assert_eq!(one.describe(), "modified a.png");
        let many = Trigger {
            changes: vec![
                (PathBuf::from("a.png"), ChangeKind::Modified),
                (PathBuf::from("b.png"), ChangeKind::Created),
            ],
        };
        assert_eq!(many.describe(), "2 changed (a.png, +1)");
    }
}
