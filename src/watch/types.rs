use std::path::PathBuf;

use notify::EventKind;
use notify::event::{ModifyKind, RenameMode};

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// A single file change forwarded to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Split a raw notify event into per-path changes.
///
/// Renames become a removal of the old path and a creation of the new one.
/// Metadata-only changes (mtime/atime/chmod) are dropped, they would
/// otherwise trigger rebuild loops.
pub(super) fn changes_of(event: &notify::Event) -> Vec<WatchEvent> {
    let single = |kind: ChangeKind| -> Vec<WatchEvent> {
        event
            .paths
            .iter()
            .map(|path| WatchEvent {
                path: path.clone(),
                kind,
            })
            .collect()
    };

    match event.kind {
        EventKind::Create(_) => single(ChangeKind::Created),
        EventKind::Remove(_) => single(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => single(ChangeKind::Removed),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => single(ChangeKind::Created),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut changes = Vec::with_capacity(event.paths.len());
            if let Some(from) = event.paths.first() {
                changes.push(WatchEvent {
                    path: from.clone(),
                    kind: ChangeKind::Removed,
                });
            }
            if let Some(to) = event.paths.get(1) {
                changes.push(WatchEvent {
                    path: to.clone(),
                    kind: ChangeKind::Created,
                });
            }
            changes
        }
        EventKind::Modify(_) => single(ChangeKind::Modified),
        _ => Vec::new(),
    }
}
