//! Background rebuild: pack, then load, off the owner thread.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;

use crossbeam::channel::Sender;
use tokio::runtime::Handle;

use super::pipeline::Ticket;
use crate::atlas::{Atlas, AtlasLoadError};
use crate::packer::{ArtifactPaths, PackError, Packer};

#[derive(Debug, Clone)]
pub(super) struct RebuildJob {
    pub ticket: Ticket,
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    pub name: String,
    /// Load the existing artifact even if the packer reports no change.
    /// Set while the owner has no atlas at all.
    pub load_unchanged: bool,
}

#[derive(Debug)]
pub(super) enum RebuildResult {
    Unchanged,
    Ready(Atlas),
    PackFailed(PackError),
    LoadFailed(AtlasLoadError),
}

#[derive(Debug)]
pub(super) struct RebuildOutcome {
    pub ticket: Ticket,
    pub result: RebuildResult,
}

/// Run `job` on the blocking pool and send its outcome to the owner.
pub(super) fn spawn(
    runtime: &Handle,
    packer: Arc<dyn Packer>,
    job: RebuildJob,
    done: Sender<RebuildOutcome>,
) {
    crate::debug!("cache"; "rebuild {} dispatched", job.ticket);
    runtime.spawn_blocking(move || {
        let result = catch_unwind(AssertUnwindSafe(|| run(packer.as_ref(), &job)))
            .unwrap_or_else(|payload| {
                RebuildResult::PackFailed(PackError::Panicked(panic_message(payload.as_ref())))
            });
        // The owner may already be gone.
        let _ = done.send(RebuildOutcome {
            ticket: job.ticket,
            result,
        });
    });
}

pub(super) fn run(packer: &dyn Packer, job: &RebuildJob) -> RebuildResult {
    let paths = ArtifactPaths::new(&job.out_dir, &job.name);

    match packer.process_if_modified(&job.source_dir, &job.out_dir, &job.name) {
        Ok(true) => {}
        Ok(false) if job.load_unchanged && paths.exists() => {
            crate::debug!("cache"; "loading existing artifact {}", paths.index.display());
        }
        Ok(false) => return RebuildResult::Unchanged,
        Err(e) => return RebuildResult::PackFailed(e),
    }

    match Atlas::load(&paths.index) {
        Ok(atlas) => RebuildResult::Ready(atlas),
        Err(e) => RebuildResult::LoadFailed(e),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("decode {}", 3)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "decode 3");
        let payload = std::panic::catch_unwind(|| std::panic::panic_any(7u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn test_release_profile_unwinds() {
        // Panic capture needs unwinding in shipped builds too.
        let manifest = include_str!("../../Cargo.toml");
        let release = manifest
            .split("[profile.release]")
            .nth(1)
            .and_then(|rest| rest.split("\n[").next())
            .unwrap();
        assert!(!release.contains("panic"), "release profile must not set `panic`");
    }
}
