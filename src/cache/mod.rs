//! Owner-side texture cache.
//!
//! [`TextureCache`] lives on one thread and is driven by [`tick`]. Rebuilds
//! run on the tokio blocking pool and come back as messages:
//!
//! ```text
//! watch event ─> DebounceScheduler ─(quiet)─> RebuildPipeline ─> worker (pack + load)
//!                                                                    │
//!          tick: drain outcomes <────────── crossbeam channel <──────┘
//!            └─> AtlasCache::swap ─> RegionIndex::rebind_all ─> DeferredDisposer
//! ```
//!
//! [`tick`]: TextureCache::tick

mod debounce;
mod dispose;
mod events;
mod index;
mod pipeline;
mod store;
mod worker;


use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};
use tokio::runtime::Handle;

use crate::atlas::Atlas;
use crate::core::{AssetPath, has_image_extension};
use crate::packer::Packer;
use crate::watch::{ChangeKind, WatchListener, WatchSubscription};

pub use debounce::{DEFAULT_DEBOUNCE, DebounceScheduler, Trigger};
pub use dispose::{DEFAULT_GRACE, DeferredDisposer};
pub use events::CacheEvent;
pub use index::{Binding, RegionHandle, RegionIndex};
pub use pipeline::{Phase, RebuildPipeline, Ticket, TriggerResult};
pub use store::AtlasCache;

use worker::{RebuildJob, RebuildOutcome, RebuildResult};

/// Where the cache reads from and writes to, and its timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    /// Artifact base name (`<name>.atlas`, `<name>.png`).
    pub name: String,
    /// Stripped from asset paths to form region names.
    pub region_prefix: String,
    /// Changes to other files are ignored.
    pub extensions: Vec<String>,
    pub debounce: Duration,
    pub dispose_grace: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("assets/gfx"),
            out_dir: PathBuf::from(".textureCache"),
            name: "cache".into(),
            region_prefix: "gfx/".into(),
            extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
            debounce: DEFAULT_DEBOUNCE,
            dispose_grace: DEFAULT_GRACE,
        }
    }
}

/// Hot-reloading texture atlas cache.
///
/// Not `Send`: handles are shared `Rc` cells and all mutation happens on
/// the owning thread. Background work only ever reaches it through the
/// outcome channel.
pub struct TextureCache {
    settings: CacheSettings,
    packer: Arc<dyn Packer>,
    runtime: Handle,
    events: Sender<CacheEvent>,

    store: AtlasCache,
    index: RegionIndex,
    disposer: DeferredDisposer<Atlas>,
    debounce: DebounceScheduler,
    pipeline: RebuildPipeline,

    outcome_tx: Sender<RebuildOutcome>,
    /// Dropped at teardown; late workers then fail to send and free their atlas.
    outcome_rx: Option<Receiver<RebuildOutcome>>,
    subscription: Option<WatchSubscription>,
    /// Successful swaps so far; the first one is the startup load.
    reloads: u64,
}

impl TextureCache {
    pub fn new(
        settings: CacheSettings,
        packer: Arc<dyn Packer>,
        runtime: Handle,
        events: Sender<CacheEvent>,
    ) -> Self {
        let (outcome_tx, outcome_rx) = channel::unbounded();
        Self {
            index: RegionIndex::new(settings.region_prefix.clone()),
            debounce: DebounceScheduler::new(settings.debounce),
            settings,
            packer,
            runtime,
            events,
            store: AtlasCache::new(),
            disposer: DeferredDisposer::new(),
            pipeline: RebuildPipeline::new(),
            outcome_tx,
            outcome_rx: Some(outcome_rx),
            subscription: None,
            reloads: 0,
        }
    }

    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// Handle for `path`. Never absent: before the first atlas it is bound
    /// to `Loading`, for unknown assets to `Missing`.
    pub fn get_region(&mut self, path: &AssetPath) -> RegionHandle {
        self.index.get(path, self.store.current())
    }

    pub fn current(&self) -> Option<&Atlas> {
        self.store.current()
    }

    pub fn generation(&self) -> u64 {
        self.store.generation()
    }

    pub fn phase(&self) -> Phase {
        self.pipeline.phase()
    }

    /// Start a rebuild now, skipping the debounce delay.
    ///
    /// Used for the startup load. While a rebuild is running this queues
    /// exactly one more.
    pub fn request_rebuild(&mut self) {
        self.trigger_rebuild("rebuild requested");
    }

    /// Feed events from `subscription` into the debouncer on every tick.
    pub fn watch(&mut self, subscription: WatchSubscription) {
        crate::debug!("cache"; "watching via subscription {}", subscription.id());
        self.subscription = Some(subscription);
    }

    /// One owner step: watch events, debounce, worker outcomes, disposals.
    pub fn tick(&mut self, now: Instant) {
        if self.pipeline.is_stopped() {
            return;
        }

        let pending: Vec<_> = self
            .subscription
            .as_ref()
            .map(|sub| sub.try_iter().collect())
            .unwrap_or_default();
        for event in &pending {
            event.dispatch(self, now);
        }

        if let Some(trigger) = self.debounce.poll(now) {
            self.trigger_rebuild(&trigger.describe());
        }

        while let Some(outcome) = self.outcome_rx.as_ref().and_then(|rx| rx.try_recv().ok()) {
            self.apply(outcome, now);
        }

        for atlas in self.disposer.poll(now) {
            self.release(atlas);
        }
    }

    /// Earliest instant at which `tick` has timed work to do.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        let debounce = self
            .debounce
            .is_pending()
            .then(|| now + self.debounce.sleep_duration(now));
        match (debounce, self.disposer.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Tear down: stop the pipeline and timers, drop the watch subscription
    /// and release the current atlas.
    ///
    /// Superseded atlases still waiting for their grace period are returned
    /// unreleased. The outcome receiver is dropped, so a worker still running
    /// discards its result.
    pub fn dispose(&mut self) -> Vec<Atlas> {
        if self.pipeline.is_stopped() {
            return Vec::new();
        }

        self.pipeline.stop();
        self.debounce.cancel();
        self.subscription = None;

        // Never installed, dropping frees them.
        let discarded = self
            .outcome_rx
            .take()
            .map_or(0, |rx| rx.try_iter().count());
        if discarded > 0 {
            crate::debug!("cache"; "discarded {} late outcome(s)", discarded);
        }

        if let Some(atlas) = self.store.take() {
            self.release(atlas);
        }

        let abandoned = self.disposer.cancel_all();
        crate::debug!("cache"; "disposed ({} pending disposal(s) abandoned)", abandoned.len());
        abandoned
    }

    fn trigger_rebuild(&mut self, reason: &str) {
        match self.pipeline.trigger() {
            TriggerResult::Dispatch(ticket) => {
                crate::log!("cache"; "{}, rebuilding", reason);
                self.dispatch(ticket);
            }
            TriggerResult::Queued => {
                crate::debug!("cache"; "{} during rebuild, queued", reason);
            }
            TriggerResult::Ignored => {}
        }
    }

    fn dispatch(&self, ticket: Ticket) {
        let job = RebuildJob {
            ticket,
            source_dir: self.settings.source_dir.clone(),
            out_dir: self.settings.out_dir.clone(),
            name: self.settings.name.clone(),
            load_unchanged: !self.store.is_loaded(),
        };
        worker::spawn(
            &self.runtime,
            Arc::clone(&self.packer),
            job,
            self.outcome_tx.clone(),
        );
    }

    fn apply(&mut self, outcome: RebuildOutcome, now: Instant) {
        let ready = matches!(outcome.result, RebuildResult::Ready(_));
        if !self.pipeline.complete(outcome.ticket, ready) {
            crate::debug!("cache"; "discarding stale outcome {}", outcome.ticket);
            return;
        }

        match outcome.result {
            RebuildResult::Ready(atlas) => {
                self.install(atlas, now);
                self.pipeline.applied();
            }
            RebuildResult::Unchanged => {
                crate::debug!("cache"; "rebuild {}: atlas unchanged", outcome.ticket);
            }
            RebuildResult::PackFailed(e) => self.fail(format!("pack failed: {e}")),
            RebuildResult::LoadFailed(e) => self.fail(format!("atlas load failed: {e}")),
        }

        if let Some(ticket) = self.pipeline.settle() {
            crate::debug!("cache"; "running queued rebuild {}", ticket);
            self.dispatch(ticket);
        }
    }

    /// Swap, rebind, and schedule the old atlas for release, all in one call.
    fn install(&mut self, atlas: Atlas, now: Instant) {
        let previous = self.store.swap(atlas);
        let Some(current) = self.store.current() else {
            return;
        };
        self.index.rebind_all(current);

        let generation = current.generation();
        let regions = current.len();
        self.disposer
            .schedule(previous, self.settings.dispose_grace, now);
        self.reloads += 1;

        crate::debug!("cache"; "atlas generation {} installed ({} regions)", generation, regions);
        self.emit(CacheEvent::AtlasReloaded {
            generation,
            regions,
        });
        if self.reloads > 1 {
            self.emit(CacheEvent::Status("textures reloaded".into()));
        }
    }

    fn fail(&self, reason: String) {
        crate::log!("error"; "{}", reason);
        self.emit(CacheEvent::RebuildFailed { reason });
    }

    fn release(&self, atlas: Atlas) {
        let generation = atlas.generation();
        atlas.release();
        self.emit(CacheEvent::AtlasReleased { generation });
    }

    fn emit(&self, event: CacheEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn on_file_event(&mut self, path: &Path, kind: ChangeKind, now: Instant) {
        if self.pipeline.is_stopped() || !has_image_extension(path, &self.settings.extensions) {
            return;
        }
        if self.debounce.record(path, kind, now) {
            crate::debug!("watch"; "{}: {}", kind.label(), path.display());
        }
    }
}

impl WatchListener for TextureCache {
    fn on_changed(&mut self, path: &Path, now: Instant) {
        self.on_file_event(path, ChangeKind::Modified, now);
    }

    fn on_created(&mut self, path: &Path, now: Instant) {
        self.on_file_event(path, ChangeKind::Created, now);
    }

    fn on_deleted(&mut self, path: &Path, now: Instant) {
        self.on_file_event(path, ChangeKind::Removed, now);
    }
}

impl Drop for TextureCache {
    fn drop(&mut self) {
        // Abandoned atlases are just freed; no release events after teardown.
        drop(self.dispose());
    }
}
