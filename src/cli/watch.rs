//! `texcache watch`: the owner loop.
//!
//! ```text
//! main thread (owner)              tokio blocking pool
//!   loop every tick_ms:
//!     cache.tick(now)  ──job──>    pack + load
//!     render CacheEvents <──outcome──┘
//!   Ctrl+C -> dispose
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;

use crate::cache::{CacheEvent, TextureCache};
use crate::config::TexCacheConfig;
use crate::core::{is_shutdown, set_watching};
use crate::logger;
use crate::packer::{Packer, ShelfPacker};
use crate::watch::AssetWatcher;
use crate::{debug, log};

/// How often vanished watch roots are looked for again.
const ROOT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

pub fn run_watch(config: &TexCacheConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("texcache-worker")
        .build()
        .context("Failed to start worker runtime")?;

    let settings = config.cache_settings();
    let mut watcher = AssetWatcher::new(
        vec![settings.source_dir.clone()],
        settings.extensions.clone(),
    )
    .with_context(|| format!("Failed to watch {}", settings.source_dir.display()))?;

    let (events_tx, events_rx) = crossbeam::channel::unbounded();
    let packer: Arc<dyn Packer> = Arc::new(ShelfPacker::new(config.pack_settings()));
    let mut cache = TextureCache::new(settings, packer, runtime.handle().clone(), events_tx);
    cache.watch(watcher.subscribe());

    set_watching(true);
    log!(
        "watch";
        "watching {} (press Ctrl+C to stop)",
        config.source.dir.display()
    );

    cache.request_rebuild();
    let tick = config.tick_interval();
    let mut last_root_check = Instant::now();

    while !is_shutdown() {
        let now = Instant::now();
        cache.tick(now);
        render_events(&events_rx);

        if now.duration_since(last_root_check) >= ROOT_CHECK_INTERVAL {
            watcher.maintain();
            last_root_check = now;
        }

        let sleep = cache
            .next_deadline(now)
            .map_or(tick, |deadline| deadline.saturating_duration_since(now).min(tick));
        std::thread::sleep(sleep.max(Duration::from_millis(1)));
    }

    set_watching(false);
    let abandoned = cache.dispose();
    render_events(&events_rx);

    // Nothing renders from them any more, so they can go right away.
    debug!("watch"; "releasing {} abandoned atlas(es)", abandoned.len());
    for atlas in abandoned {
        atlas.release();
    }

    drop(cache);
    runtime.shutdown_timeout(Duration::from_secs(2));
    log!("watch"; "stopped");
    Ok(())
}

fn render_events(events: &Receiver<CacheEvent>) {
    for event in events.try_iter() {
        render(&event);
    }
}

fn render(event: &CacheEvent) {
    match event {
        CacheEvent::AtlasReloaded {
            generation,
            regions,
        } => {
            debug!("watch"; "generation {} live with {} regions", generation, regions);
            if *generation == 1 {
                logger::status_success(&format!("atlas loaded ({regions} regions)"));
            }
        }
        CacheEvent::Status(text) => logger::status_success(text),
        CacheEvent::AtlasReleased { generation } => {
            debug!("watch"; "generation {} released", generation);
        }
        CacheEvent::RebuildFailed { reason } => {
            logger::status_error("rebuild failed, keeping previous atlas", reason);
        }
    }
}
