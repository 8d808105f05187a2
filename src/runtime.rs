//! Background cache maintenance.
//!
//! Expired entries are already dropped when they are read or when a new batch is
//! stored. The janitor additionally sweeps them on a fixed interval so a page
//! left open does not keep dead batches around.

use std::time::Duration;

use crate::cache::RecommendationCache;

/// Minimum sweep interval to prevent busy spinning.
const MIN_CLEANUP_INTERVAL: Duration = Duration::from_millis(10);

/// Owns the background sweep task; the task stops when this is dropped
#[derive(Debug)]
pub struct JanitorHandle {
    #[cfg(not(target_family = "wasm"))]
    task: tokio::task::JoinHandle<()>,
    interval: Duration,
}

impl JanitorHandle {
    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(not(target_family = "wasm"))]
impl Drop for JanitorHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start sweeping expired entries from `cache` every `interval`.
///
/// Returns `None` when no tokio runtime is running on this thread.
#[cfg(not(target_family = "wasm"))]
pub fn spawn_cache_janitor(
    cache: RecommendationCache,
    interval: Duration,
) -> Option<JanitorHandle> {
    let interval = std::cmp::max(interval, MIN_CLEANUP_INTERVAL);
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        crate::warn_log!("⚠️ [CACHE-JANITOR] No tokio runtime; background cleanup disabled");
        return None;
    };

    let task = runtime.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.cleanup_expired();
            if removed > 0 {
                crate::debug_log!("🧹 [CACHE-JANITOR] Swept {} expired entries", removed);
            }
        }
    });

    crate::debug_log!(
        "📊 [CACHE-JANITOR] Background cleanup every {:?}",
        interval
    );
    Some(JanitorHandle { task, interval })
}

/// Background sweeps are not available on wasm targets; expired entries are
/// still dropped on access and on store.
#[cfg(target_family = "wasm")]
pub fn spawn_cache_janitor(
    _cache: RecommendationCache,
    _interval: Duration,
) -> Option<JanitorHandle> {
    None
}
