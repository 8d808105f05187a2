//! # Fetch Effect
//!
//! Wraps the [`RecommendationProvider`] with the shared cache. The effect knows
//! nothing about instances: it reports its lifecycle through [`FetchHooks`] and
//! the manager decides which instance state, if any, to touch.
//!
//! - cache hit: `on_done(from_cache = true)`, no provider call
//! - cache miss: `on_pending`, provider call with `page_size = max_api_results`,
//!   cache store, then `on_done(from_cache = false)`
//! - provider failure: `on_failed`, no retry
//! - future dropped while the provider call is pending: `on_cancelled`
//!
//! Concurrent requests for the same fingerprint are not coalesced: the cache is
//! written on completion, so a second request issued while the first is in
//! flight also reaches the provider. The pending counter only records how many
//! such requests overlap.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    cache::RecommendationCache,
    config::RecommendationConfig,
    errors::FetchError,
    fingerprint::fingerprint,
    provider::{RecommendationProvider, RecommendationRequest, RecommendationResponse},
};

/// Observer of one fetch's lifecycle
pub trait FetchHooks<T> {
    /// A network request for `cache_key` is about to start
    fn on_pending(&self, cache_key: &str);
    /// A batch for `cache_key` is available
    fn on_done(&self, cache_key: &str, response: &RecommendationResponse<T>, from_cache: bool);
    /// The request for `cache_key` failed
    fn on_failed(&self, cache_key: &str, error: &FetchError);
    /// The fetch for `cache_key` was dropped before the provider answered
    fn on_cancelled(&self, _cache_key: &str) {}
}

/// Hooks that ignore every event
pub struct NoHooks;

impl<T> FetchHooks<T> for NoHooks {
    fn on_pending(&self, _cache_key: &str) {}
    fn on_done(&self, _cache_key: &str, _response: &RecommendationResponse<T>, _from_cache: bool) {
    }
    fn on_failed(&self, _cache_key: &str, _error: &FetchError) {}
}

/// Cache-aware wrapper around a recommendation provider
pub struct FetchEffect<P> {
    provider: Arc<P>,
    cache: RecommendationCache,
    pending_requests: Arc<Mutex<HashMap<String, u32>>>,
}

impl<P> Clone for FetchEffect<P> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            cache: self.cache.clone(),
            pending_requests: self.pending_requests.clone(),
        }
    }
}

impl<P: RecommendationProvider> FetchEffect<P> {
    pub fn new(provider: P, cache: RecommendationCache) -> Self {
        Self {
            provider: Arc::new(provider),
            cache,
            pending_requests: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cache(&self) -> &RecommendationCache {
        &self.cache
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Fetch the batch for `config`, from cache when possible.
    pub async fn run<H>(
        &self,
        config: &RecommendationConfig,
        hooks: &H,
    ) -> Result<RecommendationResponse<P::Item>, FetchError>
    where
        H: FetchHooks<P::Item> + ?Sized,
    {
        let cache_key = fingerprint(config);
        let ttl = config.cache_ttl();

        if let Some(cached) = self
            .cache
            .get::<RecommendationResponse<P::Item>>(&cache_key, ttl)
        {
            hooks.on_done(&cache_key, &cached, true);
            return Ok(cached);
        }

        hooks.on_pending(&cache_key);
        let in_flight = InFlight::start(self, hooks, &cache_key);

        let request = RecommendationRequest::from_config(config);
        crate::log_fetch_start!(
            "Requesting {} items from model '{}' for key: {}",
            request.page_size,
            request.name,
            cache_key
        );
        let result = self
            .provider
            .fetch_recommendations(&config.shop_tenant, config.environment(), &request)
            .await;

        in_flight.finish();

        match result {
            Ok(response) => {
                crate::log_fetch_success!(
                    "Received {} items for key: {}",
                    response.products.len(),
                    cache_key
                );
                self.cache.set(cache_key.clone(), response.clone(), ttl);
                hooks.on_done(&cache_key, &response, false);
                Ok(response)
            }
            Err(error) => {
                let error = FetchError::Provider {
                    cache_key: cache_key.clone(),
                    message: error.to_string(),
                };
                crate::log_fetch_error!("{}", error);
                hooks.on_failed(&cache_key, &error);
                Err(error)
            }
        }
    }

    /// Number of in-flight provider calls for a fingerprint
    pub fn pending_request_count(&self, cache_key: &str) -> u32 {
        if let Ok(pending) = self.pending_requests.lock() {
            *pending.get(cache_key).unwrap_or(&0)
        } else {
            0
        }
    }

    fn mark_request_pending(&self, cache_key: &str) {
        if let Ok(mut pending) = self.pending_requests.lock() {
            let count = pending.entry(cache_key.to_string()).or_insert(0);
            *count += 1;
            if *count > 1 {
                crate::debug_log!(
                    "🔄 [REQUEST-OVERLAP] {} requests in flight for key: {}",
                    count,
                    cache_key
                );
            }
        }
    }

    fn mark_request_complete(&self, cache_key: &str) {
        if let Ok(mut pending) = self.pending_requests.lock() {
            if let Some(count) = pending.get_mut(cache_key) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    pending.remove(cache_key);
                }
            }
        }
    }
}

/// Counts a provider call as pending until dropped. Dropping it without
/// [`InFlight::finish`] reports the fetch as cancelled.
struct InFlight<'a, P: RecommendationProvider, H: FetchHooks<P::Item> + ?Sized> {
    effect: &'a FetchEffect<P>,
    hooks: &'a H,
    cache_key: &'a str,
    finished: bool,
}

impl<'a, P: RecommendationProvider, H: FetchHooks<P::Item> + ?Sized> InFlight<'a, P, H> {
    fn start(effect: &'a FetchEffect<P>, hooks: &'a H, cache_key: &'a str) -> Self {
        effect.mark_request_pending(cache_key);
        Self {
            effect,
            hooks,
            cache_key,
            finished: false,
        }
    }

    fn finish(mut self) {
        self.finished = true;
    }
}

impl<P: RecommendationProvider, H: FetchHooks<P::Item> + ?Sized> Drop for InFlight<'_, P, H> {
    fn drop(&mut self) {
        self.effect.mark_request_complete(self.cache_key);
        if !self.finished {
            crate::debug_log!(
                "🚫 [FETCH] Request for key {} dropped before the provider answered",
                self.cache_key
            );
            self.hooks.on_cancelled(self.cache_key);
        }
    }
}
