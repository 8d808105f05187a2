mod common;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use common::{CatalogProvider, config};
use storefront_recommendations::prelude::*;
use tokio::sync::Notify;

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

async fn loaded_manager(batch: usize, page_size: usize) -> RecommendationManager<CatalogProvider> {
    init_logging();
    let manager = RecommendationManager::new(CatalogProvider::new(batch));
    manager
        .init_and_fetch(config("a", page_size), "pdp")
        .await
        .expect("initial fetch");
    manager
}

#[tokio::test]
async fn go_to_page_round_trip_and_out_of_range_is_ignored() {
    let manager = loaded_manager(25, 10).await;

    manager.go_to_page("pdp", 2).unwrap();
    let info = manager.get_page_info("pdp").unwrap();
    assert_eq!(info.current_page, 2);
    assert_eq!(info.page_start_index, 10);
    assert_eq!(info.page_end_index, 20);
    assert_eq!(
        manager.get_current_page_products("pdp").unwrap().first().map(String::as_str),
        Some("a-10")
    );

    let before = manager.state("pdp").unwrap();
    manager.go_to_page("pdp", 4).unwrap();
    manager.go_to_page("pdp", 0).unwrap();
    assert_eq!(manager.state("pdp").unwrap(), before);
}

#[tokio::test]
async fn next_and_previous_wrap_around() {
    let manager = loaded_manager(25, 10).await;
    assert_eq!(manager.get_page_info("pdp").unwrap().total_pages, 3);

    manager.previous_page("pdp").unwrap();
    let info = manager.get_page_info("pdp").unwrap();
    assert_eq!(info.current_page, 3);
    assert_eq!(info.products_on_current_page, 5);
    assert!(info.is_last_page);
    assert!(!info.has_next_page);

    manager.next_page("pdp").unwrap();
    assert_eq!(manager.get_page_info("pdp").unwrap().current_page, 1);

    manager.jump_to_last_page("pdp").unwrap();
    assert_eq!(manager.get_page_info("pdp").unwrap().current_page, 3);
    manager.jump_to_first_page("pdp").unwrap();
    assert_eq!(manager.get_page_info("pdp").unwrap().current_page, 1);
}

#[tokio::test]
async fn short_last_page() {
    let manager = loaded_manager(7, 3).await;

    manager.jump_to_last_page("pdp").unwrap();
    let info = manager.get_page_info("pdp").unwrap();
    assert_eq!(info.total_pages, 3);
    assert_eq!(info.page_start_index, 6);
    assert_eq!(info.page_end_index, 7);
    assert_eq!(
        manager.get_current_page_products("pdp").unwrap(),
        vec!["a-6".to_string()]
    );
}

#[tokio::test]
async fn resizing_keeps_first_visible_item_on_screen() {
    let manager = loaded_manager(25, 10).await;
    manager.go_to_page("pdp", 2).unwrap();

    manager.set_page_size("pdp", 5).unwrap();
    let info = manager.get_page_info("pdp").unwrap();
    assert_eq!(info.current_page, 3);
    assert_eq!(info.page_size, 5);
    assert_eq!(info.total_pages, 5);
    assert_eq!(
        manager.get_current_page_products("pdp").unwrap().first().map(String::as_str),
        Some("a-10")
    );
}

#[tokio::test]
async fn invalid_page_sizes_leave_state_untouched() {
    let manager = loaded_manager(25, 10).await;
    manager.go_to_page("pdp", 2).unwrap();
    let before = manager.state("pdp").unwrap();

    assert_eq!(
        manager.set_page_size("pdp", 0),
        Err(RecommendationError::PageSize(InvalidPageSize(0)))
    );
    assert_eq!(
        manager.set_page_size("pdp", -3),
        Err(RecommendationError::PageSize(InvalidPageSize(-3)))
    );
    assert_eq!(manager.state("pdp").unwrap(), before);
}

#[tokio::test]
async fn operations_before_init_fail() {
    init_logging();
    let manager = RecommendationManager::new(CatalogProvider::new(5));
    let not_found = InstanceError::NotFound("ghost".to_string());

    assert_eq!(manager.next_page("ghost"), Err(not_found.clone()));
    assert_eq!(manager.get_page_info("ghost").err(), Some(not_found.clone()));
    assert_eq!(
        manager.fetch_recommendations("ghost").await.err(),
        Some(RecommendationError::Instance(not_found.clone()))
    );
    assert_eq!(
        manager.set_page_size("ghost", 0),
        Err(RecommendationError::Instance(not_found))
    );
    assert_eq!(manager.cache().size(), 0);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let manager = RecommendationManager::new(CatalogProvider::new(5));

    let missing_tenant = RecommendationConfig::new("  ", "similar-items", "all");
    assert_eq!(
        manager.init(missing_tenant, "pdp"),
        Err(ConfigError::MissingField("shopTenant"))
    );
    assert_eq!(
        manager.init(config("a", 0), "pdp"),
        Err(ConfigError::InvalidPageSize)
    );
    assert!(manager.instances().is_empty());
}

#[tokio::test]
async fn instances_are_isolated() {
    init_logging();
    let manager = RecommendationManager::new(CatalogProvider::new(12));
    manager.init(config("a", 4), "hero").unwrap();
    manager.init(config("b", 5), "footer").unwrap();
    manager.fetch_recommendations("hero").await.unwrap();
    manager.fetch_recommendations("footer").await.unwrap();

    manager.next_page("hero").unwrap();
    manager.next_page("hero").unwrap();

    assert_eq!(manager.get_page_info("hero").unwrap().current_page, 3);
    assert_eq!(manager.get_page_info("footer").unwrap().current_page, 1);
    assert_eq!(
        manager.get_current_page_products("footer").unwrap()[0],
        "b-0"
    );
    assert_eq!(manager.get_current_page_products("hero").unwrap()[0], "a-8");
    assert_eq!(manager.instances(), vec!["footer".to_string(), "hero".to_string()]);
}

#[tokio::test]
async fn default_instance_id() {
    let manager = RecommendationManager::new(CatalogProvider::new(3));
    let id = manager.init_default(config("a", 2)).unwrap();
    assert_eq!(id, DEFAULT_INSTANCE_ID);
    manager.fetch_recommendations(DEFAULT_INSTANCE_ID).await.unwrap();
    assert_eq!(manager.get_page_info(DEFAULT_INSTANCE_ID).unwrap().total_pages, 2);
}

#[tokio::test]
async fn cache_hit_skips_provider() {
    init_logging();
    let provider = CatalogProvider::new(8);
    let manager = RecommendationManager::new(provider.clone());
    manager.init(config("a", 4), "hero").unwrap();
    manager.init(config("a", 2), "sidebar").unwrap();

    manager.fetch_recommendations("hero").await.unwrap();
    let products = manager.fetch_recommendations("sidebar").await.unwrap();

    assert_eq!(provider.calls(), 1, "second instance should be served from cache");
    assert_eq!(products.len(), 8);
    let sidebar = manager.state("sidebar").unwrap();
    assert_eq!(sidebar.status, FetchStatus::Succeeded);
    assert_eq!(sidebar.total_pages, 4);
    assert!(sidebar.last_fetched.is_some());

    let stats = manager.cache_stats();
    assert_eq!(stats.entry_count, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn different_products_get_distinct_cache_entries() {
    let provider = CatalogProvider::new(4);
    let manager = RecommendationManager::new(provider.clone());
    manager.init(config("a", 2), "one").unwrap();
    manager.init(config("b", 2), "two").unwrap();

    manager.fetch_recommendations("one").await.unwrap();
    manager.fetch_recommendations("two").await.unwrap();

    assert_eq!(provider.calls(), 2);
    assert_eq!(manager.cache().size(), 2);
    assert_eq!(manager.get_current_page_products("two").unwrap()[0], "b-0");
}

#[tokio::test]
async fn provider_error_is_mirrored_into_state() {
    init_logging();
    let provider = CatalogProvider::new(6);
    let manager = RecommendationManager::new(provider.clone());
    manager.init(config("a", 3), "pdp").unwrap();
    manager.fetch_recommendations("pdp").await.unwrap();

    provider.fail_with("upstream returned 503");
    let result = manager.refresh_recommendations("pdp").await;
    match result {
        Err(RecommendationError::Fetch(error)) => {
            assert_eq!(error.message(), "upstream returned 503")
        }
        other => panic!("expected fetch error, got {other:?}"),
    }

    let state = manager.state("pdp").unwrap();
    assert!(!state.loading);
    assert_eq!(state.error.as_deref(), Some("upstream returned 503"));
    assert_eq!(
        state.status,
        FetchStatus::Failed("upstream returned 503".to_string())
    );
    assert_eq!(state.products.len(), 6, "previous batch stays visible");
    assert!(!manager.cache().contains(state.cache_key.as_deref().unwrap()));

    provider.recover();
    manager.fetch_recommendations("pdp").await.unwrap();
    let state = manager.state("pdp").unwrap();
    assert_eq!(state.error, None);
    assert_eq!(state.status, FetchStatus::Succeeded);
}

#[tokio::test]
async fn refresh_bypasses_cache() {
    let provider = CatalogProvider::new(5);
    let manager = RecommendationManager::new(provider.clone());
    manager.init(config("a", 5), "pdp").unwrap();

    manager.fetch_recommendations("pdp").await.unwrap();
    manager.fetch_recommendations("pdp").await.unwrap();
    assert_eq!(provider.calls(), 1);

    manager.refresh_recommendations("pdp").await.unwrap();
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn expired_batches_are_fetched_again() {
    let provider = CatalogProvider::new(5);
    let manager = RecommendationManager::new(provider.clone());
    manager
        .init(config("a", 5).with_cache_ttl(Duration::from_millis(30)), "pdp")
        .unwrap();

    manager.fetch_recommendations("pdp").await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(manager.clean_cache(), 1);

    manager.fetch_recommendations("pdp").await.unwrap();
    assert_eq!(provider.calls(), 2);

    manager.clear_cache();
    assert_eq!(manager.cache().size(), 0);
}

#[tokio::test]
async fn stale_response_is_discarded_after_reinit() {
    init_logging();
    let gate = Arc::new(Notify::new());
    let provider = CatalogProvider::new(4).gated("a", gate.clone());
    let manager = RecommendationManager::new(provider.clone());
    manager.init(config("a", 2), "pdp").unwrap();

    let slow = manager.fetch_recommendations("pdp");
    let reinit = async {
        manager.init(config("b", 2), "pdp").unwrap();
        let fresh = manager.fetch_recommendations("pdp").await;
        gate.notify_one();
        fresh
    };
    let (slow, fresh) = tokio::join!(slow, reinit);

    assert_eq!(slow.unwrap()[0], "a-0", "the caller still gets its own batch");
    assert_eq!(fresh.unwrap()[0], "b-0");

    let state = manager.state("pdp").unwrap();
    assert_eq!(state.products[0], "b-0");
    assert!(!state.loading);
    assert_eq!(state.status, FetchStatus::Succeeded);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn loading_is_visible_while_the_provider_is_pending() {
    let gate = Arc::new(Notify::new());
    let provider = CatalogProvider::new(4).gated("a", gate.clone());
    let manager = RecommendationManager::new(provider);
    manager.init(config("a", 2), "pdp").unwrap();

    let fetch = manager.fetch_recommendations("pdp");
    let observe = async {
        let pending = manager.state("pdp").unwrap();
        gate.notify_one();
        pending
    };
    let (fetched, pending) = tokio::join!(fetch, observe);

    assert!(pending.loading);
    assert_eq!(pending.status, FetchStatus::Fetching);
    assert!(pending.products.is_empty());

    assert_eq!(fetched.unwrap().len(), 4);
    let settled = manager.state("pdp").unwrap();
    assert!(!settled.loading);
    assert_eq!(settled.status, FetchStatus::Succeeded);
}

#[tokio::test]
async fn abandoned_fetch_clears_loading() {
    let gate = Arc::new(Notify::new());
    let provider = CatalogProvider::new(4).gated("a", gate);
    let manager = RecommendationManager::new(provider);
    manager.init(config("a", 2), "pdp").unwrap();

    let outcome = tokio::time::timeout(
        Duration::from_millis(20),
        manager.fetch_recommendations("pdp"),
    )
    .await;
    assert!(outcome.is_err());

    let state = manager.state("pdp").unwrap();
    assert!(!state.loading);
    assert_eq!(state.status, FetchStatus::Idle);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn fetch_from_before_destroy_does_not_revive_old_store() {
    let gate = Arc::new(Notify::new());
    let provider = CatalogProvider::new(4).gated("a", gate.clone());
    let manager = RecommendationManager::new(provider);
    manager.init(config("a", 2), "pdp").unwrap();
    let old_store = manager.store("pdp").unwrap();

    let slow = manager.fetch_recommendations("pdp");
    let recreate = async {
        assert!(manager.destroy("pdp"));
        manager.init(config("a", 2), "pdp").unwrap();
        gate.notify_one();
    };
    let (slow, ()) = tokio::join!(slow, recreate);

    assert_eq!(slow.unwrap().len(), 4, "the caller still gets its batch");
    let old = old_store.get();
    assert!(old.products.is_empty());
    assert!(!old.loading);

    let fresh = manager.state("pdp").unwrap();
    assert!(fresh.products.is_empty());
    assert_eq!(fresh.status, FetchStatus::Idle);
}

#[tokio::test]
async fn huge_cache_ttl_from_settings_is_served_from_cache() {
    let provider = CatalogProvider::new(3);
    let manager = RecommendationManager::new(provider.clone());
    let settings = r#"{
        "shopTenant": "acme",
        "name": "similar-items",
        "collection": "all",
        "productID": "a",
        "cacheTtl": "500000000000y"
    }"#;
    let config: RecommendationConfig = serde_json::from_str(settings).unwrap();
    manager.init(config, "pdp").unwrap();

    manager.fetch_recommendations("pdp").await.unwrap();
    manager.fetch_recommendations("pdp").await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(manager.clean_cache(), 0);
    assert_eq!(manager.state("pdp").unwrap().total_products, 3);
}

#[tokio::test]
async fn subscribers_see_changes_until_unsubscribed() {
    let manager = loaded_manager(25, 10).await;
    let pages = Arc::new(Mutex::new(Vec::new()));

    let recorded = pages.clone();
    let subscription = manager
        .subscribe("pdp", move |state| {
            recorded
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(state.current_page);
        })
        .unwrap();

    manager.next_page("pdp").unwrap();
    manager.next_page("pdp").unwrap();
    subscription.unsubscribe();
    manager.next_page("pdp").unwrap();

    assert_eq!(*pages.lock().unwrap(), vec![2, 3]);
    assert_eq!(manager.store("pdp").unwrap().subscriber_count(), 0);
}

#[tokio::test]
async fn watchers_are_woken_by_navigation() {
    let manager = loaded_manager(25, 10).await;
    let mut receiver = manager.watch("pdp").unwrap();

    manager.go_to_page("pdp", 3).unwrap();
    receiver.changed().await.unwrap();
    assert_eq!(receiver.borrow_and_update().current_page, 3);
}

#[tokio::test]
async fn destroy_resets_state_for_subscribers() {
    let manager = loaded_manager(25, 10).await;
    let last_len = Arc::new(Mutex::new(None));

    let recorded = last_len.clone();
    manager
        .subscribe("pdp", move |state| {
            *recorded.lock().unwrap_or_else(PoisonError::into_inner) = Some(state.products.len());
        })
        .unwrap()
        .forget();

    assert!(manager.destroy("pdp"));
    assert!(!manager.destroy("pdp"));
    assert_eq!(*last_len.lock().unwrap(), Some(0));
    assert_eq!(
        manager.next_page("pdp"),
        Err(InstanceError::NotFound("pdp".to_string()))
    );

    // A destroyed id can be initialized again from scratch
    manager.init(config("a", 10), "pdp").unwrap();
    assert!(manager.state("pdp").unwrap().products.is_empty());
    manager.fetch_recommendations("pdp").await.unwrap();
    assert_eq!(manager.state("pdp").unwrap().total_products, 25);
}

#[tokio::test]
async fn janitor_runs_with_background_cleanup() {
    let manager = ManagerConfig::new()
        .with_max_cache_entries(2)
        .with_cleanup_interval(Duration::from_millis(20))
        .build(CatalogProvider::new(3));
    assert!(manager.has_janitor());

    manager
        .init(config("a", 3).with_cache_ttl(Duration::from_millis(5)), "pdp")
        .unwrap();
    manager.fetch_recommendations("pdp").await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(manager.cache().size(), 0);
}

#[test]
fn managers_without_runtime_skip_janitor() {
    let manager = ManagerConfig::new()
        .with_background_cleanup()
        .build(CatalogProvider::new(3));
    assert!(!manager.has_janitor());
    assert_eq!(manager.cache().max_entries(), 20);
}
