//! # Recommendation Hooks
//!
//! Bridges an instance's observable store into Dioxus signals so components
//! re-render when the batch, page or loading flag changes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dioxus::prelude::*;
//! use storefront_recommendations::prelude::*;
//!
//! #[component]
//! fn SimilarItems(manager: RecommendationManager<Api>) -> Element {
//!     let state = use_recommendations(&manager, "pdp-similar");
//!     let page = use_current_page_products(state);
//!     let next = {
//!         let manager = manager.clone();
//!         move |_| { let _ = manager.next_page("pdp-similar"); }
//!     };
//!
//!     rsx! {
//!         for item in page() { ProductCard { item } }
//!         button { disabled: state.read().loading, onclick: next, "Next" }
//!     }
//! }
//! ```

use dioxus::prelude::*;

use crate::{
    manager::RecommendationManager, provider::RecommendationProvider,
    state::RecommendationState,
};

/// Signal mirroring the state of `instance_id`.
///
/// The signal starts from the current state (or an empty state if the instance
/// is not initialized yet) and follows every later change. The update task is
/// owned by the calling component and stops when it unmounts.
pub fn use_recommendations<P>(
    manager: &RecommendationManager<P>,
    instance_id: &str,
) -> Signal<RecommendationState<P::Item>>
where
    P: RecommendationProvider,
{
    let initial_manager = manager.clone();
    let initial_id = instance_id.to_string();
    let state = use_signal(move || initial_manager.state(&initial_id).unwrap_or_default());

    let manager = manager.clone();
    let instance_id = instance_id.to_string();
    use_hook(move || {
        let Ok(mut receiver) = manager.watch(&instance_id) else {
            crate::warn_log!(
                "⚠️ [HOOK] Instance '{}' not initialized; signal will stay empty",
                instance_id
            );
            return;
        };

        let mut state_for_async = state;
        spawn(async move {
            while receiver.changed().await.is_ok() {
                let next = receiver.borrow_and_update().clone();
                state_for_async.set(next);
            }
        });
    });

    state
}

/// Memo of the items on the current page of a recommendation signal
pub fn use_current_page_products<T>(state: Signal<RecommendationState<T>>) -> Memo<Vec<T>>
where
    T: crate::types::ItemBounds,
{
    use_memo(move || state.read().current_page_products().to_vec())
}
