//! Crate-internal logging macros.
//!
//! Every line carries a bracketed tag naming the subsystem (`[CACHE-HIT]`,
//! `[FETCH]`, `[NAVIGATE]`, ...). By default the tag is prefixed with an emoji;
//! the `plain-logs` feature drops it for log pipelines that choke on non-ASCII.
//! Without the `tracing` feature every macro expands to nothing.
//!
//! ```toml
//! # Default: tracing enabled with emojis
//! storefront-recommendations = "0.1"
//!
//! # Disable all logging
//! storefront-recommendations = { version = "0.1", default-features = false }
//!
//! # Plain text tags
//! storefront-recommendations = { version = "0.1", features = ["plain-logs"] }
//! ```

/// Emit `message` at `level` under `tag`, with `emoji` unless `plain-logs` is on.
#[doc(hidden)]
#[macro_export]
macro_rules! __tagged_log {
    ($level:ident, $emoji:literal, $tag:literal, $($arg:tt)*) => {
        #[cfg(all(feature = "tracing", not(feature = "plain-logs")))]
        tracing::$level!("{} [{}] {}", $emoji, $tag, format_args!($($arg)*));
        #[cfg(all(feature = "tracing", feature = "plain-logs"))]
        tracing::$level!("[{}] {}", $tag, format_args!($($arg)*));
    };
}

/// Untagged debug line; callers put their own prefix in the message
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
    };
}

/// Untagged warning; callers put their own prefix in the message
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::warn!($($arg)*);
    };
}

/// A batch was served from the shared cache
#[macro_export]
macro_rules! log_cache_hit {
    ($($arg:tt)*) => { $crate::__tagged_log!(debug, "📊", "CACHE-HIT", $($arg)*) };
}

/// A fetched batch was written to the shared cache
#[macro_export]
macro_rules! log_cache_store {
    ($($arg:tt)*) => { $crate::__tagged_log!(debug, "📊", "CACHE-STORE", $($arg)*) };
}

/// A cache entry was dropped on request (refresh or explicit invalidation)
#[macro_export]
macro_rules! log_cache_invalidate {
    ($($arg:tt)*) => { $crate::__tagged_log!(debug, "🗑️", "CACHE-INVALIDATE", $($arg)*) };
}

/// A provider call is starting
#[macro_export]
macro_rules! log_fetch_start {
    ($($arg:tt)*) => { $crate::__tagged_log!(debug, "🔄", "FETCH", $($arg)*) };
}

/// A provider call returned a batch
#[macro_export]
macro_rules! log_fetch_success {
    ($($arg:tt)*) => { $crate::__tagged_log!(debug, "✅", "FETCH-SUCCESS", $($arg)*) };
}

/// A provider call failed; logged at warn since the instance now shows an error
#[macro_export]
macro_rules! log_fetch_error {
    ($($arg:tt)*) => { $crate::__tagged_log!(warn, "❌", "FETCH-ERROR", $($arg)*) };
}

/// An instance moved to another page or changed its page size
#[macro_export]
macro_rules! log_navigation {
    ($($arg:tt)*) => { $crate::__tagged_log!(trace, "📄", "NAVIGATE", $($arg)*) };
}
