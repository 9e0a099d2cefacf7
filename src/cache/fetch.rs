//! Memoized access to slow upstream operations
//!
//! `fetch_cached` returns a fresh cached value when one exists and otherwise runs
//! the supplied operation, storing its successful result under a `CacheKey`.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::debug;

use super::TtlCache;

/// Separator between the resource name and each parameter
const KEY_SEPARATOR: char = ':';

/// Canonical cache key: a resource name followed by every parameter that shapes
/// the response, e.g. `team-games:14:2024`
///
/// Parameters are escaped so that a `:` inside a value can never make two
/// different parameter lists produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Starts a key for the given resource class
    pub fn new(resource: &str) -> Self {
        Self(escape(resource))
    }

    /// Appends one request parameter
    pub fn param(mut self, value: impl fmt::Display) -> Self {
        self.0.push(KEY_SEPARATOR);
        self.0.push_str(&escape(&value.to_string()));
        self
    }

    /// Returns the key as stored in the cache
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn escape(raw: &str) -> String {
    raw.replace('%', "%25").replace(KEY_SEPARATOR, "%3A")
}

/// Returns the cached value for `key`, or runs `operation` and caches its result
///
/// On a hit `operation` is never called. On a miss it is called exactly once; a
/// successful result is stored for `ttl` and returned, an error is returned as-is
/// and nothing is stored. Passing `None` as the key makes the call uncacheable, so
/// every invocation runs `operation`; this suits aggregations whose sub-fetches
/// are cached on their own.
///
/// Dropping the returned future before `operation` completes cancels it and leaves
/// the cache untouched.
pub async fn fetch_cached<T, E, F, Fut>(
    cache: &TtlCache,
    key: Option<&CacheKey>,
    ttl: Duration,
    operation: F,
) -> Result<T, E>
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let Some(key) = key else {
        return operation().await;
    };

    if let Some(hit) = cache.get::<T>(key.as_str()) {
        debug!(key = %key, "cache hit");
        return Ok(hit);
    }

    debug!(key = %key, "cache miss");
    let value = operation().await?;
    cache.set(key.as_str(), value.clone(), ttl);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::{advance, sleep};

    #[derive(Debug, PartialEq)]
    struct FakeError(&'static str);

    async fn counted(calls: &AtomicUsize, value: u32) -> Result<u32, FakeError> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[test]
    fn test_key_joins_resource_and_params() {
        let key = CacheKey::new("team-games").param(14).param(2024);

        assert_eq!(key.as_str(), "team-games:14:2024");
        assert_eq!(key.to_string(), "team-games:14:2024");
    }

    #[test]
    fn test_key_escapes_separator_inside_params() {
        let left = CacheKey::new("games").param("a:b").param("c");
        let right = CacheKey::new("games").param("a").param("b:c");

        assert_ne!(left, right);
        assert_eq!(left.as_str(), "games:a%3Ab:c");
    }

    #[test]
    fn test_identical_requests_share_a_key() {
        let first = CacheKey::new("shot-chart").param(201939).param("2024-25");
        let second = CacheKey::new("shot-chart").param(201939).param("2024-25");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_miss_runs_operation_once_then_hits() {
        let cache = TtlCache::new();
        let calls = AtomicUsize::new(0);
        let key = CacheKey::new("standings").param(2024);
        let ttl = Duration::from_secs(300);

        let first = fetch_cached(&cache, Some(&key), ttl, || counted(&calls, 42)).await;
        let second = fetch_cached(&cache, Some(&key), ttl, || counted(&calls, 99)).await;

        assert_eq!(first, Ok(42));
        assert_eq!(second, Ok(42), "Second call should be served from cache");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_propagates_and_is_not_cached() {
        let cache = TtlCache::new();
        let key = CacheKey::new("games").param("2024-01-01");
        let ttl = Duration::from_secs(120);

        let failed: Result<u32, FakeError> = fetch_cached(&cache, Some(&key), ttl, || async {
            Err(FakeError("rate limited"))
        })
        .await;

        assert_eq!(failed, Err(FakeError("rate limited")));
        assert!(cache.is_empty());

        let calls = AtomicUsize::new(0);
        let retried = fetch_cached(&cache, Some(&key), ttl, || counted(&calls, 3)).await;
        assert_eq!(retried, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_uncacheable_call_always_runs() {
        let cache = TtlCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(300);

        for _ in 0..3 {
            let value = fetch_cached(&cache, None, ttl, || counted(&calls, 5)).await;
            assert_eq!(value, Ok(5));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_different_params_do_not_collide() {
        let cache = TtlCache::new();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(300);
        let key_2023 = CacheKey::new("standings").param(2023);
        let key_2024 = CacheKey::new("standings").param(2024);

        let a = fetch_cached(&cache, Some(&key_2023), ttl, || counted(&calls, 23)).await;
        let b = fetch_cached(&cache, Some(&key_2024), ttl, || counted(&calls, 24)).await;

        assert_eq!(a, Ok(23));
        assert_eq!(b, Ok(24));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_triggers_refetch() {
        let cache = TtlCache::new();
        let calls = AtomicUsize::new(0);
        let key = CacheKey::new("games").param("2024-01-01");
        let ttl = Duration::from_secs(120);

        let _ = fetch_cached(&cache, Some(&key), ttl, || counted(&calls, 1)).await;
        advance(Duration::from_secs(121)).await;
        let refreshed = fetch_cached(&cache, Some(&key), ttl, || counted(&calls, 2)).await;

        assert_eq!(refreshed, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_fetch_leaves_cache_untouched() {
        let cache = TtlCache::new();
        let key = CacheKey::new("play-by-play").param(1001);

        let task = {
            let cache = cache.clone();
            let key = key.clone();
            tokio::spawn(async move {
                fetch_cached(&cache, Some(&key), Duration::from_secs(300), || async {
                    sleep(Duration::from_secs(10)).await;
                    Ok::<_, FakeError>(7u32)
                })
                .await
            })
        };

        sleep(Duration::from_secs(1)).await;
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert!(cache.get::<u32>(key.as_str()).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_may_both_fetch() {
        let cache = TtlCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new("standings").param(2024);
        let ttl = Duration::from_secs(300);

        let slow = |value: u32| {
            let calls = Arc::clone(&calls);
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(500)).await;
                Ok::<_, FakeError>(value)
            }
        };

        let (a, b) = tokio::join!(
            fetch_cached(&cache, Some(&key), ttl, slow(1)),
            fetch_cached(&cache, Some(&key), ttl, slow(2)),
        );

        assert!(a.is_ok() && b.is_ok());
        let runs = calls.load(Ordering::SeqCst);
        assert!((1..=2).contains(&runs));
        // Last completion wins the slot
        assert!(matches!(cache.get::<u32>(key.as_str()), Some(1) | Some(2)));
    }
}
