//! Fallback-on-failure policy for upstream fetches
//!
//! Upstream providers are free tiers and scraped endpoints, so outages and rate
//! limits are routine. `fetch_resilient` absorbs any upstream failure by returning
//! synthetic data of the same shape, and only a broken fallback generator reaches
//! the caller as an error.

use std::error::Error as StdError;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, warn};

use super::{fetch_cached, CacheKey, TtlCache};

/// A fallback generator failed to produce a substitute value
///
/// Generators are meant to be pure computations, so this is a defect rather than an
/// environmental condition and must not be swallowed.
#[derive(Debug, Error)]
#[error("fallback generator for `{key}` failed: {source}")]
pub struct FallbackError {
    /// Cache key of the resource whose fallback failed
    pub key: String,
    /// What the generator reported
    #[source]
    pub source: Box<dyn StdError + Send + Sync>,
}

/// Fetches through the cache, substituting generated data when upstream fails
///
/// A successful fetch (from cache or upstream) is returned untouched. On any
/// upstream error the failure is logged and the output of `fallback` is returned
/// instead. The substitute is never written to the cache, so the next call goes back
/// to upstream rather than serving synthetic data for a whole TTL, and it is never
/// merged with an earlier real response.
pub async fn fetch_resilient<T, E, F, Fut, G, GE>(
    cache: &TtlCache,
    key: &CacheKey,
    ttl: Duration,
    operation: F,
    fallback: G,
) -> Result<T, FallbackError>
where
    T: Clone + Send + Sync + 'static,
    E: Display,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    G: FnOnce() -> Result<T, GE>,
    GE: Into<Box<dyn StdError + Send + Sync>>,
{
    let fetched = fetch_cached(cache, Some(key), ttl, operation).await;
    recover(key, fetched, fallback)
}

/// Applies the fallback policy to a result obtained some other way
///
/// Used when the fetch itself needs more than `fetch_cached`, such as going
/// through a `SingleFlight` group. Nothing is written to the cache here.
pub fn recover<T, E, G, GE>(
    key: &CacheKey,
    fetched: Result<T, E>,
    fallback: G,
) -> Result<T, FallbackError>
where
    E: Display,
    G: FnOnce() -> Result<T, GE>,
    GE: Into<Box<dyn StdError + Send + Sync>>,
{
    match fetched {
        Ok(value) => Ok(value),
        Err(upstream) => {
            warn!(key = %key, error = %upstream, "upstream failed, serving fallback data");
            fallback().map_err(|source| {
                let source = source.into();
                error!(key = %key, error = %source, "fallback generator failed");
                FallbackError {
                    key: key.to_string(),
                    source,
                }
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    #[derive(Debug, Clone, PartialEq)]
    struct Scoreboard {
        home: u32,
        away: u32,
    }

    #[derive(Debug, Error)]
    #[error("upstream timed out")]
    struct Timeout;

    fn synthetic() -> Result<Scoreboard, Infallible> {
        Ok(Scoreboard { home: 0, away: 0 })
    }

    #[tokio::test]
    async fn test_success_is_returned_and_cached() {
        let cache = TtlCache::new();
        let key = CacheKey::new("game").param(1);

        let value = fetch_resilient(
            &cache,
            &key,
            Duration::from_secs(120),
            || async { Ok::<_, Timeout>(Scoreboard { home: 110, away: 104 }) },
            synthetic,
        )
        .await
        .expect("Fallback should not fail");

        assert_eq!(value, Scoreboard { home: 110, away: 104 });
        assert_eq!(
            cache.get::<Scoreboard>(key.as_str()),
            Some(Scoreboard { home: 110, away: 104 })
        );
    }

    #[tokio::test]
    async fn test_failure_returns_fallback_output_only() {
        let cache = TtlCache::new();
        let key = CacheKey::new("game").param(1);

        let value = fetch_resilient(
            &cache,
            &key,
            Duration::from_secs(120),
            || async { Err::<Scoreboard, _>(Timeout) },
            synthetic,
        )
        .await
        .expect("Fallback should not fail");

        assert_eq!(value, Scoreboard { home: 0, away: 0 });
    }

    #[tokio::test]
    async fn test_fallback_is_not_cached_and_upstream_is_retried() {
        let cache = TtlCache::new();
        let key = CacheKey::new("games").param("2024-01-01");
        let ttl = Duration::from_secs(120);
        let calls = AtomicUsize::new(0);

        let failing = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<Scoreboard, _>(Timeout)
        };

        let _ = fetch_resilient(&cache, &key, ttl, failing, synthetic).await;
        assert!(cache.is_empty(), "Fallback data must not be stored");

        let recovered = fetch_resilient(
            &cache,
            &key,
            ttl,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Timeout>(Scoreboard { home: 99, away: 98 })
            },
            synthetic,
        )
        .await
        .expect("Fallback should not fail");

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(recovered, Scoreboard { home: 99, away: 98 });
    }

    #[tokio::test]
    async fn test_fallback_ignores_earlier_real_value_under_other_key() {
        let cache = TtlCache::new();
        let ttl = Duration::from_secs(120);
        let real_key = CacheKey::new("game").param(1);
        let failing_key = CacheKey::new("game").param(2);
        cache.set(real_key.as_str(), Scoreboard { home: 120, away: 118 }, ttl);

        let value = fetch_resilient(
            &cache,
            &failing_key,
            ttl,
            || async { Err::<Scoreboard, _>(Timeout) },
            synthetic,
        )
        .await
        .expect("Fallback should not fail");

        assert_eq!(value, Scoreboard { home: 0, away: 0 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_synthetic_games() {
        let cache = TtlCache::new();
        let key = CacheKey::new("games").param("2024-01-01");

        let games = fetch_resilient(
            &cache,
            &key,
            Duration::from_secs(120),
            || async {
                tokio::time::timeout(Duration::from_secs(5), sleep(Duration::from_secs(60)))
                    .await
                    .map_err(|_| Timeout)?;
                Ok::<Vec<Scoreboard>, Timeout>(Vec::new())
            },
            || {
                Ok::<_, Infallible>(vec![
                    Scoreboard { home: 112, away: 105 },
                    Scoreboard { home: 0, away: 0 },
                    Scoreboard { home: 0, away: 0 },
                ])
            },
        )
        .await
        .expect("Fallback should not fail");

        assert_eq!(games.len(), 3);
    }

    #[tokio::test]
    async fn test_broken_generator_is_reported_with_key() {
        let cache = TtlCache::new();
        let key = CacheKey::new("standings").param(2024);

        let result = fetch_resilient(
            &cache,
            &key,
            Duration::from_secs(300),
            || async { Err::<Scoreboard, _>(Timeout) },
            || Err::<Scoreboard, _>("conference table is empty"),
        )
        .await;

        let err = result.expect_err("Generator failure must propagate");
        assert_eq!(err.key, "standings:2024");
        assert!(err.to_string().contains("conference table is empty"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_generator_not_called_on_success() {
        let cache = TtlCache::new();
        let key = CacheKey::new("teams");
        let generated = AtomicUsize::new(0);

        let _ = fetch_resilient(
            &cache,
            &key,
            Duration::from_secs(3600),
            || async { Ok::<_, Timeout>(30u32) },
            || {
                generated.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Infallible>(0u32)
            },
        )
        .await;

        assert_eq!(generated.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_recover_passes_success_through() {
        let key = CacheKey::new("games").param("2024-01-01");

        let ok = recover(&key, Ok::<_, Timeout>(7u32), || Ok::<_, Infallible>(0u32));
        let replaced = recover(&key, Err::<u32, _>(Timeout), || Ok::<_, Infallible>(3u32));

        assert_eq!(ok.unwrap(), 7);
        assert_eq!(replaced.unwrap(), 3);
    }
}
