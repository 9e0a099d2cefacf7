//! Single-flight coalescing for cache misses
//!
//! Plain `fetch_cached` lets concurrent misses on one key each hit upstream. A
//! `SingleFlight` group elects one leader per key: the leader runs the operation
//! and publishes its outcome, success or failure, to every caller that joined
//! while it was in flight. Waiters never call upstream themselves unless the
//! leader is cancelled before it finishes.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use super::{fetch_cached, CacheKey, TtlCache};

/// A finished flight's `Result<T, Arc<E>>`, type-erased
type Outcome = Arc<dyn Any + Send + Sync>;

/// Channels of the flights currently running, one per key
#[derive(Clone, Default)]
pub struct SingleFlight {
    flights: Arc<Mutex<HashMap<String, watch::Receiver<Option<Outcome>>>>>,
}

impl fmt::Debug for SingleFlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

/// The caller running the operation for a key; dropping it ends the flight
struct Lead<'a> {
    group: &'a SingleFlight,
    key: &'a str,
    tx: watch::Sender<Option<Outcome>>,
}

impl Lead<'_> {
    fn publish(self, outcome: Outcome) {
        self.tx.send_replace(Some(outcome));
    }
}

impl Drop for Lead<'_> {
    fn drop(&mut self) {
        // Waiters see either the published outcome or a closed channel
        self.group.flights.lock().remove(self.key);
    }
}

enum Role<'a> {
    Leader(Lead<'a>),
    Follower(watch::Receiver<Option<Outcome>>),
}

impl SingleFlight {
    /// Creates an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Like `fetch_cached`, but concurrent misses on one key share a single call
    ///
    /// Every caller that joins a running flight receives that flight's result,
    /// including its error, so an outage costs one upstream timeout rather than
    /// one per waiter. Errors are shared behind an `Arc`. If the leader is dropped
    /// before finishing, one of its waiters takes over.
    pub async fn fetch_cached<T, E, F, Fut>(
        &self,
        cache: &TtlCache,
        key: &CacheKey,
        ttl: Duration,
        operation: F,
    ) -> Result<T, Arc<E>>
    where
        T: Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let lead = loop {
            if let Some(hit) = cache.get::<T>(key.as_str()) {
                return Ok(hit);
            }

            let rx = match self.join(key.as_str()) {
                Role::Leader(lead) => break lead,
                Role::Follower(rx) => rx,
            };
            debug!(key = %key, "waiting on in-flight fetch");

            let Some(outcome) = wait(rx).await else {
                debug!(key = %key, "in-flight fetch was cancelled, retrying");
                continue;
            };
            return match outcome.downcast_ref::<Result<T, Arc<E>>>() {
                Some(shared) => shared.clone(),
                // Same key fetched as a different type; not ours to share
                None => fetch_cached(cache, Some(key), ttl, operation)
                    .await
                    .map_err(Arc::new),
            };
        };

        let result = fetch_cached(cache, Some(key), ttl, operation)
            .await
            .map_err(Arc::new);
        lead.publish(Arc::new(result.clone()));
        result
    }

    /// Number of keys with a fetch currently in flight
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }

    fn join<'a>(&'a self, key: &'a str) -> Role<'a> {
        let mut flights = self.flights.lock();
        if let Some(rx) = flights.get(key) {
            return Role::Follower(rx.clone());
        }

        let (tx, rx) = watch::channel(None);
        flights.insert(key.to_string(), rx);
        Role::Leader(Lead {
            group: self,
            key,
            tx,
        })
    }
}

/// Waits for a flight's outcome; `None` if its leader went away without one
async fn wait(mut rx: watch::Receiver<Option<Outcome>>) -> Option<Outcome> {
    let outcome = rx
        .wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|published| published.clone());
    outcome
}
