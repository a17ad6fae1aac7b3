//! In-flight request deduplication
//!
//! Concurrent callers asking for the same key share one pending fetch and
//! all receive its outcome, error included. The slot for a key is removed
//! as soon as its fetch settles, so failures are never cached here.

use dashmap::DashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Outcome of a single-flight call
#[derive(Debug, Clone, PartialEq)]
pub struct Flight<V> {
    pub value: V,
    /// True when this caller joined a fetch started by another caller
    pub shared: bool,
}

type Slot<V, E> = Arc<OnceCell<Result<V, E>>>;

#[derive(Debug)]
pub struct SingleFlight<K, V, E>
where
    K: Eq + Hash,
{
    inflight: DashMap<K, Slot<V, E>>,
}

impl<K, V, E> Default for SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    pub fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }

    /// Run `fetch` for `key` unless an identical fetch is already running,
    /// in which case wait for its outcome instead.
    ///
    /// Waiters never issue a second fetch: a failed leader fails them too.
    pub async fn run<F, Fut>(&self, key: K, fetch: F) -> Result<Flight<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let cell = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let mut led = false;
        let outcome = cell
            .get_or_init(|| {
                led = true;
                fetch()
            })
            .await
            .clone();

        self.inflight.remove_if(&key, |_, c| Arc::ptr_eq(c, &cell));

        outcome.map(|value| Flight {
            value,
            shared: !led,
        })
    }

    /// Number of keys with a fetch in progress
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}
