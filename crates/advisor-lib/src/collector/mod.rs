//! Signal collection from the cloud management API
//!
//! This module provides everything between the scorers and the external API:
//! a TTL cache, in-flight deduplication, a concurrency-bounded retrying call
//! gate, snapshot persistence for volatility analysis, and a background
//! refresh worker.

mod cache;
mod gate;
mod refresh;
mod signals;
mod single_flight;
mod snapshots;


pub use cache::{TtlCache, DEFAULT_CACHE_TTL};
pub use gate::{CallGate, RetryPolicy, DEFAULT_MAX_CONCURRENCY};
pub use refresh::{RefreshConfig, RefreshStats, RefreshWorker, DEFAULT_REFRESH_INTERVAL};
pub use signals::{CollectorConfig, SignalCollector, SignalKey, SignalRecord, SignalRequest};
pub use single_flight::{Flight, SingleFlight};
pub use snapshots::{InMemorySnapshotStore, SnapshotStore, SnapshotStoreConfig};
