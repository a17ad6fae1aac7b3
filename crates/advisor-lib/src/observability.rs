//! Observability infrastructure for the placement advisor
//!
//! Provides:
//! - Prometheus metrics (external calls, throttling, cache efficiency, plan latency)
//! - Structured JSON logging with tracing

use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for plan latency (in seconds)
const PLAN_LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AdvisorMetricsInner> = OnceLock::new();

struct AdvisorMetricsInner {
    external_calls: IntCounterVec,
    external_call_failures: IntCounterVec,
    throttle_retries: IntCounter,
    signal_cache_hits: IntCounter,
    signal_cache_misses: IntCounter,
    inflight_shared: IntCounter,
    plan_latency_seconds: Histogram,
    plans_generated: IntCounterVec,
    region_evaluation_errors: IntCounter,
    refresh_targets: IntGauge,
}

impl AdvisorMetricsInner {
    fn new() -> Self {
        Self {
            external_calls: register_int_counter_vec!(
                "placement_advisor_external_calls_total",
                "Calls made to the cloud management API",
                &["operation"]
            )
            .expect("Failed to register external_calls_total"),

            external_call_failures: register_int_counter_vec!(
                "placement_advisor_external_call_failures_total",
                "Cloud management API calls that failed after retries",
                &["operation"]
            )
            .expect("Failed to register external_call_failures_total"),

            throttle_retries: register_int_counter!(
                "placement_advisor_throttle_retries_total",
                "Retries caused by throttling or timeouts"
            )
            .expect("Failed to register throttle_retries_total"),

            signal_cache_hits: register_int_counter!(
                "placement_advisor_signal_cache_hits_total",
                "Signal lookups served from the TTL cache"
            )
            .expect("Failed to register signal_cache_hits_total"),

            signal_cache_misses: register_int_counter!(
                "placement_advisor_signal_cache_misses_total",
                "Signal lookups that required a fetch"
            )
            .expect("Failed to register signal_cache_misses_total"),

            inflight_shared: register_int_counter!(
                "placement_advisor_inflight_shared_total",
                "Signal lookups that joined an in-flight fetch"
            )
            .expect("Failed to register inflight_shared_total"),

            plan_latency_seconds: register_histogram!(
                "placement_advisor_plan_latency_seconds",
                "Time spent computing a placement plan",
                PLAN_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register plan_latency_seconds"),

            plans_generated: register_int_counter_vec!(
                "placement_advisor_plans_generated_total",
                "Placement plans produced, by strategy",
                &["strategy"]
            )
            .expect("Failed to register plans_generated_total"),

            region_evaluation_errors: register_int_counter!(
                "placement_advisor_region_evaluation_errors_total",
                "Regions whose evaluation degraded to warnings"
            )
            .expect("Failed to register region_evaluation_errors_total"),

            refresh_targets: register_int_gauge!(
                "placement_advisor_refresh_targets",
                "Number of (region, SKU) targets registered for background refresh"
            )
            .expect("Failed to register refresh_targets"),
        }
    }
}

/// Advisor metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone, Debug)]
pub struct AdvisorMetrics {
    _private: (),
}

impl Default for AdvisorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AdvisorMetricsInner {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new)
    }

    pub fn inc_external_call(&self, operation: &str) {
        self.inner().external_calls.with_label_values(&[operation]).inc();
    }

    pub fn inc_external_failure(&self, operation: &str) {
        self.inner()
            .external_call_failures
            .with_label_values(&[operation])
            .inc();
    }

    pub fn inc_throttle_retry(&self) {
        self.inner().throttle_retries.inc();
    }

    pub fn inc_cache_hit(&self) {
        self.inner().signal_cache_hits.inc();
    }

    pub fn inc_cache_miss(&self) {
        self.inner().signal_cache_misses.inc();
    }

    pub fn inc_inflight_shared(&self) {
        self.inner().inflight_shared.inc();
    }

    pub fn observe_plan_latency(&self, duration_secs: f64) {
        self.inner().plan_latency_seconds.observe(duration_secs);
    }

    pub fn inc_plan_generated(&self, strategy: &str) {
        self.inner().plans_generated.with_label_values(&[strategy]).inc();
    }

    pub fn inc_region_evaluation_error(&self) {
        self.inner().region_evaluation_errors.inc();
    }

    pub fn set_refresh_targets(&self, count: i64) {
        self.inner().refresh_targets.set(count);
    }
}

/// Structured logger for advisor events
///
/// Provides consistent JSON-formatted logging for plans, refresh cycles
/// and throttling.
#[derive(Clone, Debug)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log a completed plan
    pub fn log_plan(
        &self,
        request_kind: &str,
        strategy: &str,
        regions_evaluated: usize,
        instances_placed: u32,
        instances_requested: u32,
        warnings: usize,
        errors: usize,
    ) {
        info!(
            event = "plan_generated",
            instance = %self.instance,
            request_kind = %request_kind,
            strategy = %strategy,
            regions_evaluated = regions_evaluated,
            instances_placed = instances_placed,
            instances_requested = instances_requested,
            warnings = warnings,
            errors = errors,
            "Generated placement plan"
        );
    }

    /// Log a plan that could not produce a recommendation
    pub fn log_no_recommendation(&self, request_kind: &str, reason: &str) {
        warn!(
            event = "plan_empty",
            instance = %self.instance,
            request_kind = %request_kind,
            reason = %reason,
            "No placement recommendation produced"
        );
    }

    /// Log a background refresh cycle
    pub fn log_refresh_cycle(&self, targets: usize, refreshed: usize, failed: usize, persisted: usize) {
        if failed == 0 {
            info!(
                event = "signal_refresh",
                instance = %self.instance,
                targets = targets,
                refreshed = refreshed,
                persisted = persisted,
                "Signal refresh cycle complete"
            );
        } else {
            warn!(
                event = "signal_refresh",
                instance = %self.instance,
                targets = targets,
                refreshed = refreshed,
                failed = failed,
                persisted = persisted,
                "Signal refresh cycle completed with failures"
            );
        }
    }

    /// Log startup
    pub fn log_startup(&self, version: &str) {
        info!(
            event = "advisor_started",
            instance = %self.instance,
            version = %version,
            "Placement advisor started"
        );
    }

    /// Log shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "advisor_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Placement advisor shutting down"
        );
    }
}
