use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::rating::RateOutcome;

/// Metrics registry for the application.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Total rate callback requests
    pub rate_requests_total: AtomicU64,

    /// Rate requests by outcome
    pub rates_quoted: AtomicU64,
    pub rates_no_city: AtomicU64,
    pub rates_unmatched: AtomicU64,
    pub rates_no_route: AtomicU64,
    pub rates_invalid_cart: AtomicU64,
    pub rates_malformed: AtomicU64,
    pub rates_failed: AtomicU64,

    /// Rate latency buckets
    pub latency_under_1ms: AtomicU64,
    pub latency_1_5ms: AtomicU64,
    pub latency_5_10ms: AtomicU64,
    pub latency_10_50ms: AtomicU64,
    pub latency_50_100ms: AtomicU64,
    pub latency_over_100ms: AtomicU64,

    /// Directory snapshot loads
    pub directory_loads_total: AtomicU64,
    pub directory_load_errors: AtomicU64,

    /// Admin mutations of routes and cities
    pub admin_mutations_total: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry.
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    /// Record the outcome of a rate evaluation.
    pub fn record_outcome(&self, outcome: &RateOutcome) {
        self.rate_requests_total.fetch_add(1, Ordering::Relaxed);

        let counter = match outcome {
            RateOutcome::Quoted(_) => &self.rates_quoted,
            RateOutcome::NoCity => &self.rates_no_city,
            RateOutcome::Unmatched => &self.rates_unmatched,
            RateOutcome::NoRoute => &self.rates_no_route,
            RateOutcome::InvalidCart => &self.rates_invalid_cart,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request body that could not be parsed.
    pub fn record_malformed(&self) {
        self.rate_requests_total.fetch_add(1, Ordering::Relaxed);
        self.rates_malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that failed internally (directory unavailable).
    pub fn record_failed(&self) {
        self.rate_requests_total.fetch_add(1, Ordering::Relaxed);
        self.rates_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record rate latency.
    pub fn record_latency(&self, start: Instant) {
        let micros = start.elapsed().as_micros() as u64;

        if micros < 1000 {
            self.latency_under_1ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 5000 {
            self.latency_1_5ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 10000 {
            self.latency_5_10ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 50000 {
            self.latency_10_50ms.fetch_add(1, Ordering::Relaxed);
        } else if micros < 100000 {
            self.latency_50_100ms.fetch_add(1, Ordering::Relaxed);
        } else {
            self.latency_over_100ms.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a directory snapshot load.
    pub fn record_directory_load(&self, success: bool) {
        self.directory_loads_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.directory_load_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a successful admin mutation.
    pub fn record_admin_mutation(&self) {
        self.admin_mutations_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        format!(
            r#"# HELP ecuship_rate_requests_total Total number of rate requests
# TYPE ecuship_rate_requests_total counter
ecuship_rate_requests_total {}

# HELP ecuship_rates Rate requests by outcome
# TYPE ecuship_rates counter
ecuship_rates{{outcome="quoted"}} {}
ecuship_rates{{outcome="no_city"}} {}
ecuship_rates{{outcome="unmatched"}} {}
ecuship_rates{{outcome="no_route"}} {}
ecuship_rates{{outcome="invalid_cart"}} {}
ecuship_rates{{outcome="malformed"}} {}
ecuship_rates{{outcome="failed"}} {}

# HELP ecuship_rate_latency_bucket Rate latency histogram
# TYPE ecuship_rate_latency_bucket counter
ecuship_rate_latency_bucket{{le="0.001"}} {}
ecuship_rate_latency_bucket{{le="0.005"}} {}
ecuship_rate_latency_bucket{{le="0.01"}} {}
ecuship_rate_latency_bucket{{le="0.05"}} {}
ecuship_rate_latency_bucket{{le="0.1"}} {}
ecuship_rate_latency_bucket{{le="+Inf"}} {}

# HELP ecuship_directory_loads_total Directory snapshot loads
# TYPE ecuship_directory_loads_total counter
ecuship_directory_loads_total {}

# HELP ecuship_directory_load_errors_total Directory snapshot load errors
# TYPE ecuship_directory_load_errors_total counter
ecuship_directory_load_errors_total {}

# HELP ecuship_admin_mutations_total Route and city mutations
# TYPE ecuship_admin_mutations_total counter
ecuship_admin_mutations_total {}
"#,
            self.rate_requests_total.load(Ordering::Relaxed),
            self.rates_quoted.load(Ordering::Relaxed),
            self.rates_no_city.load(Ordering::Relaxed),
            self.rates_unmatched.load(Ordering::Relaxed),
            self.rates_no_route.load(Ordering::Relaxed),
            self.rates_invalid_cart.load(Ordering::Relaxed),
            self.rates_malformed.load(Ordering::Relaxed),
            self.rates_failed.load(Ordering::Relaxed),
            self.latency_under_1ms.load(Ordering::Relaxed),
            self.latency_1_5ms.load(Ordering::Relaxed),
            self.latency_5_10ms.load(Ordering::Relaxed),
            self.latency_10_50ms.load(Ordering::Relaxed),
            self.latency_50_100ms.load(Ordering::Relaxed),
            self.latency_over_100ms.load(Ordering::Relaxed),
            self.directory_loads_total.load(Ordering::Relaxed),
            self.directory_load_errors.load(Ordering::Relaxed),
            self.admin_mutations_total.load(Ordering::Relaxed),
        )
    }
}

/// Guard for timing operations.
pub struct TimingGuard<'a> {
    registry: &'a MetricsRegistry,
    start: Instant,
}

impl<'a> TimingGuard<'a> {
    pub fn new(registry: &'a MetricsRegistry) -> Self {
        TimingGuard {
            registry,
            start: Instant::now(),
        }
    }
}

impl<'a> Drop for TimingGuard<'a> {
    fn drop(&mut self) {
        self.registry.record_latency(self.start);
    }
}
