use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerResponse, RequestInfo};

/// Per-route counters
#[derive(Debug, Default)]
struct RouteStats {
    requests: AtomicUsize,
    errors: AtomicUsize,
    total_latency_ns: AtomicU64,
}

/// Middleware collecting request counters
///
/// Totals use atomics; per-route counters live in a `DashMap` keyed by route
/// name so concurrent dispatches on different routes do not contend.
///
/// Metrics collected:
/// - Total request count and average latency
/// - Requests answered by the fallback (no route matched)
/// - Per-route request count, 5xx count and average latency
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    fallback_count: AtomicUsize,
    routes: DashMap<String, RouteStats>,
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean latency across all requests; zero before the first request
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Number of requests handled by the not-found fallback
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.fallback_count.load(Ordering::Relaxed)
    }

    /// Requests dispatched to the named route
    #[must_use]
    pub fn route_requests(&self, route: &str) -> usize {
        self.routes
            .get(route)
            .map_or(0, |s| s.requests.load(Ordering::Relaxed))
    }

    /// Responses with status >= 500 from the named route
    #[must_use]
    pub fn route_errors(&self, route: &str) -> usize {
        self.routes
            .get(route)
            .map_or(0, |s| s.errors.load(Ordering::Relaxed))
    }

    /// Snapshot of `(route, requests, average latency)`, sorted by route name
    #[must_use]
    pub fn route_summary(&self) -> Vec<(String, usize, Duration)> {
        let mut summary: Vec<(String, usize, Duration)> = self
            .routes
            .iter()
            .map(|entry| {
                let requests = entry.requests.load(Ordering::Relaxed);
                let avg = if requests == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_nanos(
                        entry.total_latency_ns.load(Ordering::Relaxed) / requests as u64,
                    )
                };
                (entry.key().clone(), requests, avg)
            })
            .collect();
        summary.sort_by(|a, b| a.0.cmp(&b.0));
        summary
    }
}

// Everything is counted in `after`: it runs for every response, including
// ones an earlier middleware answered before this one's `before` ran.
impl Middleware for MetricsMiddleware {
    fn after(&self, req: &RequestInfo, res: &mut HandlerResponse, latency: Duration) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        let latency_ns = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.total_latency_ns.fetch_add(latency_ns, Ordering::Relaxed);

        let Some(route) = req.route_name.as_deref() else {
            self.fallback_count.fetch_add(1, Ordering::Relaxed);
            return;
        };

        // Fast path: existing entry, shared lock only
        if let Some(stats) = self.routes.get(route) {
            record(&stats, res.status, latency_ns);
            return;
        }
        let stats = self.routes.entry(route.to_string()).or_default();
        record(&stats, res.status, latency_ns);
    }
}

fn record(stats: &RouteStats, status: u16, latency_ns: u64) {
    stats.requests.fetch_add(1, Ordering::Relaxed);
    stats.total_latency_ns.fetch_add(latency_ns, Ordering::Relaxed);
    if status >= 500 {
        stats.errors.fetch_add(1, Ordering::Relaxed);
    }
}
