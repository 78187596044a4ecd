use std::time::Duration;

use tracing::{debug, info};

use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse, RequestInfo};

/// Logs the start and outcome of every dispatched request
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            route = req.route_name.as_deref().unwrap_or("<fallback>"),
            "Request start"
        );
        None
    }

    fn after(&self, req: &RequestInfo, res: &mut HandlerResponse, latency: Duration) {
        info!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            route = req.route_name.as_deref().unwrap_or("<fallback>"),
            route_pattern = req.route_pattern.as_deref().unwrap_or(""),
            status = res.status,
            latency_us = latency.as_micros() as u64,
            "Request complete"
        );
    }
}
