use std::time::Duration;

use crate::dispatcher::{HandlerRequest, HandlerResponse, RequestInfo};

/// Hooks run around every dispatched handler, fallback included
///
/// `before` runs in registration order; the first middleware that returns a
/// response short-circuits the handler. `after` runs for every middleware,
/// with the latency of the handler call (zero when short-circuited). By then
/// the handler owns the request, so `after` sees only its [`RequestInfo`].
pub trait Middleware: Send + Sync {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }
    fn after(&self, _req: &RequestInfo, _res: &mut HandlerResponse, _latency: Duration) {}
}
