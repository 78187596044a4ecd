//! Copy-on-write route table for runtime registration.
//!
//! Dispatch reads a snapshot with a single atomic load and never blocks.
//! Writers are serialised by a mutex, build a modified copy of the current
//! table and publish it with one atomic store. Requests already holding the
//! old snapshot finish against it.

use arc_swap::ArcSwap;
use http::Method;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

use super::core::Router;
use crate::error::CompileError;

/// A route table shared between request threads and a single writer
pub struct SharedRouter<H> {
    current: ArcSwap<Router<H>>,
    writer: Mutex<()>,
}

impl<H> SharedRouter<H> {
    #[must_use]
    pub fn new(router: Router<H>) -> Self {
        Self {
            current: ArcSwap::from_pointee(router),
            writer: Mutex::new(()),
        }
    }

    /// Lock-free snapshot of the current table
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> Arc<Router<H>> {
        self.current.load_full()
    }

    /// Register one route against a copy of the table and publish it
    ///
    /// # Errors
    ///
    /// Returns the [`CompileError`] of a malformed template; the published
    /// table is left unchanged.
    pub fn register(
        &self,
        method: Option<Method>,
        pattern: &str,
        name: &str,
        handler: H,
    ) -> Result<(), CompileError> {
        let _guard = self.lock_writer();
        let mut next = Router::clone(&self.current.load());
        next.register_named(method, pattern, name, handler)?;
        self.current.store(Arc::new(next));
        Ok(())
    }

    /// Replace the whole table, e.g. after reloading a route manifest
    pub fn replace(&self, router: Router<H>) {
        let _guard = self.lock_writer();
        info!(routes_count = router.len(), "Route table replaced");
        self.current.store(Arc::new(router));
    }

    // The guarded data is `()`, so a poisoned lock carries no broken state.
    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H> Default for SharedRouter<H> {
    fn default() -> Self {
        Self::new(Router::new())
    }
}
