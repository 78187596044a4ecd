//! # Hot Reload Module
//!
//! Live reloading of the route manifest without restarting the host.
//!
//! ## Overview
//!
//! [`watch_routes`] watches the manifest file and, on every modify or create
//! event:
//!
//! 1. **Parse** - the manifest is reloaded ([`RouteManifest::from_path`])
//! 2. **Bind** - handler names are resolved against the [`HandlerRegistry`]
//! 3. **Swap** - the new table is published through [`SharedRouter::replace`]
//!
//! Dispatches already in flight keep the snapshot they started with; the next
//! dispatch sees the new table.
//!
//! ## Error Handling
//!
//! If the new manifest fails to parse or bind (bad template, unknown handler):
//! - The error is logged
//! - The previous table remains active
//!
//! So saving a half-edited manifest never takes routes away.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use segrouter::hot_reload::watch_routes;
//!
//! let watcher = watch_routes("routes.toml", dispatcher.shared_routes(), registry)?;
//! // Keep the watcher alive for as long as reloads should happen
//! ```

use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::{HandlerRegistry, RouteManifest};
use crate::dispatcher::Handler;
use crate::router::SharedRouter;

/// Reload the manifest once and publish it
///
/// The slow-match threshold of the current table carries over.
///
/// # Errors
///
/// Returns the load or bind error; `shared` is left untouched.
pub fn reload_routes(
    path: &Path,
    shared: &SharedRouter<Handler>,
    registry: &HandlerRegistry,
) -> anyhow::Result<usize> {
    let manifest = RouteManifest::from_path(path)?;
    let router = manifest
        .bind(registry)?
        .with_slow_match_threshold(shared.snapshot().slow_match_threshold());
    let count = router.len();
    shared.replace(router);
    Ok(count)
}

/// Watch a route manifest and rebuild the shared table when it changes.
///
/// The returned watcher must be kept alive; dropping it stops the watch.
///
/// # Errors
///
/// Fails when the watcher cannot be created or the path cannot be watched.
pub fn watch_routes<P>(
    manifest_path: P,
    shared: Arc<SharedRouter<Handler>>,
    registry: Arc<HandlerRegistry>,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
{
    let path: PathBuf = manifest_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    match reload_routes(&watch_path, &shared, &registry) {
                        Ok(count) => info!(
                            manifest = %watch_path.display(),
                            routes_count = count,
                            "hot-reload: route table replaced"
                        ),
                        Err(e) => error!(
                            manifest = %watch_path.display(),
                            error = %format!("{e:#}"),
                            "hot-reload: reload failed, keeping previous routes"
                        ),
                    }
                }
            }
            Err(e) => warn!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    info!(manifest = %path.display(), "hot-reload: watching route manifest");
    Ok(watcher)
}
