//! # Route Manifest Module
//!
//! Routes can be declared in a manifest file instead of (or in addition to)
//! explicit [`Dispatcher::register`](crate::dispatcher::Dispatcher::register)
//! calls. Each entry names a handler; the names are bound to handler closures
//! through a [`HandlerRegistry`] supplied by the application.
//!
//! ## Format
//!
//! TOML (`.toml`), YAML (`.yaml` / `.yml`) or JSON (anything else):
//!
//! ```toml
//! [[routes]]
//! method = "GET"
//! path = "/user/{id<int>}"
//! handler = "get_user"
//!
//! # No method: the route accepts every method
//! [[routes]]
//! path = "/files/{rest<path>}"
//! handler = "serve_file"
//! ```
//!
//! ## Errors
//!
//! Loading and binding fail as a whole: a parse error, an unknown method, an
//! unknown handler name or a pattern compile error in any entry rejects the
//! manifest, and the caller keeps whatever table it had before.

use anyhow::{anyhow, Context, Result};
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::dispatcher::Handler;
use crate::pattern::CompiledPattern;
use crate::router::Router;

/// One route declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// HTTP method; omitted means any method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Route template, e.g. `/user/{id<int>}`
    pub path: String,
    /// Handler name, resolved through a [`HandlerRegistry`]
    pub handler: String,
}

impl RouteEntry {
    /// Parse the method field
    ///
    /// # Errors
    ///
    /// Fails when the method is not a valid HTTP method token.
    pub fn parsed_method(&self) -> Result<Option<Method>> {
        self.method
            .as_deref()
            .map(|m| {
                Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                    .map_err(|_| anyhow!("invalid HTTP method '{m}'"))
            })
            .transpose()
    }
}

/// A parsed route manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteManifest {
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
}

impl RouteManifest {
    /// Load a manifest, choosing the format from the file extension
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read route manifest {}", path.display()))?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let manifest = match extension.as_str() {
            "toml" => Self::from_toml_str(&content),
            "yaml" | "yml" => Self::from_yaml_str(&content),
            _ => Self::from_json_str(&content),
        }
        .with_context(|| format!("failed to parse route manifest {}", path.display()))?;

        info!(
            manifest = %path.display(),
            routes_count = manifest.routes.len(),
            "Route manifest loaded"
        );
        Ok(manifest)
    }

    /// # Errors
    ///
    /// Fails on invalid TOML or a schema mismatch.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// # Errors
    ///
    /// Fails on invalid YAML or a schema mismatch.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// # Errors
    ///
    /// Fails on invalid JSON or a schema mismatch.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Every problem in the manifest, one message per bad entry
    ///
    /// Unlike [`bind`](Self::bind) this does not stop at the first error.
    /// Handler names are not checked; there is no registry at this point.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (idx, entry) in self.routes.iter().enumerate() {
            if let Err(e) = entry.parsed_method() {
                problems.push(format!("route #{idx} ({}): {e}", entry.path));
            }
            if let Err(e) = CompiledPattern::compile(&entry.path) {
                problems.push(format!("route #{idx} ({}): {e}", entry.path));
            }
            if entry.handler.trim().is_empty() {
                problems.push(format!("route #{idx} ({}): empty handler name", entry.path));
            }
        }
        problems
    }

    /// Build a route table whose handler values are the handler names
    ///
    /// Used by the CLI, which inspects routes without running them.
    ///
    /// # Errors
    ///
    /// Fails on the first entry with an invalid method or template.
    pub fn build_named(&self) -> Result<Router<String>> {
        let mut router = Router::new();
        for (idx, entry) in self.routes.iter().enumerate() {
            let method = entry
                .parsed_method()
                .with_context(|| format!("route #{idx} ({})", entry.path))?;
            router
                .register_named(method, &entry.path, &entry.handler, entry.handler.clone())
                .with_context(|| format!("route #{idx} ({})", entry.path))?;
        }
        Ok(router)
    }

    /// Build a dispatchable route table, resolving handler names in `registry`
    ///
    /// # Errors
    ///
    /// Fails on the first entry with an invalid method, an unknown handler
    /// name or a template that does not compile.
    pub fn bind(&self, registry: &HandlerRegistry) -> Result<Router<Handler>> {
        let mut router = Router::new();
        for (idx, entry) in self.routes.iter().enumerate() {
            let context = || format!("route #{idx} ({})", entry.path);
            let method = entry.parsed_method().with_context(context)?;
            let handler = registry
                .get(&entry.handler)
                .ok_or_else(|| anyhow!("unknown handler '{}'", entry.handler))
                .with_context(context)?;
            router
                .register_named(method, &entry.path, &entry.handler, handler)
                .with_context(context)?;
        }
        Ok(router)
    }
}

/// Handler closures by name, for binding manifests
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a named handler
    pub fn insert(&mut self, name: impl Into<String>, handler: Handler) -> &mut Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Clone of the named handler
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &names)
            .finish()
    }
}
