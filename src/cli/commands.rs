use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::config::RouteManifest;
use crate::runtime_config::RuntimeConfig;

/// Command-line interface for segrouter
///
/// Inspects route manifests: validates templates, prints the priority-ordered
/// table and shows which route a path would dispatch to.
#[derive(Parser, Debug)]
#[command(name = "segrouter")]
#[command(about = "Segment router manifest tooling", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile every route in a manifest and report all problems
    Check {
        /// Route manifest (TOML, YAML or JSON)
        #[arg(short, long, env = "SEGROUTER_ROUTES")]
        routes: PathBuf,
    },
    /// Print the route table in priority order
    Routes {
        /// Route manifest (TOML, YAML or JSON)
        #[arg(short, long, env = "SEGROUTER_ROUTES")]
        routes: PathBuf,
    },
    /// Show the route a request would dispatch to
    Match {
        /// Route manifest (TOML, YAML or JSON)
        #[arg(short, long, env = "SEGROUTER_ROUTES")]
        routes: PathBuf,

        /// HTTP method of the request
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path, optionally with a query string
        path: String,
    },
}

/// Run a parsed command, writing its report to stdout
///
/// # Errors
///
/// Fails when the manifest cannot be loaded, a check finds problems, or the
/// method is not a valid HTTP method.
pub fn run_cli(cli: Cli) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, &mut out)
}

/// Run a command against an arbitrary writer
///
/// # Errors
///
/// See [`run_cli`].
pub fn execute<W: Write>(command: &Commands, out: &mut W) -> Result<()> {
    match command {
        Commands::Check { routes } => {
            let manifest = RouteManifest::from_path(routes)?;
            let problems = manifest.problems();
            if problems.is_empty() {
                writeln!(
                    out,
                    "✅ {}: {} route(s) OK",
                    routes.display(),
                    manifest.routes.len()
                )?;
                return Ok(());
            }
            for problem in &problems {
                writeln!(out, "❌ {problem}")?;
            }
            bail!("{} problem(s) in {}", problems.len(), routes.display())
        }
        Commands::Routes { routes } => {
            let manifest = RouteManifest::from_path(routes)?;
            let router = RuntimeConfig::from_env().apply(manifest.build_named()?);
            writeln!(out, "[routes] count={}", router.len())?;
            for route in router.iter() {
                writeln!(out, "[route] {route}")?;
            }
            Ok(())
        }
        Commands::Match {
            routes,
            method,
            path,
        } => {
            let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| anyhow!("invalid HTTP method '{method}'"))?;
            let manifest = RouteManifest::from_path(routes)?;
            let router = RuntimeConfig::from_env().apply(manifest.build_named()?);

            match router.route(&method, path) {
                Some(m) => {
                    let params = serde_json::to_string(&m.params)
                        .context("failed to serialize path params")?;
                    writeln!(out, "{} {path} -> {}", method, m.route)?;
                    writeln!(out, "params: {params}")?;
                }
                None => {
                    writeln!(out, "no route for {method} {path}")?;
                    let allowed = router.allowed_methods(path);
                    if !allowed.is_empty() {
                        let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                        writeln!(out, "allowed: {}", allowed.join(", "))?;
                    }
                }
            }
            Ok(())
        }
    }
}
