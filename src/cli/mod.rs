//! # CLI Module
//!
//! Command-line tooling for route manifests, shipped as the `segrouter`
//! binary.
//!
//! ## Commands
//!
//! ### `check`
//!
//! Compile every entry and report every problem (not just the first):
//!
//! ```bash
//! segrouter check --routes routes.toml
//! ```
//!
//! Exits non-zero when any entry is invalid.
//!
//! ### `routes`
//!
//! Print the table in the order dispatch tries it:
//!
//! ```bash
//! segrouter routes --routes routes.yaml
//! ```
//!
//! ### `match`
//!
//! Show which route a request would hit and its typed params as JSON:
//!
//! ```bash
//! segrouter match --routes routes.toml --method GET /user/42
//! ```
//!
//! `--routes` falls back to `SEGROUTER_ROUTES` when omitted.
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use segrouter::cli::{run_cli, Cli};
//! use clap::Parser;
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
