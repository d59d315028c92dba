//! Artisan - declarative command registration and dispatch for CLIs.
//!
//! Commands are types implementing [`cli::Command`] or plain async
//! functions registered as routes. Both declare a signature, positional
//! arguments and flags; the framework parses argv, binds the resolved
//! values and runs the handler. The main features include:
//!
//! - One dispatch path for class and route commands
//! - Per-command settings for application bootstrap and exit policy
//! - Child-process invocation for isolated runs
//! - TOML rc configuration with imports
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use artisan::{Artisan, config::Config};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut artisan = Artisan::new("artisan", Config::discover()?);
//! artisan.register_builtin_commands()?;
//!
//! let argv: Vec<String> = std::env::args().collect();
//! artisan.parse(&argv).await.enforce().await;
//! # Ok(())
//! # }
//! ```

mod artisan;

/// Configuration schema definitions and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// Command registration, parsing and dispatch.
pub mod cli;

/// Log subscriber setup.
pub mod tracing_config;

pub use artisan::Artisan;
/// Re-exported core types for convenience.
pub use crate::core::{ArtisanError, Result};
