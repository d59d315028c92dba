//! Configuration schema definitions and loading.
//!
//! Defines the rc configuration consumed by the command engine: application
//! identity (`[app]`), per-command settings records (`[rc.commands]`) and
//! logging. All configurations are serializable to/from TOML format.

mod app;
mod loading;
mod logging;
mod paths;
mod rc;

#[cfg(test)]
mod tests;

pub use app::AppConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use paths::ConfigPaths;
pub use rc::{CommandEntry, RcConfig};

pub(crate) use rc::default_environments;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Main configuration structure for an Artisan-powered CLI.
///
/// Represents the complete configuration schema that can be loaded
/// from TOML files. All fields have sensible defaults, so a missing
/// file behaves exactly like an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, Default, JsonSchema)]
pub struct Config {
    /// Application identity and debug switch.
    #[serde(default)]
    pub app: AppConfig,

    /// Per-command settings records keyed by command signature.
    #[serde(default)]
    pub rc: RcConfig,

    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}
