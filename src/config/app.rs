use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Application-level settings read from the `[app]` table.
///
/// The name drives the startup banner, the version is what `-v/--version`
/// prints, and `debug` raises log verbosity and error detail.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct AppConfig {
    /// Application name shown in the startup banner.
    #[serde(default)]
    pub name: Option<String>,

    /// Version string printed by `-v/--version`.
    #[serde(default)]
    pub version: Option<String>,

    /// Enables debug logging and verbose error output.
    #[serde(default)]
    pub debug: bool,
}
