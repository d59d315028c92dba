use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The `[rc]` table.
///
/// Command records are kept as raw TOML values: a record may be a plain
/// module path string or a settings table, and a malformed table must not
/// prevent the rest of the file from loading.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct RcConfig {
    /// Per-command records keyed by command signature.
    #[serde(default)]
    #[schemars(with = "BTreeMap<String, CommandEntry>")]
    pub commands: BTreeMap<String, toml::Value>,
}

/// Typed view of a single `rc.commands.<signature>` table.
///
/// Only `loadApp`, `stayAlive` and `environments` influence dispatch;
/// `path` and `loadAllCommands` are carried for tooling that reads the
/// same file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandEntry {
    /// Source location of the command implementation.
    #[serde(default)]
    pub path: Option<String>,

    /// Whether every command should be registered, not only the invoked one.
    #[serde(default)]
    pub load_all_commands: bool,

    /// Bootstrap the host application before parsing.
    #[serde(default)]
    pub load_app: bool,

    /// Keep the process alive after the handler completes.
    #[serde(default)]
    pub stay_alive: bool,

    /// Environments handed to the application bootstrapper.
    #[serde(default = "default_environments")]
    pub environments: Vec<String>,
}

pub(crate) fn default_environments() -> Vec<String> {
    vec!["console".to_string()]
}
