use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{CliError, CommandError, ParseOutcome};
use crate::config::{CommandEntry, RcConfig};

/// Per-command bootstrap and exit policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSettings {
    /// Bootstrap the host application before parsing.
    pub load_app: bool,
    /// Keep the process running after the handler succeeds.
    pub stay_alive: bool,
    /// Environments passed to the bootstrapper.
    pub environments: Vec<String>,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            load_app: false,
            stay_alive: false,
            environments: crate::config::default_environments(),
        }
    }
}

impl From<CommandEntry> for CommandSettings {
    fn from(entry: CommandEntry) -> Self {
        Self {
            load_app: entry.load_app,
            stay_alive: entry.stay_alive,
            environments: entry.environments,
        }
    }
}

/// Starts the host application for commands that set `loadApp`.
#[async_trait]
pub trait Bootstrapper: Send + Sync {
    /// Boots the application for the given environments.
    async fn fire(&self, environments: &[String]) -> Result<(), CommandError>;
}

/// What the process should do once parsing finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    /// Exit with the given code.
    Exit(i32),
    /// Keep running; the command started long-lived work.
    StayAlive,
}

impl ExitDecision {
    /// Applies the decision to the current process.
    ///
    /// `StayAlive` parks until Ctrl-C so tasks spawned by the handler keep
    /// running.
    pub async fn enforce(self) {
        let code = match self {
            ExitDecision::Exit(code) => code,
            ExitDecision::StayAlive => {
                debug!("Staying alive until interrupted");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                0
            }
        };

        std::process::exit(code);
    }
}

/// Looks up settings records and applies their policy around a parse.
#[derive(Default)]
pub struct SettingsResolver {
    table: HashMap<String, toml::Value>,
    bootstrapper: Option<Arc<dyn Bootstrapper>>,
}

impl SettingsResolver {
    /// Seeds the table from `rc.commands`.
    pub fn new(rc: &RcConfig) -> Self {
        Self {
            table: rc
                .commands
                .iter()
                .map(|(name, record)| (name.clone(), record.clone()))
                .collect(),
            bootstrapper: None,
        }
    }

    /// Installs the application bootstrapper.
    pub fn set_bootstrapper(&mut self, bootstrapper: Arc<dyn Bootstrapper>) {
        self.bootstrapper = Some(bootstrapper);
    }

    /// Stores a settings record for `command`, replacing any previous one.
    pub fn set(&mut self, command: &str, settings: &CommandSettings) {
        match toml::Value::try_from(settings) {
            Ok(record) => {
                self.table.insert(command.to_string(), record);
            }
            Err(e) => warn!(command, error = %e, "Cannot store command settings"),
        }
    }

    /// Effective settings for a command token.
    ///
    /// Missing records, module-path strings and malformed tables all
    /// resolve to the defaults.
    pub fn resolve(&self, command: Option<&str>) -> CommandSettings {
        let Some(record) = command.and_then(|command| self.table.get(command)) else {
            return CommandSettings::default();
        };

        match record {
            toml::Value::Table(_) => match record.clone().try_into::<CommandEntry>() {
                Ok(entry) => entry.into(),
                Err(e) => {
                    warn!(
                        command = command.unwrap_or_default(),
                        error = %e,
                        "Malformed command settings, using defaults"
                    );
                    CommandSettings::default()
                }
            },
            _ => CommandSettings::default(),
        }
    }

    /// Boots the host application when the settings ask for it.
    ///
    /// # Errors
    /// Returns `CliError::Bootstrap` if no bootstrapper is installed or it fails
    pub async fn prepare(&self, settings: &CommandSettings) -> Result<(), CliError> {
        if !settings.load_app {
            return Ok(());
        }

        let bootstrapper = self
            .bootstrapper
            .as_ref()
            .ok_or_else(|| CliError::Bootstrap("no application bootstrapper installed".to_string()))?;

        info!(environments = ?settings.environments, "Bootstrapping application");
        bootstrapper
            .fire(&settings.environments)
            .await
            .map_err(|e| CliError::Bootstrap(e.to_string()))
    }

    /// Exit policy after a parse.
    ///
    /// Help and version always exit 0, failures exit 1 and a dispatched
    /// command exits 0 unless it asked to stay alive.
    pub fn exit_decision(
        settings: &CommandSettings,
        outcome: &Result<ParseOutcome, CliError>,
    ) -> ExitDecision {
        match outcome {
            Ok(ParseOutcome::Dispatched { .. }) if settings.stay_alive => ExitDecision::StayAlive,
            Ok(_) => ExitDecision::Exit(0),
            Err(_) => ExitDecision::Exit(1),
        }
    }
}
