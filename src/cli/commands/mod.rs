//! Commands shipped with the framework.
pub mod config;

use super::{CliError, CommandRegistry};

/// Registers every built-in command.
///
/// # Errors
/// Returns `CliError::InvalidSignature` if a built-in declaration is malformed
pub fn register_builtin_commands(registry: &mut CommandRegistry) -> Result<(), CliError> {
    config::register_commands(registry)
}
