//! Configuration inspection commands.
mod get;
mod schema;

pub use get::GetCommand;
pub use schema::SchemaCommand;

use crate::cli::{CliError, CommandRegistry};

/// Registers the `config:*` commands with the command registry.
///
/// # Errors
/// Returns `CliError::InvalidSignature` if a built-in declaration is malformed
pub fn register_commands(registry: &mut CommandRegistry) -> Result<(), CliError> {
    registry.register::<GetCommand>()?;
    registry.register::<SchemaCommand>()?;

    Ok(())
}
