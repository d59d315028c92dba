use std::{error::Error as StdError, io, path::PathBuf};

use serde_json::{Map, Value};
use thiserror::Error;

/// Flat map from camelCase option name to its resolved value.
pub type OptionValues = Map<String, Value>;

/// Errors raised at the framework boundary.
///
/// Parser-boundary variants (unknown command, usage errors, binding
/// failures) are reported straight to stderr. Handler failures arrive
/// either as [`CliError::Handled`], once the configured exception handler
/// has seen them, or as [`CliError::CommandFailed`] when no handler is set.
#[derive(Error, Debug)]
pub enum CliError {
    /// The command token does not name a registered command.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// The underlying parser rejected the argument vector.
    #[error("{0}")]
    Parse(#[from] clap::Error),

    /// A signature or flag text could not be understood.
    #[error("invalid signature '{signature}': {reason}")]
    InvalidSignature {
        /// The offending signature text
        signature: String,
        /// Why it was rejected
        reason: String,
    },

    /// A resolved value could not be bound onto a command field.
    #[error("invalid value for '{arg}': {reason}")]
    InvalidArgument {
        /// Field or argument name
        arg: String,
        /// Conversion failure details
        reason: String,
    },

    /// The handler failed and no exception handler was configured.
    #[error("{0}")]
    CommandFailed(#[source] CommandError),

    /// The handler failed and the exception handler has been notified.
    #[error("command failed: {0}")]
    Handled(#[source] CommandError),

    /// The application bootstrapper was missing or failed.
    #[error("failed to bootstrap application: {0}")]
    Bootstrap(String),

    /// A child process could not be spawned or awaited.
    #[error("failed to run '{}': {details}", .entrypoint.display())]
    ChildProcess {
        /// Entrypoint that was being executed
        entrypoint: PathBuf,
        /// Underlying failure
        details: String,
    },

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Errors returned by command handlers.
#[derive(Error, Debug)]
pub enum CommandError {
    /// A handler rejected one of its inputs.
    #[error("invalid value for '{arg}': {reason}")]
    InvalidArgument {
        /// Argument name
        arg: String,
        /// Reason why it was rejected
        reason: String,
    },

    /// A handler failed with a plain message.
    #[error("{0}")]
    Failed(String),

    /// An I/O operation inside the handler failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Any other error produced by the handler.
    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl CommandError {
    /// Creates a [`CommandError::Failed`] from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        CommandError::Failed(message.into())
    }
}

/// Outcome of a command handler.
pub type HandlerResult = Result<(), CommandError>;

/// What a successful parse did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A command handler ran to completion.
    Dispatched {
        /// Name of the command that ran
        command: String,
    },

    /// Help was requested; the rendered text is returned for printing.
    Help(String),

    /// The version flag was passed.
    Version(String),
}

/// Per-parse resolved state.
///
/// Created once per parse call and consumed by the dispatch engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationContext {
    /// The raw argument vector, program name first.
    pub argv: Vec<String>,
    /// Name of the matched command.
    pub command: String,
    /// One value per argument descriptor, followed by any excess values.
    pub positionals: Vec<Value>,
    /// Resolved option values, globals included.
    pub options: OptionValues,
}
