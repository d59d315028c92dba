//! Declarative command registration and dispatch.
//!
//! Commands are either types implementing [`Command`] or plain async
//! functions registered as routes. Both share one path: their declared
//! arguments and options are stored as descriptors, turned into parser
//! nodes, and on dispatch the resolved values are bound onto a fresh
//! target before its handler runs.

mod child;
mod command;
pub mod commands;
mod dispatch;
pub mod formatting;
mod help;
mod metadata;
mod parser;
mod registry;
mod route;
mod settings;
mod signature;
mod types;

#[cfg(test)]
mod tests;

pub use child::{ChildInvoker, ChildOutput};
pub use command::{Binder, ClassCommand, Command, Declaration, coerce};
pub use dispatch::{BindTarget, Binding, DispatchEngine, Dispatchable, ExceptionHandler};
pub use help::HelpFormatter;
pub use metadata::{
    ArgumentDescriptor, ArgumentOptions, CommandKey, MetadataStore, OptionDescriptor,
    OptionOptions,
};
pub use parser::ParserBridge;
pub use registry::{CommandInfo, CommandRegistry, DEFAULT_VERSION};
pub use route::{RouteBuilder, RouteCommand};
pub use settings::{Bootstrapper, CommandSettings, ExitDecision, SettingsResolver};
pub use signature::{CommandSignature, FlagSpec, FlagValue, Placeholder};
pub use types::{
    CliError, CommandError, HandlerResult, InvocationContext, OptionValues, ParseOutcome,
};
