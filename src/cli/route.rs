use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use futures::{FutureExt, future::BoxFuture};
use serde_json::Value;

use super::{
    CliError, CommandRegistry, HandlerResult, OptionValues,
    dispatch::{BindTarget, Binding, Dispatchable},
    metadata::{ArgumentDescriptor, ArgumentOptions, CommandKey, OptionDescriptor, OptionOptions},
    settings::{CommandSettings, SettingsResolver},
    signature::{FlagSpec, Placeholder, camel_case},
};

type RouteHandler =
    dyn Fn(Vec<Value>, OptionValues) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// A plain function registered as a command.
///
/// Every positional reaches the function in declaration order, followed by
/// any excess values, together with the resolved option map.
pub struct RouteCommand {
    handler: Arc<RouteHandler>,
}

impl RouteCommand {
    /// Wraps an async function.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Vec<Value>, OptionValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |arguments, options| handler(arguments, options).boxed()),
        }
    }
}

impl Dispatchable for RouteCommand {
    fn create_target(&self) -> Box<dyn BindTarget> {
        Box::new(RouteTarget {
            handler: Arc::clone(&self.handler),
        })
    }
}

struct RouteTarget {
    handler: Arc<RouteHandler>,
}

#[async_trait]
impl BindTarget for RouteTarget {
    fn bind_argument(&mut self, _: &ArgumentDescriptor, value: Value) -> Result<Binding, CliError> {
        Ok(Binding::Unclaimed(value))
    }

    fn bind_option(&mut self, _: &OptionDescriptor, _: Value) -> Result<(), CliError> {
        Ok(())
    }

    async fn handle(self: Box<Self>, extra: Vec<Value>, options: OptionValues) -> HandlerResult {
        (self.handler)(extra, options).await
    }
}

/// Fluent declarations for a command registered with `route`.
///
/// The command is live as soon as the builder exists; every method
/// extends it in place.
pub struct RouteBuilder<'a> {
    registry: &'a mut CommandRegistry,
    settings: &'a mut SettingsResolver,
    key: CommandKey,
}

impl<'a> RouteBuilder<'a> {
    pub(crate) fn new(
        registry: &'a mut CommandRegistry,
        settings: &'a mut SettingsResolver,
        key: CommandKey,
    ) -> Self {
        Self {
            registry,
            settings,
            key,
        }
    }

    /// Key of the underlying command.
    pub fn key(&self) -> CommandKey {
        self.key
    }

    /// Sets the help description.
    ///
    /// # Errors
    /// Returns `CliError::UnknownCommand` if the route was replaced meanwhile
    pub fn description(self, description: &str) -> Result<Self, CliError> {
        self.registry.set_description(self.key, description)?;
        Ok(self)
    }

    /// Declares a positional, e.g. `.argument("[greeting]", ...)`.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the pattern is malformed
    pub fn argument(self, signature: &str, options: ArgumentOptions) -> Result<Self, CliError> {
        let placeholder = Placeholder::argument(signature)?;
        let key = camel_case(&placeholder.name);

        self.registry
            .add_argument(self.key, &key, options.signature(signature))?;
        Ok(self)
    }

    /// Declares a flag, e.g. `.option("-l, --loud", ...)`.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the flag text is malformed
    pub fn option(self, signature: &str, options: OptionOptions) -> Result<Self, CliError> {
        let key = FlagSpec::parse(signature)?.signature_name();

        self.registry
            .add_option(self.key, &key, options.signature(signature))?;
        Ok(self)
    }

    /// Overrides the command's settings record.
    ///
    /// # Errors
    /// Returns `CliError::UnknownCommand` if the route was replaced meanwhile
    pub fn settings(self, settings: CommandSettings) -> Result<Self, CliError> {
        let name = self.registry.name_of(self.key)?;
        self.settings.set(&name, &settings);
        Ok(self)
    }
}
