use std::{
    future::Future,
    io::{self, IsTerminal},
    sync::Arc,
};

use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    cli::{
        Bootstrapper, ChildInvoker, ChildOutput, CliError, Command, CommandKey, CommandRegistry,
        ExceptionHandler, ExitDecision, HandlerResult, OptionValues, ParseOutcome, RouteBuilder,
        SettingsResolver,
        commands::register_builtin_commands,
        formatting::{format_banner, format_error},
    },
    config::Config,
};

/// Entry point that wires the registry, settings and exit policy together.
///
/// ```rust,no_run
/// use artisan::{Artisan, cli::ArgumentOptions, config::Config};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let mut artisan = Artisan::new("artisan", Config::default());
///
/// artisan
///     .route("hello", |arguments, _options| async move {
///         println!("Hello, {}", arguments[0]);
///         Ok(())
///     })?
///     .argument("<name>", ArgumentOptions::new())?;
///
/// let argv: Vec<String> = std::env::args().collect();
/// artisan.parse(&argv).await.enforce().await;
/// # Ok(())
/// # }
/// ```
pub struct Artisan {
    config: Config,
    registry: CommandRegistry,
    settings: SettingsResolver,
}

impl Artisan {
    /// Creates an application with no commands.
    ///
    /// `-v/--version` prints `app.version`, or the framework version when
    /// none is configured.
    pub fn new(program: impl Into<String>, config: Config) -> Self {
        let mut registry = CommandRegistry::new(program);
        registry.set_version(config.app.version.as_deref());

        let settings = SettingsResolver::new(&config.rc);

        Self {
            config,
            registry,
            settings,
        }
    }

    /// Loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The command registry.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Mutable access to the command registry.
    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    /// Registers a class command.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if a declaration is malformed
    pub fn register<T: Command>(&mut self) -> Result<CommandKey, CliError> {
        self.registry.register::<T>()
    }

    /// Registers the `config:*` commands.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if a declaration is malformed
    pub fn register_builtin_commands(&mut self) -> Result<(), CliError> {
        register_builtin_commands(&mut self.registry)
    }

    /// Registers an async function as a command and returns its builder.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the signature is malformed
    pub fn route<F, Fut>(&mut self, signature: &str, handler: F) -> Result<RouteBuilder<'_>, CliError>
    where
        F: Fn(Vec<Value>, OptionValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let key = self.registry.register_route(signature, handler)?;
        Ok(RouteBuilder::new(&mut self.registry, &mut self.settings, key))
    }

    /// Routes handler failures to `handler` before they are reported.
    pub fn set_exception_handler(&mut self, handler: impl ExceptionHandler + 'static) {
        self.registry
            .set_exception_handler(Some(Arc::new(handler)));
    }

    /// Installs the bootstrapper fired for `loadApp` commands.
    pub fn set_bootstrapper(&mut self, bootstrapper: impl Bootstrapper + 'static) {
        self.settings.set_bootstrapper(Arc::new(bootstrapper));
    }

    /// Runs a command string in this process.
    ///
    /// No settings are applied and nothing is printed; the outcome is
    /// returned as is.
    ///
    /// # Errors
    /// Returns `CliError::InvalidArgument` if the string cannot be split,
    /// otherwise whatever parsing and dispatch return
    pub async fn call(&mut self, command: &str) -> Result<ParseOutcome, CliError> {
        let tokens = shell_words::split(command).map_err(|e| CliError::InvalidArgument {
            arg: command.to_string(),
            reason: e.to_string(),
        })?;

        let argv: Vec<String> = std::iter::once(self.registry.program().to_string())
            .chain(tokens)
            .collect();

        self.registry.parse(&argv).await
    }

    /// Runs a command string in a child copy of the current executable.
    ///
    /// # Errors
    /// Returns `CliError::ChildProcess` if the child cannot be spawned
    pub async fn call_in_child(&self, command: &str) -> Result<ChildOutput, CliError> {
        ChildInvoker::current()?.call(command).await
    }

    /// Applies settings and parses `argv` without printing anything.
    ///
    /// # Errors
    /// Returns `CliError::Bootstrap` if a required bootstrap fails,
    /// otherwise whatever parsing and dispatch return
    pub async fn try_parse(&mut self, argv: &[String]) -> Result<ParseOutcome, CliError> {
        let settings = self.settings.resolve(command_token(argv));
        self.settings.prepare(&settings).await?;

        self.registry.parse(argv).await
    }

    /// Parses `argv`, prints the outcome and decides how the process ends.
    #[instrument(skip(self))]
    pub async fn parse(&mut self, argv: &[String]) -> ExitDecision {
        let settings = self.settings.resolve(command_token(argv));

        if command_token(argv).is_none()
            && let Some(name) = &self.config.app.name
        {
            let colors = self.registry.help_formatter().colors();
            println!("{}\n", format_banner(name, colors));
        }

        let outcome = self.try_parse(argv).await;
        self.report(&outcome);

        let decision = SettingsResolver::exit_decision(&settings, &outcome);
        debug!(?decision, "Parse finished");
        decision
    }

    fn report(&self, outcome: &Result<ParseOutcome, CliError>) {
        match outcome {
            Ok(ParseOutcome::Dispatched { .. }) => {}
            Ok(ParseOutcome::Help(help)) => print!("{help}"),
            Ok(ParseOutcome::Version(version)) => println!("{version}"),
            Err(CliError::Parse(e)) => eprint!("{e}"),
            Err(CliError::Handled(e)) => debug!(error = %e, "Failure reported by exception handler"),
            Err(e) => {
                let message = format!("error: {e}");
                if io::stderr().is_terminal() {
                    eprintln!("{}", format_error(&message));
                } else {
                    eprintln!("{message}");
                }
            }
        }
    }
}

fn command_token(argv: &[String]) -> Option<&str> {
    argv.get(1).map(String::as_str)
}
