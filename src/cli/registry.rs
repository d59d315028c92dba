use std::{
    collections::{BTreeMap, HashMap},
    env,
    future::Future,
    sync::Arc,
};

use clap::{Arg, ArgAction, ArgMatches, value_parser};
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{
    CliError, HandlerResult, InvocationContext, OptionValues, ParseOutcome,
    command::{ClassCommand, Command, Declaration},
    dispatch::{DispatchEngine, Dispatchable, ExceptionHandler},
    help::HelpFormatter,
    metadata::{
        ArgumentDescriptor, ArgumentOptions, CommandKey, MetadataStore, OptionDescriptor,
        OptionOptions,
    },
    parser::{self, ParserBridge},
    route::RouteCommand,
    signature::{CommandSignature, FlagSpec, FlagValue, camel_case},
};

/// Version printed by `-v/--version` when none is configured.
pub const DEFAULT_VERSION: &str = concat!("Artisan Framework v", env!("CARGO_PKG_VERSION"));

const HELP_ID: &str = "help";
const VERSION_ID: &str = "version";

/// Public view of one registered command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandInfo {
    /// Token users type, e.g. `make:controller`.
    pub name: String,
    /// Signature as registered.
    pub signature: String,
    /// Help description.
    pub description: String,
    /// Prefix before the first `:`, if any.
    pub category: Option<String>,
    /// Argument descriptors in declaration order.
    pub arguments: Vec<ArgumentDescriptor>,
    /// Option descriptors in declaration order.
    pub options: Vec<OptionDescriptor>,
}

struct RegisteredCommand {
    key: CommandKey,
    signature: String,
    description: String,
    /// Signature names of placeholders not yet replaced by a declaration.
    implicit: Vec<String>,
    dispatch: Arc<dyn Dispatchable>,
}

/// Every registered command plus the global parser state.
///
/// One registry is created per process and handed to whatever needs it.
/// [`CommandRegistry::reconstruct`] drops all state, which tests use to
/// start from a clean slate.
///
/// # Example Structure
///
/// ```text
/// artisan
/// ├── -h, --help          (global)
/// ├── --env <env>         (global)
/// ├── -v, --version       (once set_version ran)
/// ├── hello <name>
/// ├── make:command <name>
/// └── make:controller <name>
/// ```
pub struct CommandRegistry {
    program: String,
    commands: BTreeMap<String, RegisteredCommand>,
    metadata: MetadataStore,
    bridge: ParserBridge,
    globals: Vec<OptionDescriptor>,
    version: Option<String>,
    help: HelpFormatter,
    exception_handler: Option<Arc<dyn ExceptionHandler>>,
    last_resolved: HashMap<String, OptionValues>,
    next_route: u64,
}

impl CommandRegistry {
    /// Creates a registry whose only option is the global `--env`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            commands: BTreeMap::new(),
            metadata: MetadataStore::new(),
            bridge: ParserBridge::new(),
            globals: vec![env_option()],
            version: None,
            help: HelpFormatter::default(),
            exception_handler: None,
            last_resolved: HashMap::new(),
            next_route: 0,
        }
    }

    /// Drops every command, option, version and handler.
    pub fn reconstruct(&mut self) {
        debug!(program = %self.program, "Reconstructing command registry");
        let help = self.help.clone();
        *self = Self::new(std::mem::take(&mut self.program));
        self.help = help;
    }

    /// Program name used in usage lines.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Registers `-v/--version` unless a version flag already exists.
    pub fn set_version(&mut self, version: Option<&str>) {
        if self.version.is_some() {
            return;
        }

        self.version = Some(version.unwrap_or(DEFAULT_VERSION).to_string());
    }

    /// Replaces the help formatter.
    pub fn set_help_formatter(&mut self, formatter: HelpFormatter) {
        self.help = formatter;
    }

    /// The formatter used for help output.
    pub fn help_formatter(&self) -> &HelpFormatter {
        &self.help
    }

    /// Installs or clears the exception handler.
    pub fn set_exception_handler(&mut self, handler: Option<Arc<dyn ExceptionHandler>>) {
        self.exception_handler = handler;
    }

    /// Registers a class command.
    ///
    /// A command with the same name replaces the earlier registration.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the signature or any declared
    /// pattern is malformed
    pub fn register<T: Command>(&mut self) -> Result<CommandKey, CliError> {
        let key = CommandKey::of::<T>();

        let mut declaration = Declaration::<T>::default();
        T::declare(&mut declaration);
        let (arguments, options, binder) = declaration.into_parts();

        self.insert_command(
            key,
            T::signature(),
            T::description(),
            Arc::new(ClassCommand::<T>::new(binder)),
        )?;

        if let Err(error) = self.declare(key, arguments, options) {
            self.discard(key);
            return Err(error);
        }

        Ok(key)
    }

    fn declare(
        &mut self,
        key: CommandKey,
        arguments: Vec<(String, ArgumentOptions)>,
        options: Vec<(String, OptionOptions)>,
    ) -> Result<(), CliError> {
        for (field, options) in arguments {
            self.add_argument(key, &field, options)?;
        }

        for (field, options) in options {
            self.add_option(key, &field, options)?;
        }

        Ok(())
    }

    fn discard(&mut self, key: CommandKey) {
        self.commands.retain(|_, command| command.key != key);
        self.metadata.remove(key);
        self.bridge.remove(key);
    }

    /// Registers a function as a command.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the signature is malformed
    pub fn register_route<F, Fut>(
        &mut self,
        signature: &str,
        handler: F,
    ) -> Result<CommandKey, CliError>
    where
        F: Fn(Vec<Value>, OptionValues) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let key = CommandKey::Route(self.next_route);
        self.next_route += 1;

        self.insert_command(key, signature, "", Arc::new(RouteCommand::new(handler)))?;
        Ok(key)
    }

    fn insert_command(
        &mut self,
        key: CommandKey,
        signature: &str,
        description: &str,
        dispatch: Arc<dyn Dispatchable>,
    ) -> Result<(), CliError> {
        let parsed = CommandSignature::parse(signature)?;

        if let Some(previous) = self.commands.remove(&parsed.name) {
            warn!(command = %parsed.name, "Command registered twice, last registration wins");
            self.metadata.remove(previous.key);
            self.bridge.remove(previous.key);
        }

        self.bridge.get_or_create_node(key, signature, description)?;

        let mut implicit = Vec::with_capacity(parsed.placeholders.len());
        for placeholder in &parsed.placeholders {
            let descriptor = self.metadata.set_argument(
                key,
                &camel_case(&placeholder.name),
                ArgumentOptions::new().signature(placeholder.pattern()),
            )?;
            self.bridge.add_argument(key, &descriptor);
            implicit.push(descriptor.signature_name);
        }

        debug!(command = %parsed.name, "Registered command");
        self.commands.insert(
            parsed.name,
            RegisteredCommand {
                key,
                signature: signature.to_string(),
                description: description.to_string(),
                implicit,
                dispatch,
            },
        );

        Ok(())
    }

    /// Declares a positional on a registered command.
    ///
    /// A declaration matching a signature placeholder by name replaces that
    /// placeholder in place; anything else is appended.
    ///
    /// # Errors
    /// Returns `CliError::UnknownCommand` if `key` is not registered and
    /// `CliError::InvalidSignature` if the pattern is malformed
    pub fn add_argument(
        &mut self,
        key: CommandKey,
        field: &str,
        options: ArgumentOptions,
    ) -> Result<ArgumentDescriptor, CliError> {
        let command = self
            .commands
            .values_mut()
            .find(|command| command.key == key)
            .ok_or_else(|| unknown_key(key))?;

        let descriptor = MetadataStore::argument_descriptor(field, options.clone())?;

        let replaced = match command
            .implicit
            .iter()
            .position(|name| *name == descriptor.signature_name)
        {
            Some(index) => {
                command.implicit.remove(index);
                self.metadata.replace_argument(key, descriptor.clone())
            }
            None => false,
        };

        if !replaced {
            self.metadata.set_argument(key, field, options)?;
        }

        self.bridge.add_argument(key, &descriptor);
        Ok(descriptor)
    }

    /// Declares a flag on a registered command.
    ///
    /// Global flags are hoisted to the root once per name and accepted by
    /// every command.
    ///
    /// # Errors
    /// Returns `CliError::UnknownCommand` if `key` is not registered and
    /// `CliError::InvalidSignature` if the flag text is malformed or one of
    /// its flags is already taken by `-h/--help`, a global option or another
    /// option of the same command
    pub fn add_option(
        &mut self,
        key: CommandKey,
        field: &str,
        options: OptionOptions,
    ) -> Result<OptionDescriptor, CliError> {
        if !self.commands.values().any(|command| command.key == key) {
            return Err(unknown_key(key));
        }

        let descriptor = MetadataStore::option_descriptor(field, options.clone())?;
        if let Some((flag, owner)) = self.claimed_flag(key, &descriptor) {
            return Err(CliError::InvalidSignature {
                signature: descriptor.signature,
                reason: format!("flag '{flag}' is already used by '{owner}'"),
            });
        }

        self.metadata.set_option(key, field, options)?;
        let hoisted = self
            .globals
            .iter()
            .any(|global| global.signature_name == descriptor.signature_name);

        if descriptor.is_global && !hoisted {
            self.globals.push(descriptor.clone());
        } else if !hoisted {
            self.bridge.add_option(key, &descriptor);
        }

        Ok(descriptor)
    }

    /// First flag of `descriptor` that an option sharing its parser node
    /// already uses, with that option's signature.
    ///
    /// Globals share a node with every command and with `-v/--version` on
    /// the root, so they are checked against all of them.
    fn claimed_flag(
        &self,
        key: CommandKey,
        descriptor: &OptionDescriptor,
    ) -> Option<(String, String)> {
        let mut reserved = vec![("-h, --help", switch('h', "help"))];
        if descriptor.is_global {
            reserved.push(("-v, --version", switch('v', "version")));
        }

        let scope: Vec<&OptionDescriptor> = if descriptor.is_global {
            self.commands
                .values()
                .flat_map(|command| self.metadata.options(command.key))
                .collect()
        } else {
            self.metadata.options(key).iter().collect()
        };

        let taken = self
            .globals
            .iter()
            .chain(scope)
            .filter(|other| other.signature_name != descriptor.signature_name)
            .map(|other| (other.signature.as_str(), &other.flag));

        reserved
            .iter()
            .map(|(owner, flag)| (*owner, flag))
            .chain(taken)
            .find_map(|(owner, flag)| {
                shared_flag(&descriptor.flag, flag).map(|shared| (shared, owner.to_string()))
            })
    }

    /// Sets the help description of a registered command.
    ///
    /// # Errors
    /// Returns `CliError::UnknownCommand` if `key` is not registered
    pub fn set_description(&mut self, key: CommandKey, description: &str) -> Result<(), CliError> {
        let command = self
            .commands
            .values_mut()
            .find(|command| command.key == key)
            .ok_or_else(|| unknown_key(key))?;

        command.description = description.to_string();
        self.bridge.set_about(key, description);
        Ok(())
    }

    /// Name a key is currently registered under.
    ///
    /// # Errors
    /// Returns `CliError::UnknownCommand` if `key` is not registered
    pub fn name_of(&self, key: CommandKey) -> Result<String, CliError> {
        self.commands
            .iter()
            .find(|(_, command)| command.key == key)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| unknown_key(key))
    }

    /// Parses `argv` (program name first) and runs the matched command.
    ///
    /// # Errors
    /// Returns `CliError::Parse` for usage errors, `CliError::UnknownCommand`
    /// for unregistered names, `CliError::InvalidArgument` when a value
    /// cannot be bound, and `CliError::Handled` or `CliError::CommandFailed`
    /// when the handler fails
    #[instrument(skip(self))]
    pub async fn parse(&mut self, argv: &[String]) -> Result<ParseOutcome, CliError> {
        // Checked before parsing so required arguments do not mask help.
        if let Some(target) = self.requested_help(argv) {
            return Ok(ParseOutcome::Help(self.render_help(target)));
        }

        let matches = self.root().try_get_matches_from(argv)?;

        if let Some(version) = &self.version
            && flag(&matches, VERSION_ID)
        {
            return Ok(ParseOutcome::Version(version.clone()));
        }

        let Some((name, sub)) = matches.subcommand() else {
            return Ok(ParseOutcome::Help(self.render_root()));
        };

        let Some(command) = self.commands.get(name) else {
            return self.external(name, sub);
        };

        let key = command.key;
        let dispatch = Arc::clone(&command.dispatch);
        let arguments = self.metadata.arguments(key).to_vec();
        let options = self.metadata.options(key).to_vec();

        let mut resolved = OptionValues::new();
        parser::resolve_options(sub, &self.globals, &mut resolved);
        parser::resolve_options(sub, &options, &mut resolved);
        self.last_resolved.insert(name.to_string(), resolved.clone());

        let context = InvocationContext {
            argv: argv.to_vec(),
            command: name.to_string(),
            positionals: parser::resolve_arguments(sub, &arguments),
            options: resolved,
        };

        debug!(command = %context.command, "Dispatching command");
        let invocation =
            DispatchEngine::dispatch(dispatch.create_target(), &arguments, &options, &context)?;
        self.bind_handler(invocation).await?;

        Ok(ParseOutcome::Dispatched {
            command: context.command,
        })
    }

    /// Awaits a handler and routes its failure to the exception handler.
    ///
    /// # Errors
    /// Returns `CliError::Handled` once a configured handler has seen the
    /// failure, otherwise `CliError::CommandFailed`
    pub async fn bind_handler(
        &self,
        invocation: BoxFuture<'static, HandlerResult>,
    ) -> Result<(), CliError> {
        let Err(error) = invocation.await else {
            return Ok(());
        };

        match &self.exception_handler {
            Some(handler) => {
                handler.handle(&error).await;
                Err(CliError::Handled(error))
            }
            None => Err(CliError::CommandFailed(error)),
        }
    }

    fn external(&self, name: &str, matches: &ArgMatches) -> Result<ParseOutcome, CliError> {
        if name != "help" {
            return Err(CliError::UnknownCommand(name.to_string()));
        }

        let target = parser::strings(matches, "").and_then(|values| values.into_iter().next());
        match target {
            None => Ok(ParseOutcome::Help(self.render_root())),
            Some(target) => match self.commands.get(&target) {
                Some(command) => Ok(ParseOutcome::Help(self.render_command(&target, command))),
                None => Err(CliError::UnknownCommand(target)),
            },
        }
    }

    /// Builds a fresh root parser with every registered command mounted.
    pub fn root(&self) -> clap::Command {
        let mut root = clap::Command::new(self.program.clone())
            .disable_help_flag(true)
            .disable_help_subcommand(true)
            .disable_version_flag(true)
            .allow_external_subcommands(true)
            .external_subcommand_value_parser(value_parser!(String))
            .arg(
                Arg::new(HELP_ID)
                    .short('h')
                    .long("help")
                    .action(ArgAction::SetTrue)
                    .global(true),
            );

        if self.version.is_some() {
            root = root.arg(
                Arg::new(VERSION_ID)
                    .short('v')
                    .long("version")
                    .action(ArgAction::SetTrue),
            );
        }

        for global in &self.globals {
            root = root.arg(parser::flag_arg(global).global(true));
        }

        for command in self.commands.values() {
            if let Some(node) = self.bridge.finalized(command.key) {
                root = root.subcommand(node);
            }
        }

        root
    }

    /// `Some(command)` when `-h/--help` appears before `--`.
    ///
    /// The command is the first token that is neither a flag nor the value
    /// of a valued global such as `--env prod`.
    fn requested_help<'a>(&self, argv: &'a [String]) -> Option<Option<&'a str>> {
        let arguments: Vec<&str> = argv
            .iter()
            .skip(1)
            .map(String::as_str)
            .take_while(|argument| *argument != "--")
            .collect();

        if !arguments
            .iter()
            .any(|argument| *argument == "-h" || *argument == "--help")
        {
            return None;
        }

        let mut tokens = arguments.into_iter();
        while let Some(token) = tokens.next() {
            if !token.starts_with('-') {
                return Some(Some(token));
            }

            if self.takes_value(token) {
                tokens.next();
            }
        }

        Some(None)
    }

    fn takes_value(&self, token: &str) -> bool {
        self.globals.iter().any(|global| {
            global.flag.value != FlagValue::Switch
                && (token
                    .strip_prefix("--")
                    .is_some_and(|long| global.flag.long.as_deref() == Some(long))
                    || global
                        .flag
                        .short
                        .is_some_and(|short| token == format!("-{short}")))
        })
    }

    /// Renders root help.
    pub fn render_root(&self) -> String {
        self.help.render_root(
            &self.program,
            &self.get_commands_info(None),
            &self.globals,
            self.version.is_some(),
        )
    }

    fn render_help(&self, target: Option<&str>) -> String {
        match target.and_then(|name| self.commands.get_key_value(name)) {
            Some((name, command)) => self.render_command(name, command),
            None => self.render_root(),
        }
    }

    fn render_command(&self, name: &str, command: &RegisteredCommand) -> String {
        self.help
            .render_command(&self.program, &self.info(name, command), &self.globals)
    }

    /// Looks a command up by its exact name.
    pub fn get_command(&self, name: &str) -> Option<CommandInfo> {
        self.commands
            .get(name)
            .map(|command| self.info(name, command))
    }

    /// Whether a command with this exact name is registered.
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Names of all registered commands, sorted.
    pub fn get_commands(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    /// All commands, or only those named `<alias>:...`, sorted by name.
    pub fn get_commands_info(&self, alias: Option<&str>) -> Vec<CommandInfo> {
        let prefix = alias.map(|alias| format!("{alias}:"));

        self.commands
            .iter()
            .filter(|(name, _)| {
                prefix
                    .as_deref()
                    .is_none_or(|prefix| name.starts_with(prefix))
            })
            .map(|(name, command)| self.info(name, command))
            .collect()
    }

    /// Declared arguments of a command; empty when unknown.
    pub fn get_command_args(&self, name: &str) -> Vec<ArgumentDescriptor> {
        self.commands
            .get(name)
            .map(|command| self.metadata.arguments(command.key).to_vec())
            .unwrap_or_default()
    }

    /// Declared options of a command; empty when unknown.
    pub fn get_command_opts(&self, name: &str) -> Vec<OptionDescriptor> {
        self.commands
            .get(name)
            .map(|command| self.metadata.options(command.key).to_vec())
            .unwrap_or_default()
    }

    /// Resolved option values of the latest invocation of a command,
    /// globals included. Empty if it never ran.
    pub fn get_command_opts_values(&self, name: &str) -> OptionValues {
        self.last_resolved.get(name).cloned().unwrap_or_default()
    }

    fn info(&self, name: &str, command: &RegisteredCommand) -> CommandInfo {
        CommandInfo {
            name: name.to_string(),
            signature: command.signature.clone(),
            description: command.description.clone(),
            category: name
                .split_once(':')
                .map(|(category, _)| category.to_string()),
            arguments: self.metadata.arguments(command.key).to_vec(),
            options: self.metadata.options(command.key).to_vec(),
        }
    }
}

/// The global `--env <env>` option, defaulting to `APP_ENV` then `NODE_ENV`.
fn env_option() -> OptionDescriptor {
    let default = env::var("APP_ENV")
        .or_else(|_| env::var("NODE_ENV"))
        .ok()
        .map(Value::String);

    OptionDescriptor {
        key: "env".to_string(),
        signature_name: "env".to_string(),
        signature: "--env <env>".to_string(),
        flag: FlagSpec {
            short: None,
            long: Some("env".to_string()),
            value: FlagValue::Required { variadic: false },
            negated: false,
        },
        is_global: true,
        default,
        description: "The environment the command should run under".to_string(),
    }
}

fn switch(short: char, long: &str) -> FlagSpec {
    FlagSpec {
        short: Some(short),
        long: Some(long.to_string()),
        value: FlagValue::Switch,
        negated: false,
    }
}

fn shared_flag(flag: &FlagSpec, other: &FlagSpec) -> Option<String> {
    if let (Some(short), Some(other_short)) = (flag.short, other.short)
        && short == other_short
    {
        return Some(format!("-{short}"));
    }

    match (&flag.long, &other.long) {
        (Some(long), Some(other_long)) if long == other_long => Some(format!("--{long}")),
        _ => None,
    }
}

fn flag(matches: &ArgMatches, id: &str) -> bool {
    matches
        .try_get_one::<bool>(id)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

fn unknown_key(key: CommandKey) -> CliError {
    CliError::UnknownCommand(format!("{key:?}"))
}
