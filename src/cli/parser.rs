use std::collections::HashMap;

use clap::{Arg, ArgAction, ArgMatches, parser::ValueSource, value_parser};
use serde_json::Value;
use tracing::debug;

use super::{
    CliError, OptionValues,
    metadata::{ArgumentDescriptor, CommandKey, OptionDescriptor},
    signature::{CommandSignature, FlagValue},
};

/// Id of the hidden positional that collects excess values.
pub const EXTRA_ARGS: &str = "extra:args";

/// Parser id of a positional argument.
pub fn argument_id(signature_name: &str) -> String {
    format!("arg:{signature_name}")
}

/// Parser id of a flag.
pub fn option_id(signature_name: &str) -> String {
    format!("opt:{signature_name}")
}

/// Owns one `clap::Command` node per registered command.
///
/// A node is created the first time a command is seen and every later
/// descriptor for that command is added to the same node. Nodes are
/// cloned into a fresh root on every parse, so the bridge never holds a
/// half-built parser.
#[derive(Debug, Default)]
pub struct ParserBridge {
    nodes: HashMap<CommandKey, clap::Command>,
}

impl ParserBridge {
    /// Creates a bridge with no nodes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the node for `key`, creating it from the signature once.
    ///
    /// Later calls for the same key return the cached node untouched, even
    /// if a different signature or description is passed.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the node has to be created
    /// and the signature is malformed
    pub fn get_or_create_node(
        &mut self,
        key: CommandKey,
        signature: &str,
        description: &str,
    ) -> Result<&mut clap::Command, CliError> {
        if !self.nodes.contains_key(&key) {
            let parsed = CommandSignature::parse(signature)?;
            debug!(command = %parsed.name, "Creating parser node");

            let node = clap::Command::new(parsed.name)
                .about(description.to_string())
                .disable_help_flag(true)
                .disable_version_flag(true);
            self.nodes.insert(key, node);
        }

        self.nodes
            .get_mut(&key)
            .ok_or_else(|| CliError::InvalidSignature {
                signature: signature.to_string(),
                reason: "parser node unavailable".to_string(),
            })
    }

    /// Returns the node for `key` if one was created.
    pub fn node(&self, key: CommandKey) -> Option<&clap::Command> {
        self.nodes.get(&key)
    }

    /// Drops the node for `key`.
    pub fn remove(&mut self, key: CommandKey) {
        self.nodes.remove(&key);
    }

    /// Replaces the help text of an existing node.
    pub fn set_about(&mut self, key: CommandKey, description: &str) {
        if let Some(node) = self.nodes.get_mut(&key) {
            let about = description.to_string();
            update(node, |node| node.about(about));
        }
    }

    /// Adds a positional for the descriptor.
    ///
    /// A positional with the same signature name is updated in place
    /// instead of being declared twice.
    pub fn add_argument(&mut self, key: CommandKey, descriptor: &ArgumentDescriptor) {
        let Some(node) = self.nodes.get_mut(&key) else {
            return;
        };

        let id = argument_id(&descriptor.signature_name);
        if has_arg(node, &id) {
            let required = descriptor.required;
            let help = descriptor.description.clone();
            update(node, |node| {
                node.mut_arg(id, |arg| arg.required(required).help(help))
            });
            return;
        }

        let arg = positional_arg(descriptor);
        update(node, |node| node.arg(arg));
    }

    /// Adds a flag for the descriptor unless one with the same id exists.
    pub fn add_option(&mut self, key: CommandKey, descriptor: &OptionDescriptor) {
        let Some(node) = self.nodes.get_mut(&key) else {
            return;
        };

        if has_arg(node, &option_id(&descriptor.signature_name)) {
            debug!(option = %descriptor.signature_name, "Option already declared, keeping first flag");
            return;
        }

        let arg = flag_arg(descriptor);
        update(node, |node| node.arg(arg));
    }

    /// Clone of the node ready to be mounted under a root.
    ///
    /// Commands without a variadic positional get a hidden catch-all so
    /// excess values reach the handler instead of failing the parse.
    pub fn finalized(&self, key: CommandKey) -> Option<clap::Command> {
        let node = self.nodes.get(&key)?.clone();

        let has_variadic = node.get_positionals().any(|arg| {
            arg.get_num_args()
                .is_some_and(|range| range.max_values() > 1)
        });

        if has_variadic {
            return Some(node);
        }

        Some(
            node.arg(
                Arg::new(EXTRA_ARGS)
                    .num_args(1..)
                    .action(ArgAction::Append)
                    .value_parser(value_parser!(String))
                    .required(false)
                    .hide(true),
            ),
        )
    }
}

/// Builds the parser flag for an option descriptor.
pub fn flag_arg(descriptor: &OptionDescriptor) -> Arg {
    let mut arg = Arg::new(option_id(&descriptor.signature_name))
        .help(descriptor.description.clone())
        .required(false);

    if let Some(long) = &descriptor.flag.long {
        arg = arg.long(long.clone());
    }

    if let Some(short) = descriptor.flag.short {
        arg = arg.short(short);
    }

    match descriptor.flag.value {
        FlagValue::Switch => arg.action(ArgAction::SetTrue),
        FlagValue::Required { variadic: false } => arg
            .action(ArgAction::Set)
            .num_args(1)
            .value_name(descriptor.signature_name.clone())
            .value_parser(value_parser!(String)),
        FlagValue::Required { variadic: true } => arg
            .action(ArgAction::Append)
            .num_args(1..)
            .value_name(descriptor.signature_name.clone())
            .value_parser(value_parser!(String)),
        FlagValue::Optional => arg
            .action(ArgAction::Set)
            .num_args(0..=1)
            .value_name(descriptor.signature_name.clone())
            .value_parser(value_parser!(String)),
    }
}

fn positional_arg(descriptor: &ArgumentDescriptor) -> Arg {
    let arg = Arg::new(argument_id(&descriptor.signature_name))
        .value_name(descriptor.signature_name.clone())
        .help(descriptor.description.clone())
        .required(descriptor.required)
        .value_parser(value_parser!(String));

    if descriptor.variadic {
        arg.num_args(1..).action(ArgAction::Append)
    } else {
        arg.action(ArgAction::Set)
    }
}

/// Resolves one value per argument descriptor, then any excess values.
///
/// Omitted arguments resolve to their default, or `null` (`[]` for
/// variadic arguments).
pub fn resolve_arguments(matches: &ArgMatches, descriptors: &[ArgumentDescriptor]) -> Vec<Value> {
    let mut values: Vec<Value> = descriptors
        .iter()
        .map(|descriptor| {
            let raw = strings(matches, &argument_id(&descriptor.signature_name));

            match (raw, &descriptor.default) {
                (Some(raw), _) if descriptor.variadic => {
                    Value::Array(raw.into_iter().map(Value::String).collect())
                }
                (Some(raw), _) if !raw.is_empty() => raw
                    .into_iter()
                    .next()
                    .map(Value::String)
                    .unwrap_or(Value::Null),
                (_, Some(default)) => default.clone(),
                (_, None) if descriptor.variadic => Value::Array(Vec::new()),
                (_, None) => Value::Null,
            }
        })
        .collect();

    if let Some(extra) = strings(matches, EXTRA_ARGS) {
        values.extend(extra.into_iter().map(Value::String));
    }

    values
}

/// Resolves every descriptor into `resolved`, keyed by signature name.
///
/// Values not given on the command line fall back to
/// [`OptionDescriptor::resolved_default`].
pub fn resolve_options(
    matches: &ArgMatches,
    descriptors: &[OptionDescriptor],
    resolved: &mut OptionValues,
) {
    for descriptor in descriptors {
        resolved.insert(
            descriptor.signature_name.clone(),
            resolve_option(matches, descriptor),
        );
    }
}

fn resolve_option(matches: &ArgMatches, descriptor: &OptionDescriptor) -> Value {
    let id = option_id(&descriptor.signature_name);

    let passed = matches
        .try_contains_id(&id)
        .unwrap_or(false)
        && matches.value_source(&id) == Some(ValueSource::CommandLine);

    if !passed {
        return descriptor.resolved_default();
    }

    match descriptor.flag.value {
        FlagValue::Switch => Value::Bool(!descriptor.flag.negated),
        FlagValue::Required { variadic: true } => Value::Array(
            strings(matches, &id)
                .unwrap_or_default()
                .into_iter()
                .map(Value::String)
                .collect(),
        ),
        FlagValue::Required { variadic: false } => strings(matches, &id)
            .and_then(|values| values.into_iter().next())
            .map(Value::String)
            .unwrap_or(Value::Null),
        FlagValue::Optional => strings(matches, &id)
            .and_then(|values| values.into_iter().next())
            .map(Value::String)
            .unwrap_or(Value::Bool(true)),
    }
}

pub(crate) fn strings(matches: &ArgMatches, id: &str) -> Option<Vec<String>> {
    matches
        .try_get_many::<String>(id)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
}

fn has_arg(node: &clap::Command, id: &str) -> bool {
    node.get_arguments().any(|arg| arg.get_id() == id)
}

fn update(node: &mut clap::Command, f: impl FnOnce(clap::Command) -> clap::Command) {
    let current = std::mem::take(node);
    *node = f(current);
}
