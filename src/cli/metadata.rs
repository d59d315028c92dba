use std::{any::TypeId, collections::HashMap};

use serde_json::Value;

use super::{
    CliError,
    signature::{FlagSpec, FlagValue, Placeholder, camel_case, kebab_case},
};

/// Stable identity of a command definition.
///
/// Class commands are keyed by their Rust type; route commands get a
/// synthesized identity when they are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKey {
    /// A type implementing [`Command`](super::Command).
    Type(TypeId),
    /// A function-based route.
    Route(u64),
}

impl CommandKey {
    /// Key for the command type `T`.
    pub fn of<T: 'static>() -> Self {
        CommandKey::Type(TypeId::of::<T>())
    }
}

/// Declaration-time description of one positional argument.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDescriptor {
    /// Target field on the command.
    pub key: String,
    /// Name the parser exposes the value under (camelCase).
    pub signature_name: String,
    /// Normalized pattern, e.g. `<name>` or `[files...]`.
    pub signature: String,
    /// Whether the argument must be supplied.
    pub required: bool,
    /// Whether the argument swallows all remaining values.
    pub variadic: bool,
    /// Value used when the argument is omitted.
    pub default: Option<Value>,
    /// Help text.
    pub description: String,
}

/// Declaration-time description of one flag.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDescriptor {
    /// Target field on the command.
    pub key: String,
    /// Key in the resolved option map (camelCase, `no-` stripped).
    pub signature_name: String,
    /// Raw flag text as declared, e.g. `-l, --loud`.
    pub signature: String,
    /// Parsed form of [`signature`](Self::signature).
    pub flag: FlagSpec,
    /// Accepted by every command, not only the declaring one.
    pub is_global: bool,
    /// Value used when the flag is omitted.
    pub default: Option<Value>,
    /// Help text.
    pub description: String,
}

impl OptionDescriptor {
    /// Value the option resolves to when it is not passed.
    ///
    /// A declared default always wins; otherwise switches resolve to
    /// `false`, negated switches to `true` and valued flags to `null`.
    pub fn resolved_default(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }

        match self.flag.value {
            FlagValue::Switch => Value::Bool(self.flag.negated),
            FlagValue::Required { .. } | FlagValue::Optional => Value::Null,
        }
    }
}

/// Options accepted when declaring an argument.
#[derive(Debug, Clone, Default)]
pub struct ArgumentOptions {
    signature: Option<String>,
    required: Option<bool>,
    default: Option<Value>,
    description: Option<String>,
}

impl ArgumentOptions {
    /// Empty options: required, named after the field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pattern such as `<name>`, `[name]` or `files...`.
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Overrides whether the argument is required.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Default value; makes the argument optional.
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Help text.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Options accepted when declaring a flag.
#[derive(Debug, Clone, Default)]
pub struct OptionOptions {
    signature: Option<String>,
    is_global: bool,
    default: Option<Value>,
    description: Option<String>,
}

impl OptionOptions {
    /// Empty options: `--<field>` switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag text such as `-l, --loud` or `--out <dir>`.
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Makes the flag available to every command.
    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }

    /// Value used when the flag is omitted.
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Help text.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Per-command ordered descriptor lists.
///
/// Descriptors are appended in declaration order and never deduplicated:
/// two descriptors for the same key are both kept and the later one wins
/// when values are bound.
#[derive(Debug, Default)]
pub struct MetadataStore {
    arguments: HashMap<CommandKey, Vec<ArgumentDescriptor>>,
    options: HashMap<CommandKey, Vec<OptionDescriptor>>,
}

impl MetadataStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an argument descriptor for `key` and appends it.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the pattern is malformed
    pub fn set_argument(
        &mut self,
        command: CommandKey,
        key: &str,
        options: ArgumentOptions,
    ) -> Result<ArgumentDescriptor, CliError> {
        let descriptor = Self::argument_descriptor(key, options)?;

        self.arguments
            .entry(command)
            .or_default()
            .push(descriptor.clone());

        Ok(descriptor)
    }

    /// Builds an option descriptor for `key` and appends it.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the flag text is malformed
    pub fn set_option(
        &mut self,
        command: CommandKey,
        key: &str,
        options: OptionOptions,
    ) -> Result<OptionDescriptor, CliError> {
        let descriptor = Self::option_descriptor(key, options)?;

        self.options
            .entry(command)
            .or_default()
            .push(descriptor.clone());

        Ok(descriptor)
    }

    /// Replaces the first argument exposed under the same signature name.
    ///
    /// Returns `false` (and changes nothing) when there is no such argument.
    pub fn replace_argument(&mut self, command: CommandKey, descriptor: ArgumentDescriptor) -> bool {
        let existing = self.arguments.get_mut(&command).and_then(|arguments| {
            arguments
                .iter_mut()
                .find(|argument| argument.signature_name == descriptor.signature_name)
        });

        match existing {
            Some(slot) => {
                *slot = descriptor;
                true
            }
            None => false,
        }
    }

    /// Argument descriptors in declaration order; empty when none.
    pub fn arguments(&self, command: CommandKey) -> &[ArgumentDescriptor] {
        self.arguments
            .get(&command)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Option descriptors in declaration order; empty when none.
    pub fn options(&self, command: CommandKey) -> &[OptionDescriptor] {
        self.options
            .get(&command)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Forgets every descriptor of a command.
    pub fn remove(&mut self, command: CommandKey) {
        self.arguments.remove(&command);
        self.options.remove(&command);
    }

    /// Builds an argument descriptor without storing it.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the pattern is malformed
    pub fn argument_descriptor(
        key: &str,
        options: ArgumentOptions,
    ) -> Result<ArgumentDescriptor, CliError> {
        let pattern = options.signature.unwrap_or_else(|| key.to_string());
        let placeholder = Placeholder::argument(&pattern)?;

        let required = match options.default {
            Some(_) => false,
            None => options
                .required
                .or(placeholder.required)
                .unwrap_or(true),
        };

        let ellipsis = if placeholder.variadic { "..." } else { "" };
        let signature = if required {
            format!("<{}{ellipsis}>", placeholder.name)
        } else {
            format!("[{}{ellipsis}]", placeholder.name)
        };

        Ok(ArgumentDescriptor {
            key: key.to_string(),
            signature_name: camel_case(&placeholder.name),
            signature,
            required,
            variadic: placeholder.variadic,
            default: options.default,
            description: options.description.unwrap_or_default(),
        })
    }

    /// Builds an option descriptor without storing it.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the flag text is malformed
    pub fn option_descriptor(
        key: &str,
        options: OptionOptions,
    ) -> Result<OptionDescriptor, CliError> {
        let signature = options
            .signature
            .unwrap_or_else(|| format!("--{}", kebab_case(key)));
        let flag = FlagSpec::parse(&signature)?;

        Ok(OptionDescriptor {
            key: key.to_string(),
            signature_name: flag.signature_name(),
            signature,
            flag,
            is_global: options.is_global,
            default: options.default,
            description: options.description.unwrap_or_default(),
        })
    }
}
