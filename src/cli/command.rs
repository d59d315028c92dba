use std::{collections::HashMap, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    CliError, HandlerResult, OptionValues,
    dispatch::{BindTarget, Binding, Dispatchable},
    metadata::{ArgumentDescriptor, ArgumentOptions, OptionDescriptor, OptionOptions},
};

/// A class-style command: a named, described unit with declared fields
/// and a `handle` entry point.
///
/// A fresh `Default` instance is created for every invocation, its fields
/// are bound from the parsed values and then `handle` runs.
///
/// ```rust,no_run
/// use artisan::cli::{ArgumentOptions, Command, Declaration, HandlerResult, OptionOptions};
/// use async_trait::async_trait;
/// use serde_json::Value;
///
/// #[derive(Default)]
/// struct Greet {
///     name: String,
///     loud: bool,
/// }
///
/// #[async_trait]
/// impl Command for Greet {
///     fn signature() -> &'static str {
///         "greet"
///     }
///
///     fn declare(declaration: &mut Declaration<Self>) {
///         declaration
///             .argument("name", ArgumentOptions::new(), |greet: &mut Self, name| greet.name = name)
///             .option("loud", OptionOptions::new(), |greet: &mut Self, loud| greet.loud = loud);
///     }
///
///     async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
///         println!("Hello, {}", self.name);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Command: Default + Send + Sync + 'static {
    /// Name plus optional placeholders, e.g. `make:controller <name>`.
    fn signature() -> &'static str;

    /// One-line description shown in help.
    fn description() -> &'static str {
        ""
    }

    /// Declares arguments and options together with their field setters.
    fn declare(_declaration: &mut Declaration<Self>) {}

    /// Runs the command. `extra` holds positionals not bound to a field.
    async fn handle(&mut self, extra: Vec<Value>) -> HandlerResult;
}

type Setter<T> = Box<dyn Fn(&mut T, Value) -> Result<(), String> + Send + Sync>;

/// Field key to typed setter map for one command type.
pub struct Binder<T> {
    setters: HashMap<String, Setter<T>>,
}

impl<T> Default for Binder<T> {
    fn default() -> Self {
        Self {
            setters: HashMap::new(),
        }
    }
}

impl<T> Binder<T> {
    fn insert<V, F>(&mut self, key: &str, setter: F)
    where
        V: DeserializeOwned,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.setters.insert(
            key.to_string(),
            Box::new(move |target, value| {
                let converted = coerce::<V>(value).map_err(|e| e.to_string())?;
                setter(target, converted);
                Ok(())
            }),
        );
    }

    /// Whether a setter is declared for `key`.
    pub fn has(&self, key: &str) -> bool {
        self.setters.contains_key(key)
    }

    /// Converts `value` and assigns it through the setter for `key`.
    ///
    /// Returns `Ok(false)` when no setter exists. A `null` value (omitted
    /// optional argument, unpassed valued flag) leaves the field at its
    /// default.
    ///
    /// # Errors
    /// Returns `CliError::InvalidArgument` if the value cannot be converted
    pub fn set(&self, target: &mut T, key: &str, value: Value) -> Result<bool, CliError> {
        let Some(setter) = self.setters.get(key) else {
            return Ok(false);
        };

        if value.is_null() {
            return Ok(true);
        }

        setter(target, value).map_err(|reason| CliError::InvalidArgument {
            arg: key.to_string(),
            reason,
        })?;

        Ok(true)
    }
}

/// Converts a parsed value into a field type.
///
/// Command-line values arrive as strings, so a string that does not fit
/// directly is parsed as JSON (`"42"` becomes a number). Arrays are
/// retried element by element the same way.
pub fn coerce<V: DeserializeOwned>(value: Value) -> Result<V, serde_json::Error> {
    match serde_json::from_value::<V>(value.clone()) {
        Ok(converted) => Ok(converted),
        Err(error) => {
            let retried = match value {
                Value::String(text) => serde_json::from_str::<V>(&text).ok(),
                Value::Array(items) => serde_json::from_value::<V>(Value::Array(
                    items.into_iter().map(reparse).collect(),
                ))
                .ok(),
                _ => None,
            };

            retried.ok_or(error)
        }
    }
}

fn reparse(value: Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

/// Collects the declarations made in [`Command::declare`].
pub struct Declaration<T> {
    arguments: Vec<(String, ArgumentOptions)>,
    options: Vec<(String, OptionOptions)>,
    binder: Binder<T>,
}

impl<T> Default for Declaration<T> {
    fn default() -> Self {
        Self {
            arguments: Vec::new(),
            options: Vec::new(),
            binder: Binder::default(),
        }
    }
}

/// Argument and option declarations in order, plus the binder built from them.
pub type DeclaredParts<T> = (
    Vec<(String, ArgumentOptions)>,
    Vec<(String, OptionOptions)>,
    Binder<T>,
);

impl<T> Declaration<T> {
    /// Declares a positional argument bound to field `key`.
    pub fn argument<V, F>(&mut self, key: &str, options: ArgumentOptions, setter: F) -> &mut Self
    where
        V: DeserializeOwned,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.arguments.push((key.to_string(), options));
        self.binder.insert(key, setter);
        self
    }

    /// Declares a flag bound to field `key`.
    pub fn option<V, F>(&mut self, key: &str, options: OptionOptions, setter: F) -> &mut Self
    where
        V: DeserializeOwned,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.options.push((key.to_string(), options));
        self.binder.insert(key, setter);
        self
    }

    /// Splits the declaration into its parts.
    pub fn into_parts(self) -> DeclaredParts<T> {
        (self.arguments, self.options, self.binder)
    }
}

/// Dispatch adapter for a [`Command`] type.
pub struct ClassCommand<T> {
    binder: Arc<Binder<T>>,
    _command: PhantomData<fn() -> T>,
}

impl<T: Command> ClassCommand<T> {
    /// Wraps the binder produced by `T::declare`.
    pub fn new(binder: Binder<T>) -> Self {
        Self {
            binder: Arc::new(binder),
            _command: PhantomData,
        }
    }
}

impl<T: Command> Dispatchable for ClassCommand<T> {
    fn create_target(&self) -> Box<dyn BindTarget> {
        Box::new(ClassTarget {
            instance: T::default(),
            binder: Arc::clone(&self.binder),
        })
    }
}

struct ClassTarget<T> {
    instance: T,
    binder: Arc<Binder<T>>,
}

#[async_trait]
impl<T: Command> BindTarget for ClassTarget<T> {
    fn bind_argument(
        &mut self,
        descriptor: &ArgumentDescriptor,
        value: Value,
    ) -> Result<Binding, CliError> {
        if !self.binder.has(&descriptor.key) {
            return Ok(Binding::Unclaimed(value));
        }

        self.binder
            .set(&mut self.instance, &descriptor.key, value)?;
        Ok(Binding::Field)
    }

    fn bind_option(
        &mut self,
        descriptor: &OptionDescriptor,
        value: Value,
    ) -> Result<(), CliError> {
        self.binder
            .set(&mut self.instance, &descriptor.key, value)?;
        Ok(())
    }

    async fn handle(self: Box<Self>, extra: Vec<Value>, _options: OptionValues) -> HandlerResult {
        let mut instance = self.instance;
        instance.handle(extra).await
    }
}
