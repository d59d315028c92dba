use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use tracing::debug;

use super::{
    CliError, CommandError, HandlerResult, InvocationContext, OptionValues,
    metadata::{ArgumentDescriptor, OptionDescriptor},
};

/// What a target did with a positional value.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// The value was assigned to a field.
    Field,
    /// The target has no field for the value; it is passed to `handle`.
    Unclaimed(Value),
}

/// A freshly created command instance that values can be bound onto.
#[async_trait]
pub trait BindTarget: Send {
    /// Assigns a positional value to the field named by `descriptor.key`.
    ///
    /// # Errors
    /// Returns `CliError::InvalidArgument` if the value cannot be converted
    fn bind_argument(
        &mut self,
        descriptor: &ArgumentDescriptor,
        value: Value,
    ) -> Result<Binding, CliError>;

    /// Assigns a resolved option value to the field named by `descriptor.key`.
    ///
    /// # Errors
    /// Returns `CliError::InvalidArgument` if the value cannot be converted
    fn bind_option(&mut self, descriptor: &OptionDescriptor, value: Value) -> Result<(), CliError>;

    /// Runs the command with the unbound positionals.
    async fn handle(self: Box<Self>, extra: Vec<Value>, options: OptionValues) -> HandlerResult;
}

/// Anything the registry can create dispatch targets from.
pub trait Dispatchable: Send + Sync {
    /// Creates a new, unbound target for one invocation.
    fn create_target(&self) -> Box<dyn BindTarget>;
}

/// Receives handler failures before they are reported.
#[async_trait]
pub trait ExceptionHandler: Send + Sync {
    /// Called with the original error of a failed handler.
    async fn handle(&self, error: &CommandError);
}

/// Binds resolved values onto targets and starts their handler.
pub struct DispatchEngine;

impl DispatchEngine {
    /// Binds positionals in declaration order, then every option.
    ///
    /// Returns the values that reach `handle` directly: unclaimed
    /// positionals first, then everything beyond the declared arguments.
    ///
    /// # Errors
    /// Returns `CliError::InvalidArgument` if any value fails to bind
    pub fn bind(
        target: &mut dyn BindTarget,
        arguments: &[ArgumentDescriptor],
        options: &[OptionDescriptor],
        context: &InvocationContext,
    ) -> Result<Vec<Value>, CliError> {
        let mut positionals = context.positionals.iter().cloned();
        let mut extra = Vec::new();

        for descriptor in arguments {
            let value = positionals.next().unwrap_or(Value::Null);

            if let Binding::Unclaimed(value) = target.bind_argument(descriptor, value)? {
                extra.push(value);
            }
        }

        extra.extend(positionals);

        for descriptor in options {
            let value = context
                .options
                .get(&descriptor.signature_name)
                .cloned()
                .unwrap_or(Value::Null);

            target.bind_option(descriptor, value)?;
        }

        debug!(
            command = %context.command,
            extra = extra.len(),
            "Bound invocation values"
        );

        Ok(extra)
    }

    /// Binds `target` and returns its pending handler.
    ///
    /// Binding happens before this returns; only the handler itself runs
    /// when the future is awaited.
    ///
    /// # Errors
    /// Returns `CliError::InvalidArgument` if any value fails to bind
    pub fn dispatch(
        mut target: Box<dyn BindTarget>,
        arguments: &[ArgumentDescriptor],
        options: &[OptionDescriptor],
        context: &InvocationContext,
    ) -> Result<BoxFuture<'static, HandlerResult>, CliError> {
        let extra = Self::bind(target.as_mut(), arguments, options, context)?;
        let resolved = context.options.clone();

        Ok(target.handle(extra, resolved))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::cli::metadata::{ArgumentOptions, MetadataStore, OptionOptions};

    #[derive(Default)]
    struct Recorder {
        fields: Vec<(String, Value)>,
        claim: bool,
    }

    #[async_trait]
    impl BindTarget for Recorder {
        fn bind_argument(
            &mut self,
            descriptor: &ArgumentDescriptor,
            value: Value,
        ) -> Result<Binding, CliError> {
            if !self.claim {
                return Ok(Binding::Unclaimed(value));
            }
            self.fields.push((descriptor.key.clone(), value));
            Ok(Binding::Field)
        }

        fn bind_option(
            &mut self,
            descriptor: &OptionDescriptor,
            value: Value,
        ) -> Result<(), CliError> {
            self.fields.push((descriptor.key.clone(), value));
            Ok(())
        }

        async fn handle(self: Box<Self>, _: Vec<Value>, _: OptionValues) -> HandlerResult {
            Ok(())
        }
    }

    fn context(positionals: Vec<Value>, options: Value) -> InvocationContext {
        InvocationContext {
            argv: Vec::new(),
            command: "test".to_string(),
            positionals,
            options: options.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn binds_every_descriptor_in_order() {
        let arguments = vec![
            MetadataStore::argument_descriptor("first", ArgumentOptions::new()).unwrap(),
            MetadataStore::argument_descriptor("second", ArgumentOptions::new()).unwrap(),
        ];
        let options = vec![
            MetadataStore::option_descriptor("loud", OptionOptions::new()).unwrap(),
            MetadataStore::option_descriptor(
                "outDir",
                OptionOptions::new().signature("-o, --out-dir <dir>"),
            )
            .unwrap(),
        ];

        let mut target = Recorder {
            claim: true,
            ..Recorder::default()
        };
        let extra = DispatchEngine::bind(
            &mut target,
            &arguments,
            &options,
            &context(
                vec![json!("a"), json!("b"), json!("c")],
                json!({ "loud": true, "outDir": "dist" }),
            ),
        )
        .unwrap();

        assert_eq!(extra, vec![json!("c")]);
        assert_eq!(
            target.fields,
            vec![
                ("first".to_string(), json!("a")),
                ("second".to_string(), json!("b")),
                ("loud".to_string(), json!(true)),
                ("outDir".to_string(), json!("dist")),
            ]
        );
    }

    #[test]
    fn unclaimed_values_come_before_excess() {
        let arguments =
            vec![MetadataStore::argument_descriptor("name", ArgumentOptions::new()).unwrap()];

        let mut target = Recorder::default();
        let extra = DispatchEngine::bind(
            &mut target,
            &arguments,
            &[],
            &context(vec![json!("Ada"), json!("x")], json!({})),
        )
        .unwrap();

        assert_eq!(extra, vec![json!("Ada"), json!("x")]);
        assert!(target.fields.is_empty());
    }

    #[test]
    fn missing_positionals_bind_null() {
        let arguments = vec![
            MetadataStore::argument_descriptor("name", ArgumentOptions::new().signature("[name]"))
                .unwrap(),
        ];

        let mut target = Recorder {
            claim: true,
            ..Recorder::default()
        };
        DispatchEngine::bind(&mut target, &arguments, &[], &context(vec![], json!({}))).unwrap();

        assert_eq!(target.fields, vec![("name".to_string(), Value::Null)]);
    }
}
