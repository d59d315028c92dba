//! Unit tests for CLI module
//!
//! Tests registration, parsing, binding and dispatch through the registry
//! and the facade. Handlers record what they saw into a thread-local so
//! each test observes only its own invocations.
#![allow(clippy::unwrap_used)]

use std::{
    cell::RefCell,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    Artisan,
    cli::{
        ArgumentOptions, CliError, Command, CommandError, CommandRegistry, Declaration,
        ExceptionHandler, HandlerResult, OptionOptions, ParseOutcome,
    },
    config::Config,
};

thread_local! {
    static CAPTURED: RefCell<Vec<Value>> = const { RefCell::new(Vec::new()) };
}

fn capture(value: Value) {
    CAPTURED.with(|captured| captured.borrow_mut().push(value));
}

fn captured() -> Vec<Value> {
    CAPTURED.with(|captured| captured.borrow_mut().drain(..).collect())
}

fn argv(args: &[&str]) -> Vec<String> {
    std::iter::once("artisan")
        .chain(args.iter().copied())
        .map(str::to_string)
        .collect()
}

#[derive(Default)]
struct Hello {
    name: String,
}

#[async_trait]
impl Command for Hello {
    fn signature() -> &'static str {
        "hello <name>"
    }

    fn description() -> &'static str {
        "Greet someone"
    }

    fn declare(declaration: &mut Declaration<Self>) {
        declaration.argument(
            "name",
            ArgumentOptions::new().description("Who to greet"),
            |hello: &mut Self, name| hello.name = name,
        );
    }

    async fn handle(&mut self, extra: Vec<Value>) -> HandlerResult {
        capture(json!({ "name": self.name, "extra": extra }));
        Ok(())
    }
}

#[derive(Default)]
struct Greet {
    loud: bool,
    color: bool,
}

#[async_trait]
impl Command for Greet {
    fn signature() -> &'static str {
        "greet"
    }

    fn declare(declaration: &mut Declaration<Self>) {
        declaration
            .option(
                "loud",
                OptionOptions::new().default_value(false),
                |greet: &mut Self, loud| greet.loud = loud,
            )
            .option(
                "color",
                OptionOptions::new().signature("--no-color"),
                |greet: &mut Self, color| greet.color = color,
            );
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        capture(json!({ "loud": self.loud, "color": self.color }));
        Ok(())
    }
}

#[derive(Default)]
struct Ping;

#[async_trait]
impl Command for Ping {
    fn signature() -> &'static str {
        "ping"
    }

    async fn handle(&mut self, extra: Vec<Value>) -> HandlerResult {
        capture(json!({ "pong": extra }));
        Ok(())
    }
}

#[derive(Default)]
struct Deploy {
    target: String,
    force: bool,
    tags: Vec<String>,
    port: Option<u16>,
}

#[async_trait]
impl Command for Deploy {
    fn signature() -> &'static str {
        "deploy"
    }

    fn declare(declaration: &mut Declaration<Self>) {
        declaration
            .argument(
                "target",
                ArgumentOptions::new().signature("<target>"),
                |deploy: &mut Self, target| deploy.target = target,
            )
            .option(
                "force",
                OptionOptions::new().signature("-f, --force"),
                |deploy: &mut Self, force| deploy.force = force,
            )
            .option(
                "tags",
                OptionOptions::new().signature("-t, --tags <tags...>"),
                |deploy: &mut Self, tags: Option<Vec<String>>| {
                    deploy.tags = tags.unwrap_or_default()
                },
            )
            .option(
                "port",
                OptionOptions::new().signature("--port <port>"),
                |deploy: &mut Self, port| deploy.port = port,
            )
            .option(
                "verbose",
                OptionOptions::new().global(),
                |_: &mut Self, _: bool| {},
            );
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        capture(json!({
            "target": self.target,
            "force": self.force,
            "tags": self.tags,
            "port": self.port,
        }));
        Ok(())
    }
}

#[derive(Default)]
struct Boom;

#[async_trait]
impl Command for Boom {
    fn signature() -> &'static str {
        "boom"
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        Err(CommandError::failed("kaboom"))
    }
}

#[derive(Default)]
struct FirstDuplicate;

#[async_trait]
impl Command for FirstDuplicate {
    fn signature() -> &'static str {
        "dup"
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        capture(json!("first"));
        Ok(())
    }
}

#[derive(Default)]
struct SecondDuplicate;

#[async_trait]
impl Command for SecondDuplicate {
    fn signature() -> &'static str {
        "dup"
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        capture(json!("second"));
        Ok(())
    }
}

#[derive(Default)]
struct Export {
    name: String,
    out: String,
}

#[async_trait]
impl Command for Export {
    fn signature() -> &'static str {
        "export"
    }

    fn declare(declaration: &mut Declaration<Self>) {
        declaration
            .argument(
                "name",
                ArgumentOptions::new().signature("[name]"),
                |export: &mut Self, name| export.name = name,
            )
            .option(
                "out",
                OptionOptions::new().signature("--out <dir>"),
                |export: &mut Self, out| export.out = out,
            );
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        capture(json!({ "name": self.name, "out": self.out }));
        Ok(())
    }
}

#[derive(Default)]
struct Serve {
    host: String,
}

#[async_trait]
impl Command for Serve {
    fn signature() -> &'static str {
        "serve"
    }

    fn declare(declaration: &mut Declaration<Self>) {
        declaration.option(
            "host",
            OptionOptions::new().signature("-h, --host <host>"),
            |serve: &mut Self, host| serve.host = host,
        );
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        capture(json!({ "host": self.host }));
        Ok(())
    }
}

#[tokio::test]
async fn hello_binds_name() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Hello>().unwrap();

    let outcome = registry.parse(&argv(&["hello", "Ada"])).await.unwrap();

    assert_eq!(
        outcome,
        ParseOutcome::Dispatched {
            command: "hello".to_string()
        }
    );
    assert_eq!(captured(), vec![json!({ "name": "Ada", "extra": [] })]);
}

#[tokio::test]
async fn excess_positionals_reach_handle() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Hello>().unwrap();

    registry
        .parse(&argv(&["hello", "Ada", "Grace", "Linus"]))
        .await
        .unwrap();

    assert_eq!(
        captured(),
        vec![json!({ "name": "Ada", "extra": ["Grace", "Linus"] })]
    );
}

#[test]
fn placeholder_is_replaced_by_declaration() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Hello>().unwrap();

    let arguments = registry.get_command_args("hello");
    assert_eq!(arguments.len(), 1);
    assert_eq!(arguments[0].key, "name");
    assert_eq!(arguments[0].signature, "<name>");
    assert_eq!(arguments[0].description, "Who to greet");
}

#[tokio::test]
async fn loud_switch_resolves_true_when_passed() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Greet>().unwrap();

    registry.parse(&argv(&["greet", "--loud"])).await.unwrap();
    assert_eq!(registry.get_command_opts_values("greet")["loud"], json!(true));

    registry.parse(&argv(&["greet"])).await.unwrap();
    assert_eq!(registry.get_command_opts_values("greet")["loud"], json!(false));

    assert_eq!(
        captured(),
        vec![
            json!({ "loud": true, "color": true }),
            json!({ "loud": false, "color": true }),
        ]
    );
}

#[tokio::test]
async fn negated_flag_flips_only_when_passed() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Greet>().unwrap();

    registry.parse(&argv(&["greet"])).await.unwrap();
    registry.parse(&argv(&["greet", "--no-color"])).await.unwrap();

    let colors: Vec<_> = captured().into_iter().map(|v| v["color"].clone()).collect();
    assert_eq!(colors, vec![json!(true), json!(false)]);
}

#[tokio::test]
async fn zero_argument_command_dispatches() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Ping>().unwrap();

    registry.parse(&argv(&["ping"])).await.unwrap();

    assert_eq!(captured(), vec![json!({ "pong": [] })]);
}

#[tokio::test]
async fn bound_fields_match_resolved_values() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Deploy>().unwrap();

    registry
        .parse(&argv(&[
            "deploy", "prod", "--force", "--tags", "a", "b", "--port", "8080",
        ]))
        .await
        .unwrap();

    let bound = captured().remove(0);
    let resolved = registry.get_command_opts_values("deploy");

    assert_eq!(bound["target"], json!("prod"));
    assert_eq!(bound["force"], resolved["force"]);
    assert_eq!(bound["tags"], resolved["tags"]);
    assert_eq!(bound["port"], json!(8080));
    assert_eq!(resolved["port"], json!("8080"));
}

#[tokio::test]
async fn unconvertible_value_is_rejected() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Deploy>().unwrap();

    let error = registry
        .parse(&argv(&["deploy", "prod", "--port", "eighty"]))
        .await
        .unwrap_err();

    assert!(matches!(error, CliError::InvalidArgument { arg, .. } if arg == "port"));
    assert!(captured().is_empty());
}

#[tokio::test]
async fn global_options_reach_every_command() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Deploy>().unwrap();
    registry.register::<Ping>().unwrap();

    registry
        .parse(&argv(&["ping", "--verbose", "--env", "testing"]))
        .await
        .unwrap();

    let resolved = registry.get_command_opts_values("ping");
    assert_eq!(resolved["verbose"], json!(true));
    assert_eq!(resolved["env"], json!("testing"));
    assert!(registry.get_command_opts("ping").is_empty());
}

#[test]
fn set_version_registers_flag_once() {
    let mut registry = CommandRegistry::new("artisan");
    registry.set_version(Some("1.2.3"));
    registry.set_version(Some("1.2.3"));

    let version_flags = registry
        .root()
        .get_arguments()
        .filter(|arg| arg.get_long() == Some("version"))
        .count();
    assert_eq!(version_flags, 1);
}

#[tokio::test]
async fn version_flag_prints_first_version() {
    let mut registry = CommandRegistry::new("artisan");
    registry.set_version(Some("1.2.3"));
    registry.set_version(Some("9.9.9"));

    let outcome = registry.parse(&argv(&["--version"])).await.unwrap();
    assert_eq!(outcome, ParseOutcome::Version("1.2.3".to_string()));
}

#[tokio::test]
async fn unknown_command_is_reported() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Hello>().unwrap();

    let error = registry.parse(&argv(&["foo"])).await.unwrap_err();

    assert!(matches!(&error, CliError::UnknownCommand(name) if name == "foo"));
    assert!(error.to_string().contains("unknown command 'foo'"));
}

#[tokio::test]
async fn missing_required_argument_is_a_usage_error() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Hello>().unwrap();

    let error = registry.parse(&argv(&["hello"])).await.unwrap_err();

    assert!(matches!(error, CliError::Parse(_)));
    assert!(captured().is_empty());
}

#[tokio::test]
async fn help_renders_sections() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Hello>().unwrap();
    registry.register::<Greet>().unwrap();

    let ParseOutcome::Help(root) = registry.parse(&argv(&[])).await.unwrap() else {
        panic!("expected root help");
    };
    assert!(root.contains("Usage:"));
    assert!(root.contains("Available commands:"));
    assert!(root.contains("hello <name>"));

    let ParseOutcome::Help(command) = registry.parse(&argv(&["help", "hello"])).await.unwrap()
    else {
        panic!("expected command help");
    };
    assert!(command.contains("Description:"));
    assert!(command.contains("Arguments:"));
    assert!(command.contains("Who to greet"));

    let ParseOutcome::Help(flag) = registry.parse(&argv(&["greet", "--help"])).await.unwrap()
    else {
        panic!("expected command help");
    };
    assert!(flag.contains("--no-color"));
    assert!(captured().is_empty());
}

#[test]
fn alias_filters_commands_by_prefix() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Hello>().unwrap();
    registry
        .register_route("make:controller <name>", |_, _| async { Ok(()) })
        .unwrap();
    registry
        .register_route("make:command <name>", |_, _| async { Ok(()) })
        .unwrap();

    let names: Vec<_> = registry
        .get_commands_info(Some("make"))
        .into_iter()
        .map(|info| info.name)
        .collect();
    assert_eq!(names, ["make:command", "make:controller"]);

    assert_eq!(
        registry.get_commands(),
        ["hello", "make:command", "make:controller"]
    );
    assert_eq!(
        registry.get_command("make:command").unwrap().category.as_deref(),
        Some("make")
    );
    assert!(registry.has_command("hello"));
    assert!(!registry.has_command("make"));
}

struct Recording(Arc<Mutex<Vec<String>>>);

#[async_trait]
impl ExceptionHandler for Recording {
    async fn handle(&self, error: &CommandError) {
        self.0.lock().unwrap().push(error.to_string());
    }
}

#[tokio::test]
async fn exception_handler_receives_handler_errors() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Boom>().unwrap();
    registry.set_exception_handler(Some(Arc::new(Recording(seen.clone()))));

    let error = registry.parse(&argv(&["boom"])).await.unwrap_err();

    assert!(matches!(error, CliError::Handled(_)));
    assert_eq!(*seen.lock().unwrap(), vec!["kaboom".to_string()]);
}

#[tokio::test]
async fn handler_errors_propagate_without_exception_handler() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Boom>().unwrap();

    let error = registry.parse(&argv(&["boom"])).await.unwrap_err();

    assert!(matches!(error, CliError::CommandFailed(CommandError::Failed(message)) if message == "kaboom"));
}

#[tokio::test]
async fn parser_errors_bypass_exception_handler() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = CommandRegistry::new("artisan");
    registry.set_exception_handler(Some(Arc::new(Recording(seen.clone()))));

    registry.parse(&argv(&["nope"])).await.unwrap_err();

    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_signature_last_registration_wins() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<FirstDuplicate>().unwrap();
    registry.register::<SecondDuplicate>().unwrap();

    registry.parse(&argv(&["dup"])).await.unwrap();

    assert_eq!(registry.get_commands(), ["dup"]);
    assert_eq!(captured(), vec![json!("second")]);
}

#[tokio::test]
async fn route_and_class_bind_identically() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Hello>().unwrap();

    let mut artisan = Artisan::new("artisan", Config::default());
    artisan
        .route("hello <name>", |arguments, _options| async move {
            capture(json!({ "name": arguments[0], "extra": &arguments[1..] }));
            Ok(())
        })
        .unwrap()
        .argument("<name>", ArgumentOptions::new().description("Who to greet"))
        .unwrap();

    registry
        .parse(&argv(&["hello", "Ada", "more"]))
        .await
        .unwrap();
    artisan.call("hello Ada more").await.unwrap();

    let results = captured();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0], results[1]);
    assert_eq!(
        registry.get_command_args("hello"),
        artisan.registry().get_command_args("hello")
    );
}

#[tokio::test]
async fn route_options_are_passed_to_handler() {
    let mut artisan = Artisan::new("artisan", Config::default());
    artisan
        .route("greet", |_, options| async move {
            capture(Value::Object(options));
            Ok(())
        })
        .unwrap()
        .option("-l, --loud", OptionOptions::new())
        .unwrap();

    artisan.call("greet -l").await.unwrap();

    let options = captured().remove(0);
    assert_eq!(options["loud"], json!(true));
    assert!(options.get("env").is_some());
}

#[test]
fn reconstruct_drops_all_state() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Hello>().unwrap();
    registry.register::<Deploy>().unwrap();
    registry.set_version(None);

    registry.reconstruct();

    assert!(registry.get_commands().is_empty());
    assert!(!registry.has_command("hello"));
    assert!(
        registry
            .root()
            .get_arguments()
            .all(|arg| arg.get_long() != Some("version") && arg.get_long() != Some("verbose"))
    );
}

#[test]
fn malformed_signature_is_rejected() {
    let mut registry = CommandRegistry::new("artisan");

    let error = registry
        .register_route("<name> hello", |_, _| async { Ok(()) })
        .unwrap_err();

    assert!(matches!(error, CliError::InvalidSignature { .. }));
    assert!(registry.get_commands().is_empty());
}

#[tokio::test]
async fn omitted_values_keep_field_defaults() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Export>().unwrap();

    registry.parse(&argv(&["export"])).await.unwrap();
    registry.parse(&argv(&["export", "Ada"])).await.unwrap();
    registry
        .parse(&argv(&["export", "Ada", "--out", "dist"]))
        .await
        .unwrap();

    assert_eq!(
        captured(),
        vec![
            json!({ "name": "", "out": "" }),
            json!({ "name": "Ada", "out": "" }),
            json!({ "name": "Ada", "out": "dist" }),
        ]
    );
}

#[tokio::test]
async fn flag_taken_by_help_is_rejected() {
    let mut registry = CommandRegistry::new("artisan");

    let error = registry.register::<Serve>().unwrap_err();
    assert!(
        matches!(&error, CliError::InvalidSignature { reason, .. } if reason.contains("'-h'"))
    );
    assert!(!registry.has_command("serve"));

    let outcome = registry.parse(&argv(&["serve", "--help"])).await.unwrap();
    assert!(matches!(outcome, ParseOutcome::Help(_)));
}

#[test]
fn flag_taken_by_another_option_is_rejected() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Deploy>().unwrap();

    let key = registry
        .register_route("build", |_, _| async { Ok(()) })
        .unwrap();
    registry
        .add_option(key, "fast", OptionOptions::new().signature("-f, --fast"))
        .unwrap();

    let local = registry
        .add_option(key, "full", OptionOptions::new().signature("-f, --full"))
        .unwrap_err();
    assert!(matches!(local, CliError::InvalidSignature { .. }));

    let global = registry
        .add_option(
            key,
            "envFile",
            OptionOptions::new().signature("--env <file>").global(),
        )
        .unwrap();
    assert_eq!(global.signature_name, "env");

    let clash = registry
        .add_option(
            key,
            "forceAll",
            OptionOptions::new().signature("-t, --force-all").global(),
        )
        .unwrap_err();
    assert!(
        matches!(&clash, CliError::InvalidSignature { reason, .. } if reason.contains("--tags"))
    );

    let version = registry
        .add_option(key, "verbose", OptionOptions::new().signature("-v").global())
        .unwrap_err();
    assert!(matches!(version, CliError::InvalidSignature { .. }));

    let declared: Vec<String> = registry
        .get_command_opts("build")
        .into_iter()
        .map(|option| option.signature_name)
        .collect();
    assert_eq!(declared, vec!["fast".to_string(), "env".to_string()]);

    registry.set_version(None);
    registry.root().debug_assert();
}

#[tokio::test]
async fn help_target_skips_global_values() {
    let mut registry = CommandRegistry::new("artisan");
    registry.register::<Hello>().unwrap();

    let ParseOutcome::Help(help) = registry
        .parse(&argv(&["--env", "prod", "hello", "--help"]))
        .await
        .unwrap()
    else {
        panic!("expected command help");
    };

    assert!(help.contains("Who to greet"));
    assert!(captured().is_empty());
}
