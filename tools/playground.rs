//! Sandbox CLI exercising every way of declaring a command.
//!
//! Used by the integration tests and handy for trying the framework by
//! hand: `cargo run --bin artisan-playground -- hello Ada`.

use std::{env, error::Error, time::Duration};

use artisan::{
    Artisan,
    cli::{
        ArgumentOptions, Bootstrapper, ChildInvoker, Command, CommandError, CommandSettings,
        Declaration, ExceptionHandler, HandlerResult, OptionOptions, OptionValues,
    },
    config::Config,
    tracing_config,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

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
        "Greet someone by name"
    }

    fn declare(declaration: &mut Declaration<Self>) {
        declaration.argument(
            "name",
            ArgumentOptions::new().description("Who to greet"),
            |hello: &mut Self, name| hello.name = name,
        );
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        println!("Hello, {}!", self.name);
        Ok(())
    }
}

#[derive(Default)]
struct Greet {
    name: String,
    loud: bool,
    color: bool,
}

#[async_trait]
impl Command for Greet {
    fn signature() -> &'static str {
        "greet"
    }

    fn description() -> &'static str {
        "Greet with style"
    }

    fn declare(declaration: &mut Declaration<Self>) {
        declaration
            .argument(
                "name",
                ArgumentOptions::new()
                    .signature("[name]")
                    .default_value("world"),
                |greet: &mut Self, name| greet.name = name,
            )
            .option(
                "loud",
                OptionOptions::new()
                    .signature("-l, --loud")
                    .description("Shout the greeting"),
                |greet: &mut Self, loud| greet.loud = loud,
            )
            .option(
                "color",
                OptionOptions::new()
                    .signature("--no-color")
                    .description("Disable colored output"),
                |greet: &mut Self, color| greet.color = color,
            );
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        let greeting = format!("Hello, {}", self.name);

        match (self.loud, self.color) {
            (true, _) => println!("{}!", greeting.to_uppercase()),
            (false, false) => println!("{greeting} (plain)"),
            (false, true) => println!("{greeting}"),
        }

        Ok(())
    }
}

#[derive(Default)]
struct Sum {
    numbers: Vec<i64>,
}

#[async_trait]
impl Command for Sum {
    fn signature() -> &'static str {
        "math:sum"
    }

    fn description() -> &'static str {
        "Add numbers together"
    }

    fn declare(declaration: &mut Declaration<Self>) {
        declaration.argument(
            "numbers",
            ArgumentOptions::new().signature("<numbers...>"),
            |sum: &mut Self, numbers| sum.numbers = numbers,
        );
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        println!("{}", self.numbers.iter().sum::<i64>());
        Ok(())
    }
}

#[derive(Default)]
struct Fail;

#[async_trait]
impl Command for Fail {
    fn signature() -> &'static str {
        "fail"
    }

    fn description() -> &'static str {
        "Always fails"
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        Err(CommandError::failed("boom"))
    }
}

struct ReportingHandler;

#[async_trait]
impl ExceptionHandler for ReportingHandler {
    async fn handle(&self, error: &CommandError) {
        eprintln!("handled: {error}");
    }
}

struct PlaygroundApp;

#[async_trait]
impl Bootstrapper for PlaygroundApp {
    async fn fire(&self, environments: &[String]) -> Result<(), CommandError> {
        info!(?environments, "Playground application booted");
        println!("booted {}", environments.join(","));
        Ok(())
    }
}

async fn env_child(_arguments: Vec<Value>, options: OptionValues) -> HandlerResult {
    let isolated = options
        .get("isolated")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let output = ChildInvoker::current()
        .map_err(|e| CommandError::failed(e.to_string()))?
        .forward_env(!isolated)
        .call("env:show")
        .await
        .map_err(|e| CommandError::failed(e.to_string()))?;

    println!("child {}", output.stdout.trim());
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::discover()?;
    tracing_config::init(&config.logging, config.app.debug)?;

    let mut artisan = Artisan::new("artisan-playground", config);
    artisan.set_exception_handler(ReportingHandler);
    artisan.set_bootstrapper(PlaygroundApp);

    artisan.register::<Hello>()?;
    artisan.register::<Greet>()?;
    artisan.register::<Sum>()?;
    artisan.register::<Fail>()?;
    artisan.register_builtin_commands()?;

    artisan
        .route("echo", |arguments, options| async move {
            println!("{}", json!({ "arguments": arguments, "options": options }));
            Ok(())
        })?
        .description("Print the resolved arguments and options as JSON")?
        .argument("[words...]", ArgumentOptions::new())?
        .option("-u, --upper", OptionOptions::new())?;

    artisan
        .route("boot", |_, _| async { Ok(()) })?
        .description("Bootstrap the application and exit")?
        .settings(CommandSettings {
            load_app: true,
            ..CommandSettings::default()
        })?;

    artisan
        .route("env:show", |_, options| async move {
            let env = options.get("env").and_then(Value::as_str).unwrap_or("none");
            println!("env: {env}");
            Ok(())
        })?
        .description("Print the environment the command runs under")?;

    artisan
        .route("env:child", env_child)?
        .description("Print the environment seen by a child process")?
        .option("--isolated", OptionOptions::new().description("Do not forward APP_ENV/NODE_ENV"))?;

    artisan
        .route("serve", |_, options| async move {
            let port = options
                .get("port")
                .and_then(Value::as_str)
                .unwrap_or("8000")
                .to_string();
            println!("Serving on port {port}");

            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(Duration::from_secs(30));
                loop {
                    ticker.tick().await;
                    info!(%port, "Still serving");
                }
            });

            Ok(())
        })?
        .description("Start a long-running server")?
        .option("-p, --port <port>", OptionOptions::new().default_value("8000"))?
        .settings(CommandSettings {
            stay_alive: true,
            ..CommandSettings::default()
        })?;

    let argv: Vec<String> = env::args().collect();
    artisan.parse(&argv).await.enforce().await;

    Ok(())
}
