use async_trait::async_trait;
use schemars::schema_for;
use serde_json::Value;

use crate::{
    cli::{Command, CommandError, Declaration, HandlerResult, OptionOptions},
    config::Config,
};

/// Prints the JSON schema of the rc configuration file.
///
/// Editors use it to validate `.artisanrc.toml` files.
#[derive(Default)]
pub struct SchemaCommand {
    compact: bool,
}

#[async_trait]
impl Command for SchemaCommand {
    fn signature() -> &'static str {
        "config:schema"
    }

    fn description() -> &'static str {
        "Print the configuration JSON schema"
    }

    fn declare(declaration: &mut Declaration<Self>) {
        declaration.option(
            "compact",
            OptionOptions::new().description("Print on a single line"),
            |command: &mut Self, compact| command.compact = compact,
        );
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        let schema = schema_for!(Config);

        let rendered = if self.compact {
            serde_json::to_string(&schema)
        } else {
            serde_json::to_string_pretty(&schema)
        }
        .map_err(|e| CommandError::failed(e.to_string()))?;

        println!("{rendered}");
        Ok(())
    }
}
