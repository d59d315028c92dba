use async_trait::async_trait;
use serde_json::Value;
use toml::Value as TomlValue;

use crate::{
    cli::{ArgumentOptions, Command, CommandError, Declaration, HandlerResult},
    config::Config,
};

/// Prints a value from the discovered configuration.
///
/// # Example Usage
///
/// ```bash
/// artisan config:get app.name
/// artisan config:get rc.commands.serve
/// artisan config:get logging
/// ```
#[derive(Default)]
pub struct GetCommand {
    path: String,
}

#[async_trait]
impl Command for GetCommand {
    fn signature() -> &'static str {
        "config:get"
    }

    fn description() -> &'static str {
        "Get configuration value"
    }

    fn declare(declaration: &mut Declaration<Self>) {
        declaration.argument(
            "path",
            ArgumentOptions::new()
                .signature("<path>")
                .description("Configuration path (e.g., logging.level)"),
            |command: &mut Self, path| command.path = path,
        );
    }

    async fn handle(&mut self, _extra: Vec<Value>) -> HandlerResult {
        let config = Config::discover().map_err(|e| CommandError::failed(e.to_string()))?;
        let value = navigate(&config, &self.path)?;

        println!("{}: {}", self.path, format_value(&value));
        Ok(())
    }
}

fn navigate(config: &Config, path: &str) -> Result<TomlValue, CommandError> {
    let mut current =
        TomlValue::try_from(config).map_err(|e| CommandError::failed(e.to_string()))?;

    for segment in path.split('.').filter(|segment| !segment.is_empty()) {
        current = current
            .get(segment)
            .cloned()
            .ok_or_else(|| CommandError::InvalidArgument {
                arg: "path".to_string(),
                reason: format!("no configuration value at '{path}'"),
            })?;
    }

    Ok(current)
}

fn format_value(value: &TomlValue) -> String {
    match value {
        TomlValue::String(s) => format!("\"{s}\""),
        TomlValue::Table(table) => toml::to_string_pretty(table)
            .map(|rendered| format!("\n{}", rendered.trim_end()))
            .unwrap_or_else(|_| format!("{{{}}}", table.len())),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn navigates_nested_paths() {
        let config = Config::from_toml_str(
            r#"
[app]
name = "Playground"

[logging]
level = "info"
"#,
        )
        .unwrap();

        assert_eq!(
            navigate(&config, "app.name").unwrap(),
            TomlValue::String("Playground".to_string())
        );
        assert_eq!(format_value(&navigate(&config, "logging.level").unwrap()), "\"info\"");
        assert!(navigate(&config, "app.missing").is_err());
    }
}
