use std::{
    collections::BTreeMap,
    io::{self, IsTerminal},
};

use super::{
    formatting::{format_category, format_command, format_description, format_header, format_value},
    metadata::OptionDescriptor,
    registry::CommandInfo,
};

const HELP_ROW: (&str, &str) = ("-h, --help", "Display help for command");
const VERSION_ROW: (&str, &str) = ("-v, --version", "Output the version number");

/// Renders root and per-command help.
///
/// Sections follow a fixed order: usage, description, arguments, options
/// and, for the root, the available commands grouped by their `alias:`
/// prefix. Empty sections are left out.
#[derive(Debug, Clone)]
pub struct HelpFormatter {
    colors: bool,
}

impl Default for HelpFormatter {
    fn default() -> Self {
        Self {
            colors: io::stdout().is_terminal(),
        }
    }
}

impl HelpFormatter {
    /// Creates a formatter with colors forced on or off.
    pub fn new(colors: bool) -> Self {
        Self { colors }
    }

    /// Whether ANSI styling is emitted.
    pub fn colors(&self) -> bool {
        self.colors
    }

    /// Help for the program itself.
    pub fn render_root(
        &self,
        program: &str,
        commands: &[CommandInfo],
        globals: &[OptionDescriptor],
        version: bool,
    ) -> String {
        let mut out = String::new();
        self.usage(&mut out, &format!("{program} [options] [command]"));

        let mut options = vec![row(HELP_ROW)];
        if version {
            options.push(row(VERSION_ROW));
        }
        options.extend(globals.iter().map(option_row));
        self.section(&mut out, "Options", &options);

        let mut groups: BTreeMap<&str, Vec<(String, String)>> = BTreeMap::new();
        for command in commands {
            let signature = std::iter::once(command.name.as_str())
                .chain(command.arguments.iter().map(|a| a.signature.as_str()))
                .collect::<Vec<_>>()
                .join(" ");

            groups
                .entry(command.category.as_deref().unwrap_or_default())
                .or_default()
                .push((signature, command.description.clone()));
        }

        if !groups.is_empty() {
            out.push_str(&format!("\n{}\n", self.paint(format_header, "Available commands:")));
            for (category, rows) in groups {
                if !category.is_empty() {
                    out.push_str(&format!(" {}\n", self.paint(format_category, category)));
                }
                self.rows(&mut out, &rows);
            }
        }

        out
    }

    /// Help for one command.
    pub fn render_command(
        &self,
        program: &str,
        command: &CommandInfo,
        globals: &[OptionDescriptor],
    ) -> String {
        let mut out = String::new();

        let mut usage = format!("{program} {} [options]", command.name);
        for argument in &command.arguments {
            usage.push(' ');
            usage.push_str(&argument.signature);
        }
        self.usage(&mut out, &usage);

        if !command.description.is_empty() {
            out.push_str(&format!(
                "\n{}\n  {}\n",
                self.paint(format_header, "Description:"),
                command.description
            ));
        }

        let arguments: Vec<_> = command
            .arguments
            .iter()
            .map(|argument| {
                let description = match &argument.default {
                    Some(default) => format!(
                        "{} (default: {})",
                        argument.description,
                        format_value(default)
                    ),
                    None => argument.description.clone(),
                };
                (argument.signature_name.clone(), description.trim().to_string())
            })
            .collect();
        self.section(&mut out, "Arguments", &arguments);

        let mut options = vec![row(HELP_ROW)];
        options.extend(
            globals
                .iter()
                .filter(|global| {
                    !command
                        .options
                        .iter()
                        .any(|option| option.signature_name == global.signature_name)
                })
                .chain(command.options.iter())
                .map(option_row),
        );
        self.section(&mut out, "Options", &options);

        out
    }

    fn usage(&self, out: &mut String, usage: &str) {
        out.push_str(&format!("{} {usage}\n", self.paint(format_header, "Usage:")));
    }

    fn section(&self, out: &mut String, title: &str, rows: &[(String, String)]) {
        if rows.is_empty() {
            return;
        }

        out.push_str(&format!("\n{}\n", self.paint(format_header, &format!("{title}:"))));
        self.rows(out, rows);
    }

    fn rows(&self, out: &mut String, rows: &[(String, String)]) {
        let width = rows
            .iter()
            .map(|(left, _)| left.chars().count())
            .max()
            .unwrap_or_default()
            + 2;

        for (left, right) in rows {
            let padded = format!("{left:<width$}");
            out.push_str(&format!(
                "  {}{}\n",
                self.paint(format_command, &padded),
                self.paint(format_description, right)
            ));
        }
    }

    fn paint(&self, style: fn(&str) -> String, text: &str) -> String {
        if self.colors {
            style(text)
        } else {
            text.to_string()
        }
    }
}

fn row((left, right): (&str, &str)) -> (String, String) {
    (left.to_string(), right.to_string())
}

fn option_row(option: &OptionDescriptor) -> (String, String) {
    let description = match &option.default {
        Some(default) => format!("{} (default: {})", option.description, format_value(default)),
        None => option.description.clone(),
    };

    (option.signature.clone(), description.trim().to_string())
}
