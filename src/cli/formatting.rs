//! Formatting utilities for CLI output.
//!
//! Provides consistent styling for help sections, command listings,
//! default values and error messages.

use serde_json::Value;

/// ANSI color codes for terminal output
pub struct Colors;

impl Colors {
    /// Reset all formatting
    pub const RESET: &'static str = "\x1b[0m";
    /// Bold text
    pub const BOLD: &'static str = "\x1b[1m";
    /// Dim text
    pub const DIM: &'static str = "\x1b[2m";

    /// Red color
    pub const RED: &'static str = "\x1b[31m";
    /// Green color
    pub const GREEN: &'static str = "\x1b[32m";
    /// Yellow color
    pub const YELLOW: &'static str = "\x1b[33m";
    /// Blue color
    pub const BLUE: &'static str = "\x1b[34m";
    /// Magenta color
    pub const MAGENTA: &'static str = "\x1b[35m";
    /// Cyan color
    pub const CYAN: &'static str = "\x1b[36m";
}

/// Formats section headers with styling
pub fn format_header(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::CYAN, text, Colors::RESET)
}

/// Formats command names with styling
pub fn format_command(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::GREEN, text, Colors::RESET)
}

/// Formats category names with styling
pub fn format_category(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::BLUE, text, Colors::RESET)
}

/// Formats descriptions with muted styling
pub fn format_description(text: &str) -> String {
    format!("{}{}{}", Colors::DIM, text, Colors::RESET)
}

/// Formats error messages with red styling
pub fn format_error(text: &str) -> String {
    format!("{}{}{}{}", Colors::BOLD, Colors::RED, text, Colors::RESET)
}

/// Formats the startup banner shown when no command is given.
pub fn format_banner(name: &str, colors: bool) -> String {
    let rule = "=".repeat(name.chars().count() + 4);
    let title = format!("  {name}");

    if !colors {
        return format!("{rule}\n{title}\n{rule}");
    }

    format!(
        "{}{rule}{}\n{}{}{title}{}\n{}{rule}{}",
        Colors::MAGENTA,
        Colors::RESET,
        Colors::BOLD,
        Colors::YELLOW,
        Colors::RESET,
        Colors::MAGENTA,
        Colors::RESET
    )
}

/// Formats a default value for help output.
///
/// Scalars are shown as written on the command line; arrays and objects
/// show their size rather than full contents.
///
/// # Examples
///
/// ```
/// use artisan::cli::formatting::format_value;
/// use serde_json::json;
///
/// assert_eq!(format_value(&json!("hello")), "\"hello\"");
/// assert_eq!(format_value(&json!(42)), "42");
/// assert_eq!(format_value(&json!([1, 2])), "[2]");
/// ```
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{s}\""),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(arr) => format!("[{}]", arr.len()),
        Value::Object(map) => format!("{{{}}}", map.len()),
        Value::Null => "null".to_string(),
    }
}
