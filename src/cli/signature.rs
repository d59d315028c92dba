//! Parsing of command signatures, argument patterns and flag texts.

use std::sync::LazyLock;

use regex::Regex;

use super::CliError;

// `None` only if the pattern fails to compile; every bracketed token is then
// rejected as an invalid signature.
static PLACEHOLDER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:<(?P<req>[^<>\[\]]+?)(?P<req_var>\.\.\.)?>|\[(?P<opt>[^<>\[\]]+?)(?P<opt_var>\.\.\.)?\])$")
        .ok()
});

/// A `<name>`, `[name]` or bare `name` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Name without brackets or ellipsis.
    pub name: String,
    /// `Some(true)` for `<..>`, `Some(false)` for `[..]`, `None` when bare.
    pub required: Option<bool>,
    /// Whether the pattern ends in `...`.
    pub variadic: bool,
}

impl Placeholder {
    /// Parses a bracketed placeholder. Returns `None` for anything else.
    pub fn bracketed(token: &str) -> Option<Self> {
        let captures = PLACEHOLDER.as_ref()?.captures(token)?;

        if let Some(name) = captures.name("req") {
            return Some(Self {
                name: name.as_str().to_string(),
                required: Some(true),
                variadic: captures.name("req_var").is_some(),
            });
        }

        captures.name("opt").map(|name| Self {
            name: name.as_str().to_string(),
            required: Some(false),
            variadic: captures.name("opt_var").is_some(),
        })
    }

    /// Parses an argument pattern, accepting bare names as well.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` for empty or malformed patterns
    pub fn argument(pattern: &str) -> Result<Self, CliError> {
        let pattern = pattern.trim();

        if let Some(placeholder) = Self::bracketed(pattern) {
            return Ok(placeholder);
        }

        let (name, variadic) = match pattern.strip_suffix("...") {
            Some(name) => (name, true),
            None => (pattern, false),
        };

        if name.is_empty() || name.contains(['<', '>', '[', ']', ' ']) || name.starts_with('-') {
            return Err(CliError::InvalidSignature {
                signature: pattern.to_string(),
                reason: "expected <name>, [name] or a bare name".to_string(),
            });
        }

        Ok(Self {
            name: name.to_string(),
            required: None,
            variadic,
        })
    }

    /// Bracketed form, e.g. `[files...]`. Bare names render as required.
    pub fn pattern(&self) -> String {
        let ellipsis = if self.variadic { "..." } else { "" };

        match self.required {
            Some(false) => format!("[{}{ellipsis}]", self.name),
            _ => format!("<{}{ellipsis}>", self.name),
        }
    }
}

/// A command signature split into its name and embedded placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSignature {
    /// The command token users type, e.g. `make:controller`.
    pub name: String,
    /// Positional placeholders that follow the name.
    pub placeholders: Vec<Placeholder>,
}

impl CommandSignature {
    /// Parses `name [<arg> | [arg] ...]`.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the name is missing or a
    /// trailing token is not a bracketed placeholder
    pub fn parse(signature: &str) -> Result<Self, CliError> {
        let invalid = |reason: &str| CliError::InvalidSignature {
            signature: signature.to_string(),
            reason: reason.to_string(),
        };

        let mut tokens = signature.split_whitespace();
        let name = tokens
            .next()
            .filter(|name| !name.starts_with(['<', '[', '-']))
            .ok_or_else(|| invalid("signature must start with a command name"))?;

        let placeholders = tokens
            .map(|token| {
                Placeholder::bracketed(token)
                    .ok_or_else(|| invalid(&format!("unexpected token '{token}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            placeholders,
        })
    }
}

/// Value expectation of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagValue {
    /// A boolean switch, e.g. `--loud` or `--no-color`.
    Switch,
    /// `--flag <value>` or `--flag <values...>`.
    Required {
        /// Accepts several values
        variadic: bool,
    },
    /// `--flag [value]`; passing the flag bare resolves to `true`.
    Optional,
}

/// Parsed flag text: the tri-state negation descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    /// Short form without the dash.
    pub short: Option<char>,
    /// Long form without the leading `--`, `no-` included when negated.
    pub long: Option<String>,
    /// What the flag expects after it.
    pub value: FlagValue,
    /// `--no-x` switch: defaults to `true`, `false` only when passed.
    pub negated: bool,
}

impl FlagSpec {
    /// Parses flag text such as `-x, --long <value>` or `--no-color`.
    ///
    /// # Errors
    /// Returns `CliError::InvalidSignature` if the text has no flag or
    /// contains a token that is neither a flag nor a placeholder
    pub fn parse(text: &str) -> Result<Self, CliError> {
        let invalid = |reason: String| CliError::InvalidSignature {
            signature: text.to_string(),
            reason,
        };

        let mut spec = FlagSpec {
            short: None,
            long: None,
            value: FlagValue::Switch,
            negated: false,
        };

        for token in text
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|token| !token.is_empty())
        {
            if let Some(long) = token.strip_prefix("--") {
                if long.is_empty() {
                    return Err(invalid("empty long flag".to_string()));
                }
                spec.long = Some(long.to_string());
            } else if let Some(short) = token.strip_prefix('-') {
                let mut chars = short.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => spec.short = Some(c),
                    _ => return Err(invalid(format!("short flag '{token}' must be one character"))),
                }
            } else if let Some(placeholder) = Placeholder::bracketed(token) {
                spec.value = match placeholder.required {
                    Some(false) => FlagValue::Optional,
                    _ => FlagValue::Required {
                        variadic: placeholder.variadic,
                    },
                };
            } else {
                return Err(invalid(format!("unexpected token '{token}'")));
            }
        }

        if spec.short.is_none() && spec.long.is_none() {
            return Err(invalid("no flag found".to_string()));
        }

        spec.negated = spec.value == FlagValue::Switch
            && spec.long.as_deref().is_some_and(|long| long.starts_with("no-"));

        Ok(spec)
    }

    /// Key under which the parsed value is exposed.
    ///
    /// Derived from the long flag with `no-` removed and camelCased, or the
    /// short letter when there is no long flag.
    pub fn signature_name(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => camel_case(long.strip_prefix("no-").unwrap_or(long)),
            (None, Some(short)) => short.to_string(),
            (None, None) => String::new(),
        }
    }
}

/// `dry-run` → `dryRun`. The first word is kept as written.
pub fn camel_case(text: &str) -> String {
    let mut words = text
        .split(['-', '_', ' '])
        .filter(|word| !word.is_empty());

    let mut camel = words.next().unwrap_or_default().to_string();
    for word in words {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            camel.extend(first.to_uppercase());
            camel.push_str(chars.as_str());
        }
    }

    camel
}

/// `dryRun` → `dry-run`.
pub fn kebab_case(text: &str) -> String {
    let mut kebab = String::with_capacity(text.len() + 4);

    for c in text.chars() {
        if c.is_uppercase() {
            if !kebab.is_empty() {
                kebab.push('-');
            }
            kebab.extend(c.to_lowercase());
        } else if c == '_' {
            kebab.push('-');
        } else {
            kebab.push(c);
        }
    }

    kebab
}
