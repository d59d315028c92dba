use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, instrument};

use super::{Config, ConfigPaths};
use crate::{ArtisanError, Result};

impl Config {
    /// Loads the rc file from its default location.
    ///
    /// A missing file is not an error: commands simply run with default
    /// settings.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read, parsed or merged
    #[instrument]
    pub fn discover() -> Result<Config> {
        let path = ConfigPaths::rc_file()?;

        if !path.exists() {
            debug!("No rc file at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        info!("Loading configuration from {}", path.display());
        Self::load_with_imports(&path)
    }

    /// Parses a configuration from a TOML string without import support.
    ///
    /// # Errors
    /// Returns error if the string is not valid TOML or does not match the schema
    pub fn from_toml_str(content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| ArtisanError::toml_parse(e, None))
    }

    /// Loads a configuration file, merging `@name` imports underneath it.
    ///
    /// Every top-level key starting with `@` names a sibling file (the `.toml`
    /// extension is optional). Imported tables are merged in order and the
    /// main file is merged last, so its values win.
    ///
    /// # Errors
    /// Returns error if any file cannot be read or parsed, or if the merged
    /// document does not match the schema
    pub fn load_with_imports(path: &Path) -> Result<Config> {
        let file_content = fs::read_to_string(path)?;
        let main_toml: toml::Value =
            toml::from_str(&file_content).map_err(|e| ArtisanError::toml_parse(e, Some(path)))?;

        let imported_tomls = Self::extract_imports(&main_toml)
            .iter()
            .map(|import_path| {
                let resolved_path = Self::resolve_import_path(path, import_path)?;
                Self::load_import_file(&resolved_path)
            })
            .collect::<Result<Vec<toml::Value>>>()?;

        let merged_toml = Self::merge_toml_values(imported_tomls, Self::strip_imports(main_toml));

        merged_toml
            .try_into::<Config>()
            .map_err(|e| ArtisanError::ConfigValidation {
                component: path.display().to_string(),
                details: format!("invalid configuration after merging imports: {e}"),
            })
    }

    fn merge_toml_values(toml_list: Vec<toml::Value>, main_toml: toml::Value) -> toml::Value {
        let mut accumulated = toml::Value::Table(toml::map::Map::new());

        for import_toml in toml_list {
            accumulated = Self::merge_two_toml_values(accumulated, import_toml);
        }

        Self::merge_two_toml_values(accumulated, main_toml)
    }

    fn merge_two_toml_values(base: toml::Value, overlay: toml::Value) -> toml::Value {
        match (base, overlay) {
            (toml::Value::Table(base_table), toml::Value::Table(mut merged_table)) => {
                for (key, base_value) in base_table {
                    let merged_value = match merged_table.remove(&key) {
                        Some(overlay_value) => Self::merge_two_toml_values(base_value, overlay_value),
                        None => base_value,
                    };
                    merged_table.insert(key, merged_value);
                }

                toml::Value::Table(merged_table)
            }

            (_, overlay) => overlay,
        }
    }

    fn extract_imports(value: &toml::Value) -> Vec<String> {
        match value {
            toml::Value::Table(table) => table
                .keys()
                .filter_map(|key| key.strip_prefix('@'))
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn strip_imports(value: toml::Value) -> toml::Value {
        match value {
            toml::Value::Table(table) => toml::Value::Table(
                table
                    .into_iter()
                    .filter(|(key, _)| !key.starts_with('@'))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Resolves an import name relative to the importing file.
    ///
    /// # Errors
    /// Returns error if the importing file has no parent directory
    pub fn resolve_import_path(base_path: &Path, import_path: &str) -> Result<PathBuf> {
        let parent = base_path
            .parent()
            .ok_or_else(|| ArtisanError::import("file has no parent directory", base_path))?;

        let mut import_pathbuf = PathBuf::from(import_path);
        if import_pathbuf.extension().is_none() {
            import_pathbuf.set_extension("toml");
        }

        Ok(parent.join(import_pathbuf))
    }

    fn load_import_file(path: &Path) -> Result<toml::Value> {
        let file_content = fs::read_to_string(path).map_err(|e| ArtisanError::import(e, path))?;

        toml::from_str(&file_content).map_err(|e| ArtisanError::toml_parse(e, Some(path)))
    }
}
