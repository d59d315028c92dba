use std::{
    env,
    io::Error,
    path::{Path, PathBuf},
};

/// Environment variable that overrides the rc file location.
pub const CONFIG_ENV_VAR: &str = "ARTISAN_CONFIG";

/// File name looked up in the working directory when no override is set.
pub const RC_FILE_NAME: &str = ".artisanrc.toml";

/// Utility struct for locating configuration files.
///
/// The rc file belongs to the project being operated on, so it is resolved
/// relative to the working directory rather than a per-user config home.
pub struct ConfigPaths;

impl ConfigPaths {
    /// Returns the path of the rc file.
    ///
    /// - First checks `ARTISAN_CONFIG`
    /// - Falls back to `.artisanrc.toml` in the current working directory
    ///
    /// # Errors
    /// Returns an error if the current working directory cannot be determined
    pub fn rc_file() -> Result<PathBuf, Error> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        Ok(env::current_dir()?.join(RC_FILE_NAME))
    }

    /// Returns the log directory, creating it when it does not exist.
    ///
    /// # Errors
    /// Returns error if directory cannot be created
    pub fn ensure_log_dir(dir: &Path) -> Result<PathBuf, Error> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }

        Ok(dir.to_path_buf())
    }
}
