//! Path management for EmpaMind configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/empamind/          # Config directory
//! ├── config.toml              # Client configuration
//! └── logs/                    # Application logs
//!     └── empamind.log.YYYY-MM-DD
//! ```

use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "empamind";
const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_DIR_NAME: &str = "logs";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for empamind_core::EmpaMindError {
    fn from(err: PathError) -> Self {
        empamind_core::EmpaMindError::config(err.to_string())
    }
}

/// Resolves where EmpaMind keeps its files.
///
/// With a base path (tests, portable installs) everything lives under it;
/// otherwise under `~/.config/empamind`.
#[derive(Debug, Clone, Default)]
pub struct EmpaMindPaths {
    base: Option<PathBuf>,
}

impl EmpaMindPaths {
    pub fn new(base: Option<&Path>) -> Self {
        Self {
            base: base.map(Path::to_path_buf),
        }
    }

    /// Returns the configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf, PathError> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        let home = dirs::home_dir().ok_or(PathError::HomeDirNotFound)?;
        Ok(home.join(".config").join(APP_DIR_NAME))
    }

    /// Returns the path to `config.toml`.
    pub fn config_file(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Returns the directory for rolling log files.
    pub fn log_dir(&self) -> Result<PathBuf, PathError> {
        Ok(self.config_dir()?.join(LOG_DIR_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_path_overrides_home() {
        let paths = EmpaMindPaths::new(Some(Path::new("/tmp/empamind-test")));
        assert_eq!(
            paths.config_file().unwrap(),
            PathBuf::from("/tmp/empamind-test/config.toml")
        );
        assert_eq!(
            paths.log_dir().unwrap(),
            PathBuf::from("/tmp/empamind-test/logs")
        );
    }
}
