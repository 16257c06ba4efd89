//! Configuration loading.
//!
//! Priority: environment variables > `~/.config/empamind/config.toml` > defaults.

use crate::paths::EmpaMindPaths;
use empamind_core::config::ClientConfig;
use empamind_core::{EmpaMindError, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_API_ENDPOINT: &str = "EMPAMIND_API_ENDPOINT";
pub const ENV_ID_TOKEN: &str = "EMPAMIND_ID_TOKEN";
pub const ENV_USER: &str = "EMPAMIND_USER";

/// Loads [`ClientConfig`] from disk and the environment.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the default location (`~/.config/empamind/config.toml`).
    pub fn new_default() -> Result<Self> {
        let path = EmpaMindPaths::default().config_file()?;
        Ok(Self { path })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file and applies process environment overrides.
    pub fn load(&self) -> Result<ClientConfig> {
        let mut config = self.load_file()?;
        apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads only the file. A missing or empty file yields defaults.
    pub fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(
                "[ConfigService] No config file at {}, using defaults",
                self.path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| {
            EmpaMindError::config(format!(
                "Failed to read configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if content.trim().is_empty() {
            return Ok(ClientConfig::default());
        }

        toml::from_str(&content).map_err(|e| {
            EmpaMindError::config(format!(
                "Failed to parse configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Overrides file values with non-empty environment values.
///
/// `lookup` abstracts `std::env::var` so the precedence rules can be tested
/// without touching the process environment.
pub fn apply_env_overrides<F>(config: &mut ClientConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(endpoint) = non_empty(ENV_API_ENDPOINT) {
        config.api_endpoint = Some(endpoint);
    }
    if let Some(token) = non_empty(ENV_ID_TOKEN) {
        config.id_token = Some(token);
    }
    if let Some(user) = non_empty(ENV_USER) {
        config.user = Some(user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_service_points_at_standard_config_file() {
        let service = ConfigService::new_default();
        match EmpaMindPaths::default().config_file() {
            Ok(expected) => {
                let service = service.unwrap();
                assert_eq!(service.path(), expected.as_path());
                assert!(service.path().ends_with("empamind/config.toml"));
            }
            Err(_) => assert!(service.is_err()),
        }
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));

        let config = service.load_file().expect("Should fall back to defaults");
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_load_file_reads_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            "api_endpoint = \"https://api.example.com/prod\"\nvoice_timeout_secs = 120\n",
        )
        .unwrap();

        let config = ConfigService::with_path(&path).load_file().unwrap();
        assert_eq!(config.endpoint(), Some("https://api.example.com/prod"));
        assert_eq!(config.voice_timeout_secs, 120);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "api_endpoint = [").unwrap();

        let err = ConfigService::with_path(&path).load_file().unwrap_err();
        assert!(matches!(err, EmpaMindError::Config(_)));
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = ClientConfig {
            api_endpoint: Some("https://file.example.com".to_string()),
            user: Some("file-user".to_string()),
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [
            (ENV_API_ENDPOINT, "https://env.example.com"),
            (ENV_ID_TOKEN, "token-123"),
            (ENV_USER, "  "),
        ]
        .into_iter()
        .collect();

        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.endpoint(), Some("https://env.example.com"));
        assert_eq!(config.token(), Some("token-123"));
        // Blank env values do not clobber the file
        assert_eq!(config.user.as_deref(), Some("file-user"));
    }
}
