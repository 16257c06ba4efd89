//! Client configuration model.
//!
//! Loading (file + environment overrides) lives in the infrastructure crate;
//! this module only defines the shape and defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// Voice processing (transcription + speech synthesis) can take 30-60+ seconds.
pub const DEFAULT_VOICE_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_REVEAL_INTERVAL_MS: u64 = 20;
pub const DEFAULT_DEMO_DELAY_MS: u64 = 1000;

/// Root configuration structure for config.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the chat API. Unset or blank selects demo mode.
    pub api_endpoint: Option<String>,
    /// Identity token sent as the bearer credential.
    pub id_token: Option<String>,
    /// Display name of the signed-in user.
    pub user: Option<String>,
    pub request_timeout_secs: u64,
    pub voice_timeout_secs: u64,
    /// Delay between two steps of a streaming reveal.
    pub reveal_interval_ms: u64,
    /// Simulated latency of the demo transport.
    pub demo_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_endpoint: None,
            id_token: None,
            user: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            voice_timeout_secs: DEFAULT_VOICE_TIMEOUT_SECS,
            reveal_interval_ms: DEFAULT_REVEAL_INTERVAL_MS,
            demo_delay_ms: DEFAULT_DEMO_DELAY_MS,
        }
    }
}

impl ClientConfig {
    /// The endpoint without trailing slashes, if one is configured.
    pub fn endpoint(&self) -> Option<&str> {
        self.api_endpoint
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    /// The identity token, ignoring blank values.
    pub fn token(&self) -> Option<&str> {
        self.id_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn voice_timeout(&self) -> Duration {
        Duration::from_secs(self.voice_timeout_secs)
    }

    pub fn reveal_interval(&self) -> Duration {
        Duration::from_millis(self.reveal_interval_ms)
    }

    pub fn demo_delay(&self) -> Duration {
        Duration::from_millis(self.demo_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_endpoint_is_not_configured() {
        let config = ClientConfig {
            api_endpoint: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), None);
    }

    #[test]
    fn test_endpoint_trailing_slash_is_trimmed() {
        let config = ClientConfig {
            api_endpoint: Some("https://api.example.com/prod/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.endpoint(), Some("https://api.example.com/prod"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str("reveal_interval_ms = 5").unwrap();
        assert_eq!(config.reveal_interval_ms, 5);
        assert_eq!(config.voice_timeout_secs, DEFAULT_VOICE_TIMEOUT_SECS);
        assert_eq!(config.api_endpoint, None);
    }
}
