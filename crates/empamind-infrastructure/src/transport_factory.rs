//! Transport strategy selection.
//!
//! The configured-vs-demo decision is made once, here, so the conversation
//! store never branches on it.

use crate::demo_transport::DemoTransport;
use crate::http_transport::HttpChatTransport;
use empamind_core::auth::AuthSession;
use empamind_core::config::ClientConfig;
use empamind_core::transport::ChatTransport;
use std::sync::Arc;

/// Returns the HTTP transport when an endpoint is configured, the demo
/// transport otherwise.
pub fn transport_from_config(
    config: &ClientConfig,
    auth: Arc<dyn AuthSession>,
) -> Arc<dyn ChatTransport> {
    match config.endpoint() {
        Some(endpoint) => {
            tracing::info!("[TransportFactory] Using chat API at {}", endpoint);
            Arc::new(HttpChatTransport::new(
                endpoint,
                auth,
                config.request_timeout(),
                config.voice_timeout(),
            ))
        }
        None => {
            tracing::info!("[TransportFactory] No API endpoint configured, running in demo mode");
            Arc::new(DemoTransport::new(config.demo_delay()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth_session::TokenAuthSession;
    use empamind_core::transport::TransportMode;

    #[test]
    fn test_blank_endpoint_selects_demo() {
        let config = ClientConfig {
            api_endpoint: Some(String::new()),
            ..Default::default()
        };
        let transport = transport_from_config(&config, Arc::new(TokenAuthSession::anonymous()));
        assert_eq!(transport.mode(), TransportMode::Demo);
    }

    #[test]
    fn test_endpoint_selects_http() {
        let config = ClientConfig {
            api_endpoint: Some("https://api.example.com".to_string()),
            ..Default::default()
        };
        let transport = transport_from_config(&config, Arc::new(TokenAuthSession::anonymous()));
        assert_eq!(transport.mode(), TransportMode::Remote);
    }
}
