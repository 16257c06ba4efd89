//! Infrastructure layer for the EmpaMind client.
//!
//! Concrete collaborators for the traits in `empamind-core`: the HTTP and demo
//! transports, the token auth session, and configuration loading.

pub mod audio_codec;
pub mod auth_session;
pub mod config_service;
pub mod demo_transport;
pub mod http_transport;
pub mod paths;
pub mod transport_factory;

pub use crate::auth_session::TokenAuthSession;
pub use crate::config_service::ConfigService;
pub use crate::demo_transport::DemoTransport;
pub use crate::http_transport::HttpChatTransport;
pub use crate::paths::EmpaMindPaths;
pub use crate::transport_factory::transport_from_config;
