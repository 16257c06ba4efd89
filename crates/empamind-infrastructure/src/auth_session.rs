//! Token-based authentication session.
//!
//! The identity provider issues the token elsewhere (browser sign-in, CLI
//! login); this session only holds it and hands it to the transport.

use empamind_core::auth::{AuthSession, UserIdentity};
use empamind_core::config::ClientConfig;
use tokio::sync::RwLock;

const DEFAULT_USERNAME: &str = "user";

#[derive(Debug, Clone)]
struct SignedIn {
    user: UserIdentity,
    token: Option<String>,
}

/// An [`AuthSession`] backed by an in-memory token.
#[derive(Debug, Default)]
pub struct TokenAuthSession {
    state: RwLock<Option<SignedIn>>,
}

impl TokenAuthSession {
    /// A session with nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session signed in as `user` with an optional bearer token.
    pub fn signed_in(user: UserIdentity, token: Option<String>) -> Self {
        Self {
            state: RwLock::new(Some(SignedIn { user, token })),
        }
    }

    /// Signs in when the configuration carries an identity token.
    pub fn from_config(config: &ClientConfig) -> Self {
        match config.token() {
            Some(token) => {
                let username = config
                    .user
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(DEFAULT_USERNAME)
                    .to_string();
                let user = UserIdentity {
                    user_id: username.clone(),
                    username,
                };
                Self::signed_in(user, Some(token.to_string()))
            }
            None => Self::anonymous(),
        }
    }

    pub async fn sign_in(&self, user: UserIdentity, token: Option<String>) {
        tracing::info!("[TokenAuthSession] Signed in as {}", user.username);
        *self.state.write().await = Some(SignedIn { user, token });
    }

    pub async fn sign_out(&self) {
        if self.state.write().await.take().is_some() {
            tracing::info!("[TokenAuthSession] Signed out");
        }
    }
}

#[async_trait::async_trait]
impl AuthSession for TokenAuthSession {
    async fn current_user(&self) -> Option<UserIdentity> {
        self.state.read().await.as_ref().map(|s| s.user.clone())
    }

    async fn bearer_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .as_ref()
            .and_then(|s| s.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_from_config_without_token_is_anonymous() {
        let session = TokenAuthSession::from_config(&ClientConfig::default());
        assert!(!session.is_authenticated().await);
        assert_eq!(session.bearer_token().await, None);
    }

    #[tokio::test]
    async fn test_from_config_with_token_signs_in() {
        let config = ClientConfig {
            id_token: Some("abc.def.ghi".to_string()),
            user: Some("sam@example.com".to_string()),
            ..Default::default()
        };
        let session = TokenAuthSession::from_config(&config);

        let user = session.current_user().await.expect("Should be signed in");
        assert_eq!(user.username, "sam@example.com");
        assert_eq!(session.bearer_token().await.as_deref(), Some("abc.def.ghi"));
    }

    #[tokio::test]
    async fn test_sign_out_clears_token() {
        let session = TokenAuthSession::signed_in(
            UserIdentity {
                user_id: "u1".to_string(),
                username: "u1".to_string(),
            },
            Some("t".to_string()),
        );

        session.sign_out().await;

        assert!(!session.is_authenticated().await);
        assert_eq!(session.bearer_token().await, None);
    }
}
