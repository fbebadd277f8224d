use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use tripdesk_core::GatewayError;

use crate::envelope::decode_response;

/// Source of the bearer credential attached to every backend call.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Option<SecretString>;

    /// Obtains a fresh access token.
    async fn refresh(&self) -> Result<(), GatewayError>;

    /// Drops all credentials; the operator has to sign in again.
    async fn invalidate(&self);
}

/// A fixed access token with no way to renew it.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    token: RwLock<Option<SecretString>>,
}

impl StaticCredentials {
    pub fn new(token: Option<SecretString>) -> Self {
        Self { token: RwLock::new(token) }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentials {
    async fn access_token(&self) -> Option<SecretString> {
        self.token.read().await.clone()
    }

    async fn refresh(&self) -> Result<(), GatewayError> {
        Err(GatewayError::Unauthorized { message: "no refresh token configured".to_owned() })
    }

    async fn invalidate(&self) {
        self.token.write().await.take();
    }
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
}

/// Access token renewed through `POST /auth/refresh`.
pub struct RefreshingCredentials {
    client: Client,
    refresh_url: String,
    access_token: RwLock<Option<SecretString>>,
    refresh_token: RwLock<Option<SecretString>>,
}

impl RefreshingCredentials {
    pub fn new(
        client: Client,
        base_url: &str,
        access_token: Option<SecretString>,
        refresh_token: SecretString,
    ) -> Self {
        Self {
            client,
            refresh_url: format!("{}/auth/refresh", base_url.trim_end_matches('/')),
            access_token: RwLock::new(access_token),
            refresh_token: RwLock::new(Some(refresh_token)),
        }
    }
}

#[async_trait]
impl CredentialProvider for RefreshingCredentials {
    async fn access_token(&self) -> Option<SecretString> {
        self.access_token.read().await.clone()
    }

    async fn refresh(&self) -> Result<(), GatewayError> {
        let refresh_token = self.refresh_token.read().await.clone().ok_or_else(|| {
            GatewayError::Unauthorized { message: "signed out: no refresh token".to_owned() }
        })?;

        let response = self
            .client
            .post(&self.refresh_url)
            .json(&RefreshRequest { refresh_token: refresh_token.expose_secret() })
            .send()
            .await
            .map_err(|error| GatewayError::Transport(error.to_string()))?;
        let status = response.status().as_u16();
        let body =
            response.bytes().await.map_err(|error| GatewayError::Transport(error.to_string()))?;

        let payload: RefreshResponse =
            decode_response(status, &body, "Failed to refresh token").map_err(|error| {
                warn!(
                    event_name = "gateway.auth.refresh_failed",
                    status,
                    error = %error,
                    "token refresh rejected"
                );
                GatewayError::Unauthorized { message: error.to_string() }
            })?;

        *self.access_token.write().await = Some(SecretString::from(payload.access_token));
        info!(event_name = "gateway.auth.refreshed", "access token refreshed");
        Ok(())
    }

    async fn invalidate(&self) {
        self.access_token.write().await.take();
        self.refresh_token.write().await.take();
    }
}
