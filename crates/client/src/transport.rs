use std::sync::Arc;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use tracing::warn;

use tripdesk_core::GatewayError;

use crate::auth::CredentialProvider;

/// Bearer-authenticated request dispatch with a single refresh-and-replay on 401.
///
/// Requests are described by a builder closure rather than a finished
/// request so the replay gets a fresh body (multipart forms cannot be cloned).
pub struct AuthenticatedTransport {
    client: Client,
    credentials: Arc<dyn CredentialProvider>,
}

impl AuthenticatedTransport {
    pub fn new(client: Client, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { client, credentials }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        &self.credentials
    }

    pub async fn send<F>(&self, operation: &'static str, build: F) -> Result<Response, GatewayError>
    where
        F: Fn(&Client) -> Result<RequestBuilder, GatewayError> + Send + Sync,
    {
        let response = self.dispatch(&build).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        warn!(event_name = "gateway.auth.expired", operation, "access token refused, refreshing once");
        if let Err(error) = self.credentials.refresh().await {
            self.credentials.invalidate().await;
            return Err(GatewayError::Unauthorized { message: error.to_string() });
        }

        let retried = self.dispatch(&build).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!(
                event_name = "gateway.auth.rejected",
                operation, "refreshed token refused, forcing sign-in"
            );
            self.credentials.invalidate().await;
            return Err(GatewayError::Unauthorized {
                message: "credentials rejected after refresh".to_owned(),
            });
        }
        Ok(retried)
    }

    async fn dispatch<F>(&self, build: &F) -> Result<Response, GatewayError>
    where
        F: Fn(&Client) -> Result<RequestBuilder, GatewayError> + Send + Sync,
    {
        let mut request = build(&self.client)?;
        if let Some(token) = self.credentials.access_token().await {
            request = request.bearer_auth(token.expose_secret());
        }
        request.send().await.map_err(|error| GatewayError::Transport(error.to_string()))
    }
}
