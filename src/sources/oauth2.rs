use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error};

use crate::cache::token::Token;
use crate::config::service::AuthConfig;
use crate::error::{ImportError, ImportResult};
use crate::helpers::time::now;
use crate::observability::metrics::get_metrics;
use crate::sources::credentials::resolve_credentials;
use crate::utils::constants::GRANT_TYPE_CLIENT_CREDENTIALS;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Client-credentials grant against the token endpoint
#[derive(Debug, Clone)]
pub struct OAuth2Source {
    pub auth: AuthConfig,
    pub client: Client,
}

impl OAuth2Source {
    pub fn new(auth: AuthConfig, client: Client) -> Self {
        Self { auth, client }
    }

    pub async fn fetch_token(&self) -> ImportResult<Token> {
        let metrics = get_metrics().await;
        metrics.token_refreshes.inc();

        let token = self.request_token().await.inspect_err(|e| {
            error!(token_url = %self.auth.token_url, error = %e, "token request failed");
            metrics.token_refresh_failures.inc();
        })?;

        metrics.token_expiry_unix.set(token.expires_at.timestamp());
        debug!(expires_at = %token.expires_at, "token fetched");
        Ok(token)
    }

    async fn request_token(&self) -> ImportResult<Token> {
        let credentials =
            resolve_credentials(&self.auth).map_err(|e| ImportError::Auth(e.to_string()))?;

        let form = [
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS),
            ("scope", self.auth.scope.as_str()),
            ("resource", credentials.resource.as_str()),
        ];

        let issued_at = now();
        let response = self
            .client
            .post(&self.auth.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ImportError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ImportError::Auth(format!(
                "token endpoint answered {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ImportError::Auth(e.to_string()))?;
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ImportError::Auth(format!("malformed token response: {}", e)))?;

        if parsed.access_token.trim().is_empty() {
            return Err(ImportError::Auth("token response carries an empty access_token".into()));
        }

        let expires_in = parsed.expires_in;
        Token::issued(parsed.access_token, issued_at, expires_in)
            .ok_or_else(|| ImportError::Auth(format!("expires_in out of range: {}", expires_in)))
    }
}
