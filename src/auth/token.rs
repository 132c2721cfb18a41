//! Client-credentials token exchange

use crate::{Error, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

/// Source of short-lived bearer credentials
///
/// The pool asks for a fresh credential before every tunnel attempt;
/// caching and refresh, if any, live behind the implementation.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Exchange client credentials for an opaque bearer token
    async fn fetch_token(&self) -> Result<String>;
}

/// Token endpoint response body
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// OAuth client-credentials exchange against an HTTP token endpoint
///
/// Sends `grant_type=client_credentials` form-encoded with a Basic
/// authorization header and extracts `access_token` from the JSON response.
pub struct ClientCredentialsProvider {
    token_url: String,
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
}

impl ClientCredentialsProvider {
    /// Create a provider for the given token endpoint
    pub fn new(
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TokenProvider for ClientCredentialsProvider {
    async fn fetch_token(&self) -> Result<String> {
        let basic = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));

        let response = self
            .http
            .post(&self.token_url)
            .header("Authorization", format!("Basic {}", basic))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| Error::CredentialAcquisition(format!("token request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::CredentialAcquisition(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            Error::CredentialAcquisition(format!("malformed token response: {}", e))
        })?;

        body.access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                Error::CredentialAcquisition("response carried no access_token".into())
            })
    }
}
