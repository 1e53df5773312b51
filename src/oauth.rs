use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::GoogleConfig;

const CONSENT_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v1/userinfo";
const SCOPE: &str = "openid%20email%20profile";

/// Profile the provider vouches for after a successful exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct Profile {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("identity provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("identity provider rejected the exchange: {0}")]
    Exchange(String),
}

/// Exchanges a provider authorization code for a verified profile.
/// Injected so handlers never speak HTTP to the provider directly.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn auth_url(&self, redirect_uri: &str) -> String;
    async fn exchange_for_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Profile, ProviderError>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

pub struct GoogleProvider {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
}

impl GoogleProvider {
    pub fn new(config: &GoogleConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn auth_url(&self, redirect_uri: &str) -> String {
        format!(
            "{CONSENT_ENDPOINT}?client_id={}&redirect_uri={redirect_uri}&response_type=code&scope={SCOPE}",
            self.client_id
        )
    }

    #[instrument(skip(self, code))]
    async fn exchange_for_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Profile, ProviderError> {
        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .json(&TokenRequest {
                code,
                client_id: &self.client_id,
                client_secret: &self.client_secret,
                redirect_uri,
                grant_type: "authorization_code",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(ProviderError::Exchange(body));
        }
        let token: TokenResponse = response.json().await?;
        debug!("authorization code exchanged");

        let response = self
            .http
            .get(USERINFO_ENDPOINT)
            .bearer_auth(&token.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Exchange(format!(
                "userinfo returned {}",
                response.status()
            )));
        }
        Ok(response.json::<Profile>().await?)
    }
}
