//! Control-plane client: fetches a project's shared JWT secret.
//!
//! Construct with [`PlatformClient::new_from_env`], which reads the personal
//! access token from `SUPABASE_ACCESS_TOKEN` (a `.env` file is honoured).

use async_trait::async_trait;
use bucket_sync_core::contract::{ApiError, SigningKeySource};
use reqwest::Client;
use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const ACCESS_TOKEN_ENV: &str = "SUPABASE_ACCESS_TOKEN";

#[derive(Debug, Deserialize)]
struct PostgrestConfig {
    #[serde(default)]
    jwt_secret: Option<String>,
}

pub struct PlatformClient {
    http: Client,
    api_url: String,
    access_token: String,
}

impl PlatformClient {
    pub fn new(
        api_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(PlatformClient {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    pub fn new_from_env(api_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        dotenvy::dotenv().ok();
        match env::var(ACCESS_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => {
                tracing::info!(api_url, "Initialized PlatformClient from environment");
                Self::new(api_url, token.trim(), timeout)
            }
            Ok(_) => {
                tracing::error!("{ACCESS_TOKEN_ENV} is empty");
                Err(format!("{ACCESS_TOKEN_ENV} environment variable is empty").into())
            }
            Err(e) => {
                tracing::error!(error = ?e, "{ACCESS_TOKEN_ENV} missing in environment");
                Err(format!("{ACCESS_TOKEN_ENV} environment variable not set: {e}").into())
            }
        }
    }
}

#[async_trait]
impl SigningKeySource for PlatformClient {
    async fn fetch_jwt_secret(&self, project_ref: &str) -> Result<String, ApiError> {
        let url = format!("{}/v1/projects/{}/postgrest", self.api_url, project_ref);
        tracing::info!(project_ref, "Fetching JWT secret from platform API");

        let resp = match self.http.get(&url).bearer_auth(&self.access_token).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error = ?e, project_ref, "Platform API request failed");
                return Err(Box::new(e));
            }
        };

        let status = resp.status();
        let body = resp.text().await?;
        if status != reqwest::StatusCode::OK {
            tracing::error!(%status, project_ref, "Unexpected status retrieving JWT secret");
            return Err(format!("Unexpected error retrieving JWT secret: {body}").into());
        }

        let config: PostgrestConfig = serde_json::from_str(&body)?;
        Ok(config.jwt_secret.unwrap_or_default())
    }
}
