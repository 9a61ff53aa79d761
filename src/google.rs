use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::GoogleConfig;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
/// Refresh this long before the reported expiry to avoid using a token that
/// dies mid-request.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Startup failure loading the local credential material. Absence or
/// invalidity of either file is fatal for every screen that talks to the
/// spreadsheet or calendar service.
#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("credentials file {0} is missing or unreadable")]
    MissingFile(PathBuf),
    #[error("credentials file {0} is not valid JSON: {1}")]
    InvalidFile(PathBuf, serde_json::Error),
    #[error("token file {0} carries no refresh token")]
    NoRefreshToken(PathBuf),
}

/// OAuth client secrets file, `installed` application flavor.
#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: ClientSecrets,
}

#[derive(Deserialize)]
struct ClientSecrets {
    client_id: String,
    client_secret: String,
}

/// Stored authorization: the authorized-user token file written by the
/// original consent flow. Only the refresh token matters here.
#[derive(Deserialize, Debug)]
struct TokenFile {
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Bearer-token source shared by the sheets and calendar clients. Access
/// tokens are minted by refresh grant and cached until close to expiry.
pub struct GoogleAuth {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    cached: RwLock<Option<CachedToken>>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CredentialsError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|_| CredentialsError::MissingFile(path.to_path_buf()))?;
    serde_json::from_str(&raw).map_err(|e| CredentialsError::InvalidFile(path.to_path_buf(), e))
}

impl GoogleAuth {
    pub fn load(config: &GoogleConfig, http: reqwest::Client) -> Result<Arc<Self>, CredentialsError> {
        let secrets: ClientSecretsFile = read_json(Path::new(&config.credentials_file))?;
        let token: TokenFile = read_json(Path::new(&config.token_file))?;
        let refresh_token = token
            .refresh_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CredentialsError::NoRefreshToken(PathBuf::from(&config.token_file)))?;

        info!("loaded Google credentials from {}", config.credentials_file);
        Ok(Arc::new(Self {
            http,
            client_id: secrets.installed.client_id,
            client_secret: secrets.installed.client_secret,
            refresh_token,
            cached: RwLock::new(None),
        }))
    }

    /// A currently-valid access token, refreshing if the cached one is gone
    /// or about to expire.
    pub async fn bearer_token(&self) -> Result<String> {
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                    return Ok(token.value.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        // another task may have refreshed while we waited for the lock
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(token.value.clone());
            }
        }

        debug!("refreshing Google access token");
        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("token endpoint unreachable")?
            .error_for_status()
            .context("token refresh rejected")?
            .json::<TokenResponse>()
            .await
            .context("malformed token response")?;

        let token = CachedToken {
            value: response.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(response.expires_in),
        };
        *cached = Some(token);
        Ok(response.access_token)
    }
}
