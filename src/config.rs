use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub google: GoogleConfig,
    pub mail: MailConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client secrets file (installed-application flavor).
    pub credentials_file: String,
    /// Stored authorization with the refresh token.
    pub token_file: String,
    pub calendar_id: String,
    pub sheets: SheetIds,
}

/// Spreadsheet ids of the named external sources. Their column layouts are
/// contractual and not under our control.
#[derive(Clone, Debug, Deserialize)]
pub struct SheetIds {
    pub users: String,
    pub applications: String,
    pub cohort1: String,
    pub cohort2: String,
    pub interviews: String,
    pub mentors: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .context("Failed to read config file")?;
        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
