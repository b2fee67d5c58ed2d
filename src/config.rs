use crate::constants;
use crate::error::{Result, StickerError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Optional on-disk settings; every key can be overridden from the environment.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub slack_token: Option<String>,
    pub webhook_url: Option<String>,
    pub catalog_url: Option<String>,
    pub catalog_token: Option<String>,
    pub default_size: Option<u32>,
    pub refresh_interval: Option<String>,
    pub alias_db_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub log_dir: Option<PathBuf>,
}

/// Remote libSQL database holding the alias document.
#[derive(Debug, Clone)]
pub struct LibsqlConfig {
    pub url: String,
    pub auth_token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub slack_token: String,
    pub webhook_url: String,
    pub catalog_url: String,
    pub catalog_token: String,
    pub default_size: u32,
    pub refresh_interval: Duration,
    pub alias_db_path: Option<PathBuf>,
    pub libsql: Option<LibsqlConfig>,
    pub port: u16,
    pub log_dir: PathBuf,
}

impl Config {
    /// Loads `.env`, the optional TOML file, then the process environment on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let file = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    StickerError::Config(format!(
                        "Failed to read config file '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                toml::from_str(&content)?
            }
            None => FileConfig::default(),
        };

        Self::from_sources(file, |key| std::env::var(key).ok())
    }

    pub fn from_sources<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let slack_token = required(var("SLACK_TOKEN").or(file.slack_token), "SLACK_TOKEN")?;
        let webhook_url = required(var("WEBHOOK_URL").or(file.webhook_url), "WEBHOOK_URL")?;
        let catalog_token = required(
            var("FOURSQUARE_TOKEN").or(file.catalog_token),
            "FOURSQUARE_TOKEN",
        )?;
        let catalog_url = var("STICKER_API_URL")
            .or(file.catalog_url)
            .unwrap_or_else(|| constants::DEFAULT_CATALOG_URL.to_string());

        let default_size = match var("DEFAULT_SIZE") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                StickerError::Config(format!("DEFAULT_SIZE must be an integer, got '{raw}'"))
            })?,
            None => file.default_size.unwrap_or(constants::DEFAULT_IMAGE_SIZE),
        };

        let refresh_interval = match var("STICKER_REFRESH_INTERVAL").or(file.refresh_interval) {
            Some(raw) => parse_interval(&raw)?,
            None => Duration::from_secs(constants::DEFAULT_REFRESH_INTERVAL_SECS),
        };

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                StickerError::Config(format!("PORT must be a port number, got '{raw}'"))
            })?,
            None => file.port.unwrap_or(constants::DEFAULT_PORT),
        };

        let libsql = match (var("LIBSQL_URL"), var("LIBSQL_AUTH_TOKEN")) {
            (Some(url), Some(auth_token)) => Some(LibsqlConfig { url, auth_token }),
            _ => None,
        };

        Ok(Self {
            slack_token,
            webhook_url,
            catalog_url,
            catalog_token,
            default_size,
            refresh_interval,
            alias_db_path: var("ALIAS_DB_PATH").map(PathBuf::from).or(file.alias_db_path),
            libsql,
            port,
            log_dir: var("LOG_DIR")
                .map(PathBuf::from)
                .or(file.log_dir)
                .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_LOG_DIR)),
        })
    }
}

fn required(value: Option<String>, key: &str) -> Result<String> {
    value.ok_or_else(|| StickerError::Config(format!("{key} is not set")))
}

/// Parses `"90"` (seconds) or a number with an `s`, `m`, `h` or `d` suffix.
pub fn parse_interval(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let invalid = || StickerError::Config(format!("invalid refresh interval '{raw}'"));

    let (digits, multiplier) = match raw.char_indices().last() {
        Some((idx, 's')) => (&raw[..idx], 1),
        Some((idx, 'm')) => (&raw[..idx], 60),
        Some((idx, 'h')) => (&raw[..idx], 60 * 60),
        Some((idx, 'd')) => (&raw[..idx], 24 * 60 * 60),
        Some(_) => (raw, 1),
        None => return Err(invalid()),
    };

    let amount: u64 = digits.trim().parse().map_err(|_| invalid())?;
    if amount == 0 {
        return Err(invalid());
    }
    let secs = amount.checked_mul(multiplier).ok_or_else(invalid)?;
    Ok(Duration::from_secs(secs))
}
