//! Configuration module for handling environment variables and .env files

use crate::client::Credentials;
use crate::models::submission::DEFAULT_MEDIA_URL_SUFFIXES;
use log::info;
use std::env;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => {
                write!(f, "{} environment variable must be set", key)
            }
            ConfigError::Invalid { key, value } => {
                write!(f, "{} has an invalid value: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Application configuration derived from environment variables and .env file
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // Reddit API credentials
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,

    // Inbound API settings
    pub api_host: String,
    pub api_port: u16,
    pub authorization_header_name: Option<String>,
    pub authorization_header_value: Option<String>,

    // Defaults for routes that leave them out
    pub default_subreddit: String,
    pub default_load_count: u32,

    pub media_url_suffixes: Vec<String>,
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load .env file, but continue even if it doesn't exist
        match dotenv::dotenv() {
            Ok(_) => info!("Loaded environment from .env file"),
            Err(_) => info!("No .env file found, using system environment variables only"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration after reading an explicit env file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        match dotenv::from_path(path) {
            Ok(_) => info!("Loaded environment from {}", path.display()),
            Err(e) => info!("Could not read {}: {}", path.display(), e),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup, the environment in production
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let api_port = match get("API_PORT") {
            Some(port) => port.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                key: "API_PORT",
                value: port,
            })?,
            None => 8080,
        };

        let default_load_count = match get("DEFAULT_LOAD_COUNT") {
            Some(count) => match count.trim().parse::<u32>() {
                Ok(count) if count > 0 => count,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "DEFAULT_LOAD_COUNT",
                        value: count,
                    })
                }
            },
            None => 25,
        };

        let media_url_suffixes = match get("REDDIT_MEDIA_URL_SUFFIXES") {
            Some(suffixes) => suffixes
                .split(',')
                .map(|suffix| suffix.trim().to_string())
                .filter(|suffix| !suffix.is_empty())
                .collect(),
            None => DEFAULT_MEDIA_URL_SUFFIXES
                .iter()
                .map(|suffix| suffix.to_string())
                .collect(),
        };

        Ok(Self {
            client_id: require("REDDIT_CLIENT_ID")?,
            client_secret: require("REDDIT_CLIENT_SECRET")?,
            user_agent: require("REDDIT_USER_AGENT")?,
            api_host: get("API_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            api_port,
            authorization_header_name: get("API_AUTHORIZATION_HEADER_NAME"),
            authorization_header_value: get("API_AUTHORIZATION_HEADER_VALUE"),
            default_subreddit: get("DEFAULT_SUBREDDIT").unwrap_or_else(|| "all".to_string()),
            default_load_count,
            media_url_suffixes,
        })
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.client_id, &self.client_secret, &self.user_agent)
    }

    /// Expected header name and value, only when both are configured
    pub fn authorization_header(&self) -> Option<(&str, &str)> {
        match (
            self.authorization_header_name.as_deref(),
            self.authorization_header_value.as_deref(),
        ) {
            (Some(name), Some(value)) => Some((name, value)),
            _ => None,
        }
    }
}
