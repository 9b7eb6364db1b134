//! Client configuration from environment variables.

use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default backend origin.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Id of the tag the backend seeds for favorites.
pub const DEFAULT_FAVORITES_TAG_ID: &str = "favorite-tag-id";

pub const DEFAULT_FAVORITES_TAG_NAME: &str = "Favorite";

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Wait between import job status checks.
pub const DEFAULT_IMPORT_POLL_MS: u64 = 5000;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
}

/// The reserved tag that marks a recipe as a favorite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesTag {
    pub id: String,
    pub name: String,
}

impl Default for FavoritesTag {
    fn default() -> Self {
        Self {
            id: DEFAULT_FAVORITES_TAG_ID.to_string(),
            name: DEFAULT_FAVORITES_TAG_NAME.to_string(),
        }
    }
}

/// Client configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin; API paths are joined under `/api`.
    pub base_url: Url,
    pub favorites: FavoritesTag,
    pub page_size: u32,
    pub import_poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("Invalid default API URL"),
            favorites: FavoritesTag::default(),
            page_size: DEFAULT_PAGE_SIZE,
            import_poll_interval: Duration::from_millis(DEFAULT_IMPORT_POLL_MS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `RECIPEBOX_API_URL`: Backend origin (default: "http://localhost:8080")
    /// - `RECIPEBOX_FAVORITES_TAG_ID`: Reserved favorites tag id (default: "favorite-tag-id")
    /// - `RECIPEBOX_FAVORITES_TAG_NAME`: Its display name (default: "Favorite")
    /// - `RECIPEBOX_PAGE_SIZE`: Recipes per page (default: 10)
    /// - `RECIPEBOX_IMPORT_POLL_MS`: Import status poll interval (default: 5000)
    /// - `RECIPEBOX_TIMEOUT_SECS`: HTTP request timeout (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = env::var("RECIPEBOX_API_URL") {
            config.base_url = parse_base_url(&url)?;
        }

        if let Ok(id) = env::var("RECIPEBOX_FAVORITES_TAG_ID") {
            config.favorites.id = id;
        }
        if let Ok(name) = env::var("RECIPEBOX_FAVORITES_TAG_NAME") {
            config.favorites.name = name;
        }

        if let Some(size) = parse_env::<u32>("RECIPEBOX_PAGE_SIZE")? {
            if size == 0 {
                return Err(ConfigError::InvalidValue {
                    var: "RECIPEBOX_PAGE_SIZE".to_string(),
                    reason: "must be positive".to_string(),
                });
            }
            config.page_size = size;
        }

        if let Some(ms) = parse_env::<u64>("RECIPEBOX_IMPORT_POLL_MS")? {
            config.import_poll_interval = Duration::from_millis(ms);
        }

        if let Some(secs) = parse_env::<u64>("RECIPEBOX_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Replace the backend origin.
    pub fn with_base_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(url)?;
        Ok(self)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        var: "RECIPEBOX_API_URL".to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidValue {
            var: "RECIPEBOX_API_URL".to_string(),
            reason: format!("{} cannot be used as a base URL", raw),
        });
    }
    Ok(url)
}

fn parse_env<T: std::str::FromStr>(var: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var: var.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.favorites.id, "favorite-tag-id");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.import_poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_with_base_url_rejects_garbage() {
        assert!(ClientConfig::default().with_base_url("not a url").is_err());
        assert!(ClientConfig::default()
            .with_base_url("mailto:someone@example.com")
            .is_err());

        let config = ClientConfig::default()
            .with_base_url("https://recipes.example.com")
            .unwrap();
        assert_eq!(config.base_url.host_str(), Some("recipes.example.com"));
    }
}
