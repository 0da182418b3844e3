use std::fmt;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result, eyre};
use serde::Deserialize;
use url::Url;

use crate::services::cache::CachePolicy;
use crate::spotify_rs::auth::{ClientCredentials, SPOTIFY_TOKEN_URL};
use crate::spotify_rs::client::SPOTIFY_API_URL;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Clone, Deserialize)]
pub struct SpotifyConfig {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default = "default_auth_url")]
    pub auth_url: Url,
    #[serde(default = "default_api_url")]
    pub api_url: Url,
}

fn default_auth_url() -> Url {
    Url::parse(SPOTIFY_TOKEN_URL).expect("token url constant is valid")
}

fn default_api_url() -> Url {
    Url::parse(SPOTIFY_API_URL).expect("api url constant is valid")
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            auth_url: default_auth_url(),
            api_url: default_api_url(),
        }
    }
}

impl fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("auth_url", &self.auth_url.as_str())
            .field("api_url", &self.api_url.as_str())
            .finish()
    }
}

/// Optional bounds for the result cache. Leaving both unset keeps every
/// result until the cache is cleared.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    pub max_entries: Option<usize>,
    /// Human readable duration, e.g. `"10m"` or `"1h 30m"`
    pub ttl: Option<String>,
}

impl CacheConfig {
    pub fn policy(&self) -> Result<CachePolicy> {
        let ttl = self
            .ttl
            .as_deref()
            .map(humantime::parse_duration)
            .transpose()
            .wrap_err("Invalid cache ttl")?;

        Ok(CachePolicy {
            max_entries: self.max_entries,
            ttl,
        })
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).wrap_err("Invalid config")
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("music-catalog").join("config.toml"))
    }

    /// Load the default config file, falling back to defaults when it doesn't exist
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Credentials given on the command line or environment win over the file.
    pub fn with_client_credentials(
        mut self,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Self {
        if client_id.is_some() {
            self.spotify.client_id = client_id;
        }
        if client_secret.is_some() {
            self.spotify.client_secret = client_secret;
        }
        self
    }

    pub fn client_credentials(&self) -> Result<ClientCredentials> {
        let client_id = self
            .spotify
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| eyre!("Spotify client id is not configured"))?;
        let client_secret = self
            .spotify
            .client_secret
            .clone()
            .filter(|secret| !secret.is_empty())
            .ok_or_else(|| eyre!("Spotify client secret is not configured"))?;

        Ok(ClientCredentials::new(client_id, client_secret))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [spotify]
            client_id = "id"
            client_secret = "secret"
            auth_url = "http://localhost:9000/api/token"
            api_url = "http://localhost:9000/v1"

            [cache]
            max_entries = 256
            ttl = "10m"
            "#,
        )
        .unwrap();

        assert_eq!(config.client_credentials().unwrap().client_id(), "id");
        assert_eq!(config.spotify.auth_url.as_str(), "http://localhost:9000/api/token");
        assert_eq!(config.spotify.api_url.as_str(), "http://localhost:9000/v1");
        assert_eq!(
            config.cache.policy().unwrap(),
            CachePolicy {
                max_entries: Some(256),
                ttl: Some(Duration::from_secs(600)),
            }
        );
    }

    #[test]
    fn test_defaults_point_at_spotify_and_cache_is_unbounded() {
        let config = Config::parse("").unwrap();

        assert_eq!(config.spotify.auth_url.as_str(), SPOTIFY_TOKEN_URL);
        assert_eq!(config.spotify.api_url.as_str(), SPOTIFY_API_URL);
        assert_eq!(config.cache.policy().unwrap(), CachePolicy::default());
    }

    #[test]
    fn test_missing_credentials_are_an_error() {
        let config = Config::parse("[spotify]\nclient_id = \"id\"").unwrap();
        assert!(config.client_credentials().is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let config = Config::parse("[spotify]\nclient_id = \"file-id\"\nclient_secret = \"file-secret\"")
            .unwrap()
            .with_client_credentials(Some("env-id".to_string()), None);

        assert_eq!(config.client_credentials().unwrap().client_id(), "env-id");
        assert_eq!(config.spotify.client_secret.as_deref(), Some("file-secret"));
    }

    #[test]
    fn test_invalid_ttl() {
        let config = Config::parse("[cache]\nttl = \"soon\"").unwrap();
        assert!(config.cache.policy().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::default().with_client_credentials(None, Some("hunter2".to_string()));
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
