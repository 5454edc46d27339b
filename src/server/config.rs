//! Configuration loading for crestd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag; must exist)
//! 2. `~/.crest/config.toml` (user)
//! 3. `/etc/crest/config.toml` (system)
//!
//! If neither standard file exists, built-in defaults are used.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `--secrets <path>` (CLI flag)
//! 2. `~/.crest/secrets.toml` (user, must be 0600)
//! 3. `/etc/crest/secrets.toml` (system, must be 0600)
//!
//! Missing secrets fall back to `TRUEFOUNDRY_API_KEY`; a missing
//! `[upstream] base_url` falls back to `TRUEFOUNDRY_BASE_URL`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{CacheConfig, Crest, CrestBuilder, CrestError, ResolverConfig, Result};

const API_KEY_ENV: &str = "TRUEFOUNDRY_API_KEY";
const BASE_URL_ENV: &str = "TRUEFOUNDRY_BASE_URL";

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Server network and identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:5003).
    #[serde(default = "default_address")]
    pub address: String,
    /// Service name reported by `/health` (default: crest-agent).
    #[serde(default = "default_service")]
    pub service: String,
    /// Deployment environment reported by `/health` (default: development).
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            service: default_service(),
            environment: default_environment(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:5003".to_string()
}

fn default_service() -> String {
    "crest-agent".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

/// Decision cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Time-to-live in seconds (default: 300).
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// Entry count that triggers a sweep (default: 1000).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_entries() -> usize {
    1_000
}

/// Upstream classifier settings.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// OpenAI-compatible gateway base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model routed through the gateway.
    #[serde(default)]
    pub model: Option<String>,
    /// Per-call timeout in milliseconds (default: 1000).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Cache fallbacks caused by upstream failures (default: true).
    #[serde(default = "default_cache_failures")]
    pub cache_failures: bool,
    /// Age in seconds after which in-flight markers are swept (default: 30).
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: None,
            timeout_ms: default_timeout_ms(),
            cache_failures: default_cache_failures(),
            stale_after_secs: default_stale_after(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    1_000
}

fn default_cache_failures() -> bool {
    true
}

fn default_stale_after() -> u64 {
    30
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub truefoundry: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CrestError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            CrestError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(CrestError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".crest").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/crest/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Gateway base URL, falling back to `TRUEFOUNDRY_BASE_URL`.
    pub fn base_url(&self) -> Option<String> {
        self.upstream
            .base_url
            .clone()
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .filter(|url| !url.is_empty())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .ttl(Duration::from_secs(self.cache.ttl_secs))
            .max_entries(self.cache.max_entries)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig::new()
            .upstream_timeout(Duration::from_millis(self.upstream.timeout_ms))
            .cache_failures(self.upstream.cache_failures)
            .stale_after(Duration::from_secs(self.upstream.stale_after_secs))
    }

    /// Engine builder preloaded from this configuration.
    ///
    /// Live mode is configured only when both an API key and a base URL
    /// are available.
    pub fn engine_builder(&self, secrets: &Secrets) -> CrestBuilder {
        let mut builder = Crest::builder()
            .cache(self.cache_config())
            .resolver(self.resolver_config());

        if let (Some(key), Some(url)) = (secrets.api_key(), self.base_url()) {
            builder = builder.gateway(key, url);
        }
        if let Some(ref model) = self.upstream.model {
            builder = builder.model(model);
        }
        builder
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (the env var may be set).
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            Self::check_permissions(path)?;
            return Self::load_from_file(path);
        }

        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".crest").join("secrets.toml");
            if user_secrets.exists() {
                Self::check_permissions(&user_secrets)?;
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/crest/secrets.toml");
        if system_secrets.exists() {
            Self::check_permissions(&system_secrets)?;
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            CrestError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            CrestError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            CrestError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(CrestError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Gateway API key, falling back to `TRUEFOUNDRY_API_KEY`.
    pub fn api_key(&self) -> Option<String> {
        self.truefoundry
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.is_empty())
    }
}
