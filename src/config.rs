use config::{Config, ConfigError, Environment, File};
use log::info;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Which backend deployment the client talks to
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Development server on localhost
    #[default]
    Local,
    /// Hosted deployment
    Remote,
}

/// Main client configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Backend selection
    #[serde(default)]
    pub backend: Backend,
    /// Base URL of the local backend (without the /api suffix)
    #[serde(default = "default_local_url")]
    pub local_url: String,
    /// Base URL of the remote backend (without the /api suffix)
    #[serde(default = "default_remote_url")]
    pub remote_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Number of results requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Search bar timings
    #[serde(default)]
    pub search: SearchConfig,
    /// How long error banners stay up, in milliseconds
    #[serde(default = "default_error_dismiss_ms")]
    pub error_dismiss_ms: u64,
    /// Search term used when nothing was viewed before
    #[serde(default = "default_search_term")]
    pub default_search_term: String,
    /// Where the last viewed recipe is persisted
    pub storage_path: Option<PathBuf>,
}

/// Timings of the search bar state machine
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Pause in typing before a search is issued
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// How long auto-search stays suppressed after picking a result
    #[serde(default = "default_suppress_ms")]
    pub suppress_ms: u64,
    /// Length of the results panel fade-out
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            suppress_ms: default_suppress_ms(),
            fade_ms: default_fade_ms(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn suppress(&self) -> Duration {
        Duration::from_millis(self.suppress_ms)
    }

    pub fn fade(&self) -> Duration {
        Duration::from_millis(self.fade_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            local_url: default_local_url(),
            remote_url: default_remote_url(),
            timeout: default_timeout(),
            page_size: default_page_size(),
            search: SearchConfig::default(),
            error_dismiss_ms: default_error_dismiss_ms(),
            default_search_term: default_search_term(),
            storage_path: None,
        }
    }
}

// Default value functions
fn default_local_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_remote_url() -> String {
    "https://howtocook-backend-b5cb.onrender.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> u32 {
    10
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_suppress_ms() -> u64 {
    500
}

fn default_fade_ms() -> u64 {
    300
}

fn default_error_dismiss_ms() -> u64 {
    3000
}

fn default_search_term() -> String {
    "酸梅汤".to_string()
}

impl ClientConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with HOWTOCOOK__ prefix
    /// 2. howtocook.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: HOWTOCOOK__SEARCH__DEBOUNCE_MS
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    /// Base URL of the selected backend
    pub fn api_url(&self) -> &str {
        match self.backend {
            Backend::Local => &self.local_url,
            Backend::Remote => &self.remote_url,
        }
    }

    /// Switch between local and remote backend
    pub fn set_backend(&mut self, backend: Backend) {
        self.backend = backend;
        info!(
            "Using {} backend at: {}",
            match backend {
                Backend::Local => "local",
                Backend::Remote => "remote",
            },
            self.api_url()
        );
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn error_dismiss(&self) -> Duration {
        Duration::from_millis(self.error_dismiss_ms)
    }

    /// Resolved location of the last-viewed file
    pub fn storage_file(&self) -> PathBuf {
        self.storage_path.clone().unwrap_or_else(default_storage_path)
    }
}

/// Default location: ~/.howtocook/last_viewed.json
pub fn default_storage_path() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".howtocook").join("last_viewed.json"))
        .unwrap_or_else(|| PathBuf::from("data/last_viewed.json"))
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("howtocook").required(false))
        // Use double underscore for nested: HOWTOCOOK__SEARCH__DEBOUNCE_MS
        .add_source(
            Environment::with_prefix("HOWTOCOOK")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
