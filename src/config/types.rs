use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fetch::Strategy;
use crate::tree::DEFAULT_ROOT_ID;

/// Root configuration container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL of the backend serving the views (e.g., "https://views.example.com").
    pub base_url: String,
    /// Default fetch strategy for views that don't pick one.
    #[serde(default)]
    pub strategy: Strategy,
    /// Whether to send the `beagle-platform` header with every view request.
    #[serde(default = "default_use_beagle_headers")]
    pub use_beagle_headers: bool,
    /// Value of the `beagle-platform` header.
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Id given to a view's root node when the backend sends none.
    #[serde(default = "default_root_id")]
    pub root_id: String,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Age after which a cached view is considered expired (default: 300).
    #[serde(default = "default_max_age")]
    pub max_age_seconds: u64,
    /// Prefix for every storage key.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

/// Transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
    /// Extra headers sent with every view request.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_use_beagle_headers() -> bool {
    true
}

fn default_platform() -> String {
    "WEB".to_string()
}

fn default_root_id() -> String {
    DEFAULT_ROOT_ID.to_string()
}

fn default_max_age() -> u64 {
    300
}

fn default_namespace() -> String {
    "@beagle-web/cache".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_connect_timeout() -> u32 {
    5
}

impl Config {
    /// Config with defaults everywhere except the backend URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            strategy: Strategy::default(),
            use_beagle_headers: default_use_beagle_headers(),
            platform: default_platform(),
            root_id: default_root_id(),
            cache: CacheConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_seconds: default_max_age(),
            namespace: default_namespace(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            headers: BTreeMap::new(),
        }
    }
}
