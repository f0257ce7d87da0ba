use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a view tree may come from, and in which order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Network only. The cache is never read nor written.
    NetworkOnly,
    /// Fresh cache entries only.
    CacheOnly,
    /// Network first; on failure, a fresh cache entry.
    #[default]
    NetworkWithFallbackToCache,
    /// A fresh cache entry first; on failure, the network.
    CacheWithFallbackToNetwork,
    /// Any cache entry, stale ones included, refreshed in the background
    /// when stale. Network only on a cache miss.
    CacheFirst,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NetworkOnly => "network-only",
            Strategy::CacheOnly => "cache-only",
            Strategy::NetworkWithFallbackToCache => "network-with-fallback-to-cache",
            Strategy::CacheWithFallbackToNetwork => "cache-with-fallback-to-network",
            Strategy::CacheFirst => "cache-first",
        }
    }

    pub fn all() -> &'static [Strategy] {
        &[
            Strategy::NetworkOnly,
            Strategy::CacheOnly,
            Strategy::NetworkWithFallbackToCache,
            Strategy::CacheWithFallbackToNetwork,
            Strategy::CacheFirst,
        ]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::all()
            .iter()
            .copied()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| format!("Unknown strategy '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for strategy in Strategy::all() {
            assert_eq!(strategy.as_str().parse::<Strategy>().unwrap(), *strategy);
        }
        assert!("beagle-first".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let strategy: Strategy = serde_json::from_str("\"cache-first\"").unwrap();
        assert_eq!(strategy, Strategy::CacheFirst);
        assert_eq!(
            serde_json::to_string(&Strategy::NetworkWithFallbackToCache).unwrap(),
            "\"network-with-fallback-to-cache\""
        );
    }
}
