use std::collections::BTreeMap;

use crate::config::Config;

/// Tells the backend which platform is asking for the view.
pub const PLATFORM_HEADER: &str = "beagle-platform";

/// Headers sent with every view request, before per-view overrides.
pub fn default_headers(config: &Config) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    if config.use_beagle_headers {
        headers.insert(PLATFORM_HEADER.to_string(), config.platform.clone());
    }
    for (name, value) in &config.network.headers {
        headers.insert(name.to_ascii_lowercase(), value.clone());
    }
    headers
}
