//! Tree-fetching strategy engine.
//!
//! Resolves one view request against the network and/or the cache
//! according to a [`Strategy`], collecting one [`BeagleError`] per failed
//! source. Accepted trees are handed to the caller's `on_change_tree`
//! callback raw (not yet identified).

mod strategy;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::{CacheLookup, CacheStore};
use crate::error::{BeagleError, FetchErrors, SerializableResponse};
use crate::network::{HttpClient, HttpMethod, HttpRequest};
use crate::tree::Tree;

pub use strategy::Strategy;

/// Receives every tree accepted for a request. `cache-first` may call it a
/// second time, after the load already returned.
pub type OnChangeTree = Arc<dyn Fn(Tree) + Send + Sync>;

/// One view request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub strategy: Strategy,
    /// Persist network results for strategies that use the cache.
    pub should_save_cache: bool,
}

impl LoadRequest {
    pub fn new(url: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            url: url.into(),
            method: HttpMethod::Get,
            headers: BTreeMap::new(),
            strategy,
            should_save_cache: true,
        }
    }
}

/// Tree fetched from the network plus the server's cache hint.
struct NetworkTree {
    tree: Tree,
    max_age_seconds: Option<u64>,
}

/// Executes load strategies over an injected transport and cache.
#[derive(Clone)]
pub struct TreeLoader {
    http: Arc<dyn HttpClient>,
    cache: CacheStore,
}

impl TreeLoader {
    pub fn new(http: Arc<dyn HttpClient>, cache: CacheStore) -> Self {
        Self { http, cache }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Runs `request.strategy`.
    ///
    /// Returns once `on_change_tree` has received the accepted tree, or fails
    /// with every error collected along the way, in attempt order. Never
    /// retries.
    pub async fn load(
        &self,
        request: &LoadRequest,
        on_change_tree: OnChangeTree,
    ) -> Result<(), FetchErrors> {
        tracing::debug!(url = %request.url, strategy = %request.strategy, "Loading view tree");
        let key = self
            .cache
            .signature(&request.url, request.method, &request.headers);

        let result = match request.strategy {
            Strategy::NetworkOnly => {
                let fetched = self.from_network(request).await.map_err(|e| vec![e])?;
                on_change_tree(fetched.tree);
                Ok(())
            }

            Strategy::CacheOnly => {
                let tree = self.from_cache(&key, &request.url).map_err(|e| vec![e])?;
                on_change_tree(tree);
                Ok(())
            }

            Strategy::NetworkWithFallbackToCache => match self.from_network(request).await {
                Ok(fetched) => {
                    self.save(request, &key, &fetched);
                    on_change_tree(fetched.tree);
                    Ok(())
                }
                Err(network_error) => {
                    let tree = self
                        .from_cache(&key, &request.url)
                        .map_err(|cache_error| vec![network_error, cache_error])?;
                    on_change_tree(tree);
                    Ok(())
                }
            },

            Strategy::CacheWithFallbackToNetwork => match self.from_cache(&key, &request.url) {
                Ok(tree) => {
                    on_change_tree(tree);
                    Ok(())
                }
                Err(cache_error) => self
                    .network_after_cache_miss(request, &key, cache_error, on_change_tree)
                    .await,
            },

            Strategy::CacheFirst => match self.cache.read(&key) {
                CacheLookup::Fresh(tree) => {
                    on_change_tree(tree);
                    Ok(())
                }
                CacheLookup::Expired(tree) => {
                    on_change_tree(tree);
                    self.refresh_in_background(request.clone(), key, on_change_tree);
                    Ok(())
                }
                CacheLookup::Missing => {
                    let cache_error = BeagleError::cache(&request.url);
                    self.network_after_cache_miss(request, &key, cache_error, on_change_tree)
                        .await
                }
            },
        };
        result.map_err(FetchErrors::from)
    }

    async fn network_after_cache_miss(
        &self,
        request: &LoadRequest,
        key: &str,
        cache_error: BeagleError,
        on_change_tree: OnChangeTree,
    ) -> Result<(), Vec<BeagleError>> {
        match self.from_network(request).await {
            Ok(fetched) => {
                self.save(request, key, &fetched);
                on_change_tree(fetched.tree);
                Ok(())
            }
            Err(network_error) => Err(vec![cache_error, network_error]),
        }
    }

    /// Fetches a fresh tree without blocking the caller. The result is
    /// delivered through `on_change_tree` and saved; failures are logged.
    fn refresh_in_background(&self, request: LoadRequest, key: String, on_change_tree: OnChangeTree) {
        let loader = self.clone();
        tokio::spawn(async move {
            match loader.from_network(&request).await {
                Ok(fetched) => {
                    loader.save(&request, &key, &fetched);
                    tracing::debug!(url = %request.url, "Background refresh delivered a new tree");
                    on_change_tree(fetched.tree);
                }
                Err(e) => {
                    tracing::warn!(url = %request.url, error = %e, "Background refresh failed");
                }
            }
        });
    }

    async fn from_network(&self, request: &LoadRequest) -> Result<NetworkTree, BeagleError> {
        let http_request = HttpRequest {
            method: request.method,
            headers: request.headers.clone(),
        };

        let response = match self.http.fetch(&request.url, &http_request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "Transport failure");
                return Err(BeagleError::network(&request.url));
            }
        };

        let serializable = || SerializableResponse {
            status: response.status,
            body: response.body.clone(),
        };

        if !response.is_success() {
            tracing::warn!(url = %request.url, status = response.status, "View request failed");
            return Err(BeagleError::Network {
                url: request.url.clone(),
                response: Some(serializable()),
            });
        }

        match Tree::from_json(&response.body) {
            Ok(tree) => Ok(NetworkTree {
                tree,
                max_age_seconds: response.max_age_seconds(),
            }),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "Response is not a view tree");
                Err(BeagleError::Network {
                    url: request.url.clone(),
                    response: Some(serializable()),
                })
            }
        }
    }

    fn from_cache(&self, key: &str, url: &str) -> Result<Tree, BeagleError> {
        match self.cache.read(key) {
            CacheLookup::Fresh(tree) => Ok(tree),
            CacheLookup::Expired(_) => Err(BeagleError::expired_cache(url)),
            CacheLookup::Missing => Err(BeagleError::cache(url)),
        }
    }

    fn save(&self, request: &LoadRequest, key: &str, fetched: &NetworkTree) {
        if request.should_save_cache {
            self.cache.write(key, &fetched.tree, fetched.max_age_seconds);
        }
    }
}
