//! Entry point wiring configuration, transport, cache and views together.

use std::sync::Arc;

use thiserror::Error;

use crate::cache::{CacheStore, FileStorage, Storage};
use crate::config::{Config, ConfigError, ConfigStore};
use crate::context::{ContextSource, GlobalContext};
use crate::fetch::TreeLoader;
use crate::network::{default_headers, HttpClient, ReqwestClient, TransportError, UrlBuilder};
use crate::view::{LifecycleHooks, NetworkOptions, View, ViewParts};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Shared state behind every view of an application.
///
/// Configuration is read when a view is created, so after [`reload`]
/// existing views keep their settings and new views use the new ones.
///
/// [`reload`]: BeagleService::reload
pub struct BeagleService {
    config: ConfigStore,
    http: Arc<dyn HttpClient>,
    storage: Arc<dyn Storage>,
    lifecycles: Arc<LifecycleHooks>,
    global_context: Arc<GlobalContext>,
}

impl BeagleService {
    pub fn new(config: Config, http: Arc<dyn HttpClient>, storage: Arc<dyn Storage>) -> Self {
        Self::with_store(ConfigStore::new(config, Config::config_path()), http, storage)
    }

    pub fn with_store(config: ConfigStore, http: Arc<dyn HttpClient>, storage: Arc<dyn Storage>) -> Self {
        Self {
            config,
            http,
            storage,
            lifecycles: Arc::new(LifecycleHooks::default()),
            global_context: Arc::new(GlobalContext::new()),
        }
    }

    /// Loads the config file (see [`Config::load`]) and builds a service
    /// over `reqwest` and the on-disk cache.
    pub fn load() -> Result<Self, ServiceError> {
        let config = Config::load()?;
        Self::from_store(ConfigStore::new(config, Config::config_path()))
    }

    /// Validates `config` and builds a service over `reqwest` and the
    /// on-disk cache.
    pub fn from_config(config: Config) -> Result<Self, ServiceError> {
        Self::from_store(ConfigStore::new(config, Config::config_path()))
    }

    fn from_store(store: ConfigStore) -> Result<Self, ServiceError> {
        let config = store.get();
        config.validate()?;
        let http = Arc::new(ReqwestClient::new(&config.network)?);
        let storage = Arc::new(FileStorage::new(FileStorage::default_dir()));
        tracing::info!(
            base_url = %config.base_url,
            strategy = %config.strategy,
            "Beagle service ready"
        );
        Ok(Self::with_store(store, http, storage))
    }

    pub fn with_lifecycles(mut self, lifecycles: LifecycleHooks) -> Self {
        self.lifecycles = Arc::new(lifecycles);
        self
    }

    /// Re-reads the config file. On failure the current config is kept.
    pub fn reload(&self) -> Result<(), ServiceError> {
        self.config.reload()?;
        Ok(())
    }

    pub fn create_view(&self, network: NetworkOptions) -> View {
        let config = self.config.get();
        let context: Arc<dyn ContextSource> = self.global_context.clone();
        View::new(ViewParts {
            loader: TreeLoader::new(self.http.clone(), self.cache_for(&config)),
            url_builder: UrlBuilder::new(config.base_url.clone()),
            default_headers: default_headers(&config),
            default_strategy: config.strategy,
            lifecycles: self.lifecycles.clone(),
            root_id: config.root_id,
            network,
            context: Some(context),
            navigator: None,
        })
    }

    pub fn global_context(&self) -> &GlobalContext {
        &self.global_context
    }

    /// Snapshot of the current config.
    pub fn config(&self) -> Config {
        self.config.get()
    }

    /// Cache as configured right now.
    pub fn cache(&self) -> CacheStore {
        self.cache_for(&self.config.get())
    }

    fn cache_for(&self, config: &Config) -> CacheStore {
        CacheStore::new(self.storage.clone(), &config.cache)
    }
}
