//! View-tree lifecycle manager.
//!
//! A [`View`] owns one rendered tree. Every change goes through the same
//! pipeline:
//!
//! ```text
//! raw ─→ beforeStart ─→ merge at anchor ─→ identify ─→ beforeViewSnapshot
//!     ─→ snapshot ─→ afterViewSnapshot ─→ beforeRender ─→ current ─→ listeners
//! ```
//!
//! The snapshot is the merge base for partial updates. The current tree is
//! what listeners and [`View::get_tree`] see. Each of them gets its own
//! clone.

mod lifecycle;
pub(crate) mod listeners;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use thiserror::Error;

use crate::context::ContextSource;
use crate::error::{BeagleError, FetchErrors};
use crate::fetch::{LoadRequest, OnChangeTree, Strategy, TreeLoader};
use crate::network::{HttpMethod, UrlBuilder};
use crate::tree::{identify, insert, InsertionMode, Tree, TreeError};

pub use lifecycle::{Lifecycle, LifecycleHook, LifecycleHooks};
pub use listeners::Subscription;

/// Component rendered while a fetch is pending, unless overridden.
pub const DEFAULT_LOADING_COMPONENT: &str = "custom:loading";
/// Component rendered when a fetch fails and `show_error` is set.
pub const DEFAULT_ERROR_COMPONENT: &str = "custom:error";
pub const LOADING_ID: &str = "loading";
pub const ERROR_ID: &str = "error";

type Listener = dyn Fn(Tree) + Send + Sync;
type ErrorListener = dyn Fn(&[BeagleError]) + Send + Sync;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("View has been destroyed")]
    Destroyed,
}

/// Navigation stack owned by a view. Only its teardown matters here.
pub trait Navigator: Send + Sync {
    fn destroy(&self);
}

/// Per-view request defaults, applied under each fetch's own parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkOptions {
    pub method: Option<HttpMethod>,
    pub headers: BTreeMap<String, String>,
    pub strategy: Option<Strategy>,
}

/// Parameters of [`View::fetch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadParams {
    /// Path relative to the base URL, or an absolute URL.
    pub path: String,
    pub base_url: Option<String>,
    pub method: Option<HttpMethod>,
    pub headers: BTreeMap<String, String>,
    pub strategy: Option<Strategy>,
    /// Render a loading placeholder at the anchor while fetching.
    /// Deprecated.
    pub show_loading: bool,
    /// Render an error placeholder at the anchor when the fetch fails.
    pub show_error: bool,
    pub loading_component: Option<String>,
    pub error_component: Option<String>,
    /// Rendered as a full tree when the fetch fails.
    pub fallback: Option<Tree>,
}

impl LoadParams {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_loading(mut self) -> Self {
        self.show_loading = true;
        self
    }

    pub fn with_error(mut self) -> Self {
        self.show_error = true;
        self
    }

    pub fn with_fallback(mut self, fallback: Tree) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// Everything a view is built from.
pub struct ViewParts {
    pub loader: TreeLoader,
    pub url_builder: UrlBuilder,
    /// Headers sent with every request (already lower-cased).
    pub default_headers: BTreeMap<String, String>,
    pub default_strategy: Strategy,
    pub lifecycles: Arc<LifecycleHooks>,
    /// Id for root nodes that declare none.
    pub root_id: String,
    pub network: NetworkOptions,
    /// Upstream source the view follows until destroyed.
    pub context: Option<Arc<dyn ContextSource>>,
    pub navigator: Option<Box<dyn Navigator>>,
}

#[derive(Default)]
struct ViewState {
    snapshot: Option<Tree>,
    current: Option<Tree>,
}

struct ViewInner {
    id: String,
    state: Mutex<ViewState>,
    listeners: listeners::ListenerSet<Listener>,
    error_listeners: listeners::ListenerSet<ErrorListener>,
    destroyed: AtomicBool,
    loader: TreeLoader,
    url_builder: UrlBuilder,
    default_headers: BTreeMap<String, String>,
    default_strategy: Strategy,
    lifecycles: Arc<LifecycleHooks>,
    root_id: String,
    network: NetworkOptions,
    navigator: Mutex<Option<Box<dyn Navigator>>>,
    context_subscription: Mutex<Option<Subscription>>,
}

/// Handle to a view. Clones share the same tree and listeners.
#[derive(Clone)]
pub struct View {
    inner: Arc<ViewInner>,
}

impl View {
    pub fn new(parts: ViewParts) -> Self {
        let view = View {
            inner: Arc::new(ViewInner {
                id: uuid::Uuid::new_v4().to_string(),
                state: Mutex::new(ViewState::default()),
                listeners: listeners::ListenerSet::new(),
                error_listeners: listeners::ListenerSet::new(),
                destroyed: AtomicBool::new(false),
                loader: parts.loader,
                url_builder: parts.url_builder,
                default_headers: parts.default_headers,
                default_strategy: parts.default_strategy,
                lifecycles: parts.lifecycles,
                root_id: parts.root_id,
                network: parts.network,
                navigator: Mutex::new(parts.navigator),
                context_subscription: Mutex::new(None),
            }),
        };

        if let Some(context) = parts.context {
            let weak = Arc::downgrade(&view.inner);
            let subscription = context.subscribe(Arc::new(move || {
                if let Some(view) = View::upgrade(&weak) {
                    view.rerender();
                }
            }));
            *view.inner.context_subscription.lock() = Some(subscription);
        }

        tracing::debug!(view = %view.inner.id, "View created");
        view
    }

    fn upgrade(weak: &Weak<ViewInner>) -> Option<View> {
        weak.upgrade().map(|inner| View { inner })
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    /// Registers a listener called with a fresh clone of every new tree.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Tree) + Send + Sync + 'static,
    {
        self.inner.listeners.add(Arc::new(listener))
    }

    /// Registers a listener for failed fetches. While at least one is
    /// registered, failures are not logged.
    pub fn add_error_listener<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[BeagleError]) + Send + Sync + 'static,
    {
        self.inner.error_listeners.add(Arc::new(listener))
    }

    /// Clone of the current tree.
    pub fn get_tree(&self) -> Option<Tree> {
        self.inner.state.lock().current.clone()
    }

    /// Hands ownership of a navigator to the view; it is destroyed with it.
    pub fn attach_navigator(&self, navigator: Box<dyn Navigator>) {
        let previous = self.inner.navigator.lock().replace(navigator);
        if let Some(previous) = previous {
            previous.destroy();
        }
    }

    /// Renders `raw` as the whole view. Empty trees are ignored.
    pub fn do_full_render(&self, raw: Tree) {
        if self.is_destroyed() {
            tracing::debug!(view = %self.inner.id, "Ignoring render on destroyed view");
            return;
        }
        if raw.is_empty() {
            return;
        }
        let tree = self.inner.lifecycles.run(Lifecycle::BeforeStart, raw);
        self.render(tree);
    }

    /// Merges `raw` into the current view at `anchor` (the root when
    /// `None`). With `Append`/`Prepend` the anchor is the parent.
    pub fn update_with_tree(
        &self,
        raw: Tree,
        anchor: Option<&str>,
        mode: InsertionMode,
    ) -> Result<(), ViewError> {
        if self.is_destroyed() {
            return Err(ViewError::Destroyed);
        }
        let base = self.inner.state.lock().snapshot.clone();
        self.merge_and_render(base, raw, anchor, mode)
    }

    /// Loads a tree and merges it at `anchor` according to `mode`.
    ///
    /// Failures never escape: they end in a fallback render, an error
    /// placeholder, the error listeners, or the log.
    pub async fn fetch(&self, params: LoadParams, anchor: Option<&str>, mode: InsertionMode) {
        let request = self.build_request(&params);
        let base = self.inner.state.lock().snapshot.clone();

        if params.show_loading {
            let component = params
                .loading_component
                .clone()
                .unwrap_or_else(|| DEFAULT_LOADING_COMPONENT.to_string());
            let placeholder = Tree::new(component).with_id(LOADING_ID);
            if let Err(e) = self.merge_and_render(base.clone(), placeholder, anchor, mode) {
                tracing::warn!(view = %self.inner.id, error = %e, "Failed to render loading placeholder");
            }
        }

        let on_change_tree = self.on_change_tree(base.clone(), anchor, mode);
        if let Err(errors) = self.inner.loader.load(&request, on_change_tree).await {
            self.recover(&params, base, anchor, mode);
            self.deliver_errors(&errors);
        }
    }

    /// Releases the context subscription, listeners and navigator.
    /// Later deliveries from pending fetches are dropped.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }

        let subscription = self.inner.context_subscription.lock().take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }

        self.inner.listeners.clear();
        self.inner.error_listeners.clear();

        let navigator = self.inner.navigator.lock().take();
        if let Some(navigator) = navigator {
            navigator.destroy();
        }

        tracing::debug!(view = %self.inner.id, "View destroyed");
    }

    fn build_request(&self, params: &LoadParams) -> LoadRequest {
        let network = &self.inner.network;
        let mut headers = self.inner.default_headers.clone();
        for (name, value) in network.headers.iter().chain(params.headers.iter()) {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }

        LoadRequest {
            url: self
                .inner
                .url_builder
                .build(&params.path, params.base_url.as_deref()),
            method: params.method.or(network.method).unwrap_or_default(),
            headers,
            strategy: params
                .strategy
                .or(network.strategy)
                .unwrap_or(self.inner.default_strategy),
            should_save_cache: true,
        }
    }

    /// Every delivery is merged into `base`, the snapshot from before the
    /// fetch started.
    fn on_change_tree(&self, base: Option<Tree>, anchor: Option<&str>, mode: InsertionMode) -> OnChangeTree {
        let weak = Arc::downgrade(&self.inner);
        let anchor = anchor.map(str::to_string);
        Arc::new(move |tree: Tree| {
            let Some(view) = View::upgrade(&weak) else {
                return;
            };
            if view.is_destroyed() {
                tracing::debug!(view = %view.inner.id, "Dropping tree delivered after destroy");
                return;
            }
            if let Err(e) = view.merge_and_render(base.clone(), tree, anchor.as_deref(), mode) {
                tracing::warn!(view = %view.inner.id, error = %e, "Failed to merge fetched tree");
            }
        })
    }

    fn recover(&self, params: &LoadParams, base: Option<Tree>, anchor: Option<&str>, mode: InsertionMode) {
        if self.is_destroyed() {
            return;
        }

        if let Some(fallback) = params.fallback.clone() {
            self.do_full_render(fallback);
        } else if params.show_error {
            let component = params
                .error_component
                .clone()
                .unwrap_or_else(|| DEFAULT_ERROR_COMPONENT.to_string());
            let placeholder = Tree::new(component).with_id(ERROR_ID);
            if let Err(e) = self.merge_and_render(base, placeholder, anchor, mode) {
                tracing::warn!(view = %self.inner.id, error = %e, "Failed to render error placeholder");
            }
        } else if params.show_loading {
            match base {
                Some(base) => {
                    self.inner.state.lock().snapshot = Some(base.clone());
                    self.render_snapshot(base);
                }
                None => {
                    // Listeners only receive trees, so going back to an
                    // empty view is observable through `get_tree` alone.
                    *self.inner.state.lock() = ViewState::default();
                }
            }
        }
    }

    fn deliver_errors(&self, errors: &FetchErrors) {
        if self.is_destroyed() {
            tracing::debug!(view = %self.inner.id, errors = %errors, "Dropping errors of destroyed view");
            return;
        }
        if self.inner.error_listeners.is_empty() {
            let causes = serde_json::to_string(errors.errors()).unwrap_or_default();
            tracing::error!(
                view = %self.inner.id,
                count = errors.errors().len(),
                causes = %causes,
                "Failed to load view: {}",
                errors
            );
            return;
        }
        self.inner
            .error_listeners
            .for_each_live(|listener| listener(errors.errors()));
    }

    fn merge_and_render(
        &self,
        base: Option<Tree>,
        raw: Tree,
        anchor: Option<&str>,
        mode: InsertionMode,
    ) -> Result<(), ViewError> {
        if raw.is_empty() {
            return Ok(());
        }
        let subtree = self.inner.lifecycles.run(Lifecycle::BeforeStart, raw);

        let tree = match base {
            Some(mut tree) => {
                insert(&mut tree, anchor, mode, subtree)?;
                tree
            }
            None => match anchor {
                None => subtree,
                Some(id) => {
                    return Err(TreeError::ElementNotFound { id: id.to_string() }.into());
                }
            },
        };

        self.render(tree);
        Ok(())
    }

    /// Identifies `tree` and runs it through the rest of the pipeline.
    fn render(&self, tree: Tree) {
        if tree.is_empty() {
            tracing::debug!(view = %self.inner.id, "beforeStart produced an empty tree, skipping");
            return;
        }
        let hooks = &self.inner.lifecycles;
        let seed = Some(self.inner.root_id.as_str());

        let tree = identify(&tree, seed);
        let snapshot = identify(&hooks.run(Lifecycle::BeforeViewSnapshot, tree), seed);
        self.inner.state.lock().snapshot = Some(snapshot.clone());
        self.render_snapshot(snapshot);
    }

    fn render_snapshot(&self, snapshot: Tree) {
        let hooks = &self.inner.lifecycles;
        let seed = Some(self.inner.root_id.as_str());

        let tree = hooks.run(Lifecycle::AfterViewSnapshot, snapshot);
        let tree = identify(&hooks.run(Lifecycle::BeforeRender, tree), seed);
        self.inner.state.lock().current = Some(tree.clone());

        self.inner
            .listeners
            .for_each_live(|listener| listener(tree.clone()));
    }

    /// Re-runs the render half of the pipeline on the stored snapshot.
    fn rerender(&self) {
        if self.is_destroyed() {
            return;
        }
        let snapshot = self.inner.state.lock().snapshot.clone();
        if let Some(snapshot) = snapshot {
            self.render_snapshot(snapshot);
        }
    }
}
