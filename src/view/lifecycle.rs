//! Lifecycle hooks applied at fixed points of the render pipeline.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::tree::{for_each_mut, Tree};

/// Points of the render pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Raw tree, before ids are assigned.
    BeforeStart,
    /// Identified tree, before it is stored as the view snapshot.
    BeforeViewSnapshot,
    /// Copy of the snapshot, on its way to being rendered.
    AfterViewSnapshot,
    /// Last chance to change the tree before it becomes current.
    BeforeRender,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::BeforeStart => "beforeStart",
            Lifecycle::BeforeViewSnapshot => "beforeViewSnapshot",
            Lifecycle::AfterViewSnapshot => "afterViewSnapshot",
            Lifecycle::BeforeRender => "beforeRender",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Tree -> Tree | void`: returning `None` keeps the input.
pub type LifecycleHook = Arc<dyn Fn(&Tree) -> Option<Tree> + Send + Sync>;

/// Global and per-component hooks for each [`Lifecycle`].
///
/// For a given lifecycle the global hook runs first, on the whole tree.
/// Component hooks then run on every node whose type matches, in pre-order.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    global: HashMap<Lifecycle, LifecycleHook>,
    components: HashMap<Lifecycle, HashMap<String, LifecycleHook>>,
}

impl LifecycleHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_global<F>(mut self, lifecycle: Lifecycle, hook: F) -> Self
    where
        F: Fn(&Tree) -> Option<Tree> + Send + Sync + 'static,
    {
        self.global.insert(lifecycle, Arc::new(hook));
        self
    }

    pub fn with_component<F>(mut self, lifecycle: Lifecycle, component: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Tree) -> Option<Tree> + Send + Sync + 'static,
    {
        self.components
            .entry(lifecycle)
            .or_default()
            .insert(component.into(), Arc::new(hook));
        self
    }

    pub fn run(&self, lifecycle: Lifecycle, tree: Tree) -> Tree {
        let mut tree = match self.global.get(&lifecycle) {
            Some(hook) => hook(&tree).unwrap_or(tree),
            None => tree,
        };

        if let Some(hooks) = self.components.get(&lifecycle).filter(|h| !h.is_empty()) {
            for_each_mut(&mut tree, |node, _| {
                let hook = node.component.as_deref().and_then(|name| hooks.get(name));
                if let Some(replacement) = hook.and_then(|hook| hook(node)) {
                    *node = replacement;
                }
            });
        }

        tracing::trace!(lifecycle = %lifecycle, "Lifecycle hooks applied");
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_hooks_returns_input() {
        let tree = Tree::new("beagle:text");
        assert_eq!(LifecycleHooks::new().run(Lifecycle::BeforeRender, tree.clone()), tree);
    }

    #[test]
    fn test_global_hook_can_replace_or_keep() {
        let hooks = LifecycleHooks::new()
            .with_global(Lifecycle::BeforeStart, |_| Some(Tree::new("replaced")))
            .with_global(Lifecycle::BeforeRender, |_| None);
        assert_eq!(
            hooks.run(Lifecycle::BeforeStart, Tree::new("a")),
            Tree::new("replaced")
        );
        assert_eq!(hooks.run(Lifecycle::BeforeRender, Tree::new("a")), Tree::new("a"));
    }

    #[test]
    fn test_component_hooks_run_on_matching_nodes() {
        let hooks = LifecycleHooks::new().with_component(
            Lifecycle::BeforeViewSnapshot,
            "beagle:text",
            |node| Some(node.clone().with_prop("seen", json!(true))),
        );
        let tree = Tree::new("beagle:container")
            .with_child(Tree::new("beagle:text"))
            .with_child(Tree::new("beagle:image"));
        let result = hooks.run(Lifecycle::BeforeViewSnapshot, tree);
        assert_eq!(result.children[0].props.get("seen"), Some(&json!(true)));
        assert!(result.children[1].props.get("seen").is_none());
        assert!(result.props.get("seen").is_none());
    }

    #[test]
    fn test_global_runs_before_component_hooks() {
        let hooks = LifecycleHooks::new()
            .with_global(Lifecycle::BeforeStart, |tree| {
                Some(tree.clone().with_child(Tree::new("custom:badge")))
            })
            .with_component(Lifecycle::BeforeStart, "custom:badge", |node| {
                Some(node.clone().with_prop("count", json!(1)))
            });
        let result = hooks.run(Lifecycle::BeforeStart, Tree::new("beagle:container"));
        assert_eq!(result.children[0].props.get("count"), Some(&json!(1)));
    }
}
