//! Global context: JSON state shared by every view of a service.
//!
//! Views subscribe through the [`ContextSource`] seam and re-render their
//! snapshot whenever the context changes.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::view::listeners::ListenerSet;
use crate::view::Subscription;

/// How many `null` slots a single `set` may add to pad an array.
pub const MAX_INDEX_GAP: usize = 1024;

/// Upstream data source a view follows for its whole life.
pub trait ContextSource: Send + Sync {
    fn subscribe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription;
}

/// Shared key/value context addressed by dotted paths (`user.name`,
/// `cart.items.0`).
pub struct GlobalContext {
    value: RwLock<Value>,
    listeners: ListenerSet<dyn Fn() + Send + Sync>,
}

impl Default for GlobalContext {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalContext {
    pub fn new() -> Self {
        Self {
            value: RwLock::new(Value::Object(Map::new())),
            listeners: ListenerSet::new(),
        }
    }

    /// Value at `path`, or the whole context when `path` is `None`.
    pub fn get(&self, path: Option<&str>) -> Option<Value> {
        let value = self.value.read();
        match path {
            None => Some(value.clone()),
            Some(path) => get_at(&value, &segments(path)).cloned(),
        }
    }

    /// Sets `value` at `path`, creating intermediate objects/arrays.
    ///
    /// Array indices may extend an array by at most [`MAX_INDEX_GAP`] slots;
    /// farther indices into an existing array are rejected with a warning.
    pub fn set(&self, value: Value, path: Option<&str>) {
        let changed = {
            let mut root = self.value.write();
            match path {
                None => {
                    *root = value;
                    true
                }
                Some(path) => set_at(&mut root, &segments(path), value),
            }
        };
        if changed {
            self.notify();
        } else {
            tracing::warn!(path = ?path, "Index out of range, global context unchanged");
        }
    }

    /// Removes the value at `path`, or empties the context.
    pub fn clear(&self, path: Option<&str>) {
        {
            let mut root = self.value.write();
            match path {
                None => *root = Value::Object(Map::new()),
                Some(path) => remove_at(&mut root, &segments(path)),
            }
        }
        self.notify();
    }

    fn notify(&self) {
        tracing::debug!("Global context changed");
        self.listeners.for_each_live(|listener| listener());
    }
}

impl ContextSource for GlobalContext {
    fn subscribe(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Subscription {
        self.listeners.add(on_change)
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('.').filter(|segment| !segment.is_empty()).collect()
}

fn get_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn set_at(target: &mut Value, path: &[&str], value: Value) -> bool {
    let Some((head, rest)) = path.split_first() else {
        *target = value;
        return true;
    };
    let index = head.parse::<usize>().ok();

    if let (Some(i), Value::Array(items)) = (index, &mut *target) {
        if i >= items.len() {
            if i - items.len() > MAX_INDEX_GAP {
                return false;
            }
            items.resize(i + 1, Value::Null);
        }
        return set_at(&mut items[i], rest, value);
    }

    if let Value::Object(map) = &mut *target {
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        return set_at(child, rest, value);
    }

    // Indices too far out to pad become object keys.
    *target = match index {
        Some(i) if i <= MAX_INDEX_GAP => Value::Array(Vec::new()),
        _ => Value::Object(Map::new()),
    };
    set_at(target, path, value)
}

fn remove_at(target: &mut Value, path: &[&str]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let parent = parents.iter().try_fold(target, |current, segment| match current {
        Value::Object(map) => map.get_mut(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    });
    let Some(parent) = parent else {
        return;
    };

    match parent {
        Value::Object(map) => {
            map.remove(*last);
        }
        Value::Array(items) => {
            if let Some(i) = last.parse::<usize>().ok().filter(|i| *i < items.len()) {
                items.remove(i);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_set_and_get_paths() {
        let context = GlobalContext::new();
        context.set(json!("Ana"), Some("user.name"));
        context.set(json!(3), Some("cart.items.2"));

        assert_eq!(context.get(Some("user.name")), Some(json!("Ana")));
        assert_eq!(
            context.get(Some("cart.items")),
            Some(json!([null, null, 3]))
        );
        assert_eq!(context.get(Some("missing.path")), None);
    }

    #[test]
    fn test_set_root_and_clear() {
        let context = GlobalContext::new();
        context.set(json!({ "a": { "b": 1, "c": 2 } }), None);
        context.clear(Some("a.b"));
        assert_eq!(context.get(None), Some(json!({ "a": { "c": 2 } })));
        context.clear(None);
        assert_eq!(context.get(None), Some(json!({})));
    }

    #[test]
    fn test_set_overwrites_scalars() {
        let context = GlobalContext::new();
        context.set(json!(1), Some("a"));
        context.set(json!(2), Some("a.b"));
        assert_eq!(context.get(None), Some(json!({ "a": { "b": 2 } })));
    }

    #[test]
    fn test_huge_index_into_array_is_rejected() {
        let context = GlobalContext::new();
        context.set(json!([1]), Some("items"));
        context.set(json!(2), Some("items.18446744073709551615"));
        context.set(json!(3), Some("items.4000000000"));
        assert_eq!(context.get(Some("items")), Some(json!([1])));

        context.set(json!(4), Some("items.1"));
        assert_eq!(context.get(Some("items")), Some(json!([1, 4])));
    }

    #[test]
    fn test_huge_index_on_new_path_becomes_key() {
        let context = GlobalContext::new();
        context.set(json!(1), Some("fresh.18446744073709551615"));
        assert_eq!(
            context.get(None),
            Some(json!({ "fresh": { "18446744073709551615": 1 } }))
        );
    }

    #[test]
    fn test_subscribers_are_notified() {
        let context = GlobalContext::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let subscription = context.subscribe(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        context.set(json!(1), Some("a"));
        context.clear(None);
        subscription.unsubscribe();
        context.set(json!(2), Some("a"));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
