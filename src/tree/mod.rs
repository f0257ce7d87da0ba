//! Server-driven view trees.
//!
//! A [`Tree`] is the declarative description of a screen as sent by the
//! backend: a component type, an id, ordered children, an optional data
//! context and an open set of component properties.
//!
//! Raw trees (freshly parsed JSON) carry no id guarantees. They must go
//! through [`identify`] before being treated as view state.

mod diff;
mod identify;
mod manipulation;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use diff::{diff, TreeChange};
pub use identify::{identify, DEFAULT_ROOT_ID};
pub use manipulation::{find_by_id, find_by_id_mut, for_each, for_each_mut, insert};

/// How a subtree is merged into an existing tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertionMode {
    /// Swap the node at the anchor with the new subtree.
    #[default]
    Replace,
    /// Push the new subtree as the anchor's last child.
    Append,
    /// Unshift the new subtree as the anchor's first child.
    Prepend,
}

/// Local data-binding context attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataContext {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// A node of a view tree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Tree {
    /// Component name, e.g. `beagle:container` or `custom:loading`.
    #[serde(
        rename = "_beagleComponent_",
        alias = "_beagleType_",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_empty"
    )]
    pub children: Vec<Tree>,
    #[serde(rename = "_context_", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<DataContext>,
    /// Component-specific properties (style, text, actions, ...).
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

impl Tree {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: Some(component.into()),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_child(mut self, child: Tree) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Tree>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// A tree without a component type is a no-op tree.
    pub fn is_empty(&self) -> bool {
        self.component.is_none()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    /// Parse a raw tree from a JSON payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Number of nodes in the tree, root included.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Tree::len).sum::<usize>()
    }
}

/// `"children": null` is sent by some backends for leaf nodes.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Tree>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Tree>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Errors raised by structural tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("No element with id '{id}' found in the tree")]
    ElementNotFound { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_children_parse_as_leaf() {
        let tree = Tree::from_json(
            r#"{"_beagleComponent_":"beagle:container","children":[{"_beagleComponent_":"beagle:text","children":null}]}"#,
        )
        .unwrap();
        assert_eq!(tree.children.len(), 1);
        assert!(tree.children[0].children.is_empty());
        assert!(!tree.children[0].props.contains_key("children"));
    }

    #[test]
    fn test_parse_keeps_unknown_props() {
        let payload = json!({
            "_beagleComponent_": "beagle:text",
            "text": "hello",
            "style": { "margin": 2 },
        });
        let tree: Tree = serde_json::from_value(payload.clone()).unwrap();
        assert_eq!(tree.component(), Some("beagle:text"));
        assert_eq!(tree.props.get("text"), Some(&json!("hello")));
        assert_eq!(serde_json::to_value(&tree).unwrap(), payload);
    }

    #[test]
    fn test_parse_legacy_type_key() {
        let tree = Tree::from_json(r#"{"_beagleType_":"beagle:button"}"#).unwrap();
        assert_eq!(tree.component(), Some("beagle:button"));
    }

    #[test]
    fn test_parse_context() {
        let tree = Tree::from_json(
            r#"{"_beagleComponent_":"beagle:container","_context_":{"id":"ctx","value":1}}"#,
        )
        .unwrap();
        let context = tree.context.unwrap();
        assert_eq!(context.id, "ctx");
        assert_eq!(context.value, Some(json!(1)));
    }

    #[test]
    fn test_empty_object_is_empty_tree() {
        let tree = Tree::from_json("{}").unwrap();
        assert!(tree.is_empty());
        assert!(tree.id.is_none());
    }

    #[test]
    fn test_len_counts_every_node() {
        let tree = Tree::new("a").with_child(Tree::new("b").with_child(Tree::new("c")));
        assert_eq!(tree.len(), 3);
    }
}
