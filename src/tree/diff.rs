//! Id-keyed structural diff between two identified trees.

use std::collections::{HashMap, HashSet};

use super::Tree;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    Added { id: String },
    Removed { id: String },
    /// Same id, but its own fields or the ids/order of its children differ.
    Updated { id: String },
}

/// Lists the nodes that differ between `old` and `new`.
///
/// Additions and updates come first, in `new`'s pre-order, then removals in
/// `old`'s pre-order. Nodes without an id are ignored.
pub fn diff(old: &Tree, new: &Tree) -> Vec<TreeChange> {
    let old_nodes = index(old);
    let new_nodes = index(new);
    let mut old_by_id: HashMap<&str, &Tree> = HashMap::with_capacity(old_nodes.len());
    for (id, node) in &old_nodes {
        old_by_id.entry(id.as_str()).or_insert(*node);
    }
    let mut changes = Vec::new();

    for (id, node) in &new_nodes {
        match old_by_id.get(id.as_str()) {
            None => changes.push(TreeChange::Added { id: id.clone() }),
            Some(previous) if !shallow_eq(previous, node) => {
                changes.push(TreeChange::Updated { id: id.clone() })
            }
            Some(_) => {}
        }
    }

    let present: HashSet<&str> = new_nodes.iter().map(|(id, _)| id.as_str()).collect();
    for (id, _) in &old_nodes {
        if !present.contains(id.as_str()) {
            changes.push(TreeChange::Removed { id: id.clone() });
        }
    }
    changes
}

fn index(tree: &Tree) -> Vec<(String, &Tree)> {
    let mut nodes: Vec<(String, &Tree)> = Vec::new();
    collect(tree, &mut nodes);
    nodes
}

fn collect<'a>(node: &'a Tree, nodes: &mut Vec<(String, &'a Tree)>) {
    if let Some(id) = &node.id {
        nodes.push((id.clone(), node));
    }
    for child in &node.children {
        collect(child, nodes);
    }
}

fn shallow_eq(a: &Tree, b: &Tree) -> bool {
    a.component == b.component
        && a.context == b.context
        && a.props == b.props
        && a.children.iter().map(Tree::id).eq(b.children.iter().map(Tree::id))
}
