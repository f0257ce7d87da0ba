//! Traversal, lookup and structural merge of view trees.

use super::{InsertionMode, Tree, TreeError};

/// Pre-order traversal calling `visitor(node, parent)` for every node.
pub fn for_each<F>(tree: &Tree, mut visitor: F)
where
    F: FnMut(&Tree, Option<&Tree>),
{
    walk(tree, None, &mut visitor);
}

fn walk(node: &Tree, parent: Option<&Tree>, visitor: &mut dyn FnMut(&Tree, Option<&Tree>)) {
    visitor(node, parent);
    for child in &node.children {
        walk(child, Some(node), visitor);
    }
}

/// Pre-order traversal with mutable access to each node.
///
/// The visitor receives the node and its parent's id. Children are visited
/// after the visitor returns, so replacing a node's children changes what is
/// walked next but never the order of already scheduled siblings.
pub fn for_each_mut<F>(tree: &mut Tree, mut visitor: F)
where
    F: FnMut(&mut Tree, Option<&str>),
{
    walk_mut(tree, None, &mut visitor);
}

fn walk_mut(node: &mut Tree, parent_id: Option<&str>, visitor: &mut dyn FnMut(&mut Tree, Option<&str>)) {
    visitor(node, parent_id);
    let id = node.id.clone();
    for child in node.children.iter_mut() {
        walk_mut(child, id.as_deref(), visitor);
    }
}

/// Finds the node with the given id. Walks the full tree.
pub fn find_by_id<'a>(tree: &'a Tree, id: &str) -> Option<&'a Tree> {
    if tree.id.as_deref() == Some(id) {
        return Some(tree);
    }
    tree.children.iter().find_map(|child| find_by_id(child, id))
}

pub fn find_by_id_mut<'a>(tree: &'a mut Tree, id: &str) -> Option<&'a mut Tree> {
    if tree.id.as_deref() == Some(id) {
        return Some(tree);
    }
    tree.children
        .iter_mut()
        .find_map(|child| find_by_id_mut(child, id))
}

/// Merges `subtree` into `tree` at `anchor` (the root when `None`).
pub fn insert(
    tree: &mut Tree,
    anchor: Option<&str>,
    mode: InsertionMode,
    subtree: Tree,
) -> Result<(), TreeError> {
    let target = match anchor {
        Some(id) => find_by_id_mut(tree, id).ok_or_else(|| TreeError::ElementNotFound {
            id: id.to_string(),
        })?,
        None => tree,
    };

    match mode {
        InsertionMode::Replace => *target = subtree,
        InsertionMode::Append => target.children.push(subtree),
        InsertionMode::Prepend => target.children.insert(0, subtree),
    }
    Ok(())
}
