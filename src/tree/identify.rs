//! Deterministic id assignment.

use std::collections::HashSet;

use super::manipulation::for_each_mut;
use super::Tree;

/// Id given to a root node that declares none, when no seed is provided.
pub const DEFAULT_ROOT_ID: &str = "root";

/// Returns a copy of `tree` where every node carries a unique id.
///
/// Explicit ids are preserved. Nodes without one get `{parent_id}.{index}`
/// (the root gets `seed`, or [`DEFAULT_ROOT_ID`]). An explicit id already
/// taken by an earlier node in pre-order is discarded and regenerated. A
/// generated id that collides with an existing one gets a `~n` suffix.
///
/// Empty trees are returned untouched.
pub fn identify(tree: &Tree, seed: Option<&str>) -> Tree {
    let mut identified = tree.clone();
    if identified.is_empty() {
        return identified;
    }

    let mut used = HashSet::new();
    for_each_mut(&mut identified, |node, _| {
        let Some(id) = node.id.take() else {
            return;
        };
        if id.is_empty() {
            return;
        }
        if used.insert(id.clone()) {
            node.id = Some(id);
        } else {
            tracing::warn!(id = %id, "Duplicated explicit id in tree, generating a new one");
        }
    });

    let root_id = seed.unwrap_or(DEFAULT_ROOT_ID).to_string();
    assign(&mut identified, root_id, &mut used);
    identified
}

fn assign(node: &mut Tree, fallback: String, used: &mut HashSet<String>) {
    if node.id.is_none() {
        node.id = Some(unique_id(fallback, used));
    }
    let parent_id = node.id.clone().unwrap_or_default();
    for (index, child) in node.children.iter_mut().enumerate() {
        assign(child, format!("{}.{}", parent_id, index), used);
    }
}

fn unique_id(candidate: String, used: &mut HashSet<String>) -> String {
    if used.insert(candidate.clone()) {
        return candidate;
    }
    let mut suffix = 1;
    loop {
        let id = format!("{}~{}", candidate, suffix);
        if used.insert(id.clone()) {
            return id;
        }
        suffix += 1;
    }
}
