//! Flat parent-pointer lists to nested forests.
//!
//! Used for the org chart and for threaded comment replies. Grouping is a single
//! linear pass into a `parent -> children` index; assembly then walks down from the
//! roots, consuming each child list exactly once. A visited set and a depth bound
//! keep malformed input (duplicate ids, parent cycles) from recursing forever, and
//! anything left unreached after assembly is reported rather than silently dropped.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// A row that points at its parent by id.
pub trait TreeItem {
    fn id(&self) -> i64;
    fn parent_id(&self) -> Option<i64>;

    /// Sibling ordering key; ties break on id.
    fn sort_key(&self) -> i64 {
        0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub item: T,
    pub children: Vec<TreeNode<T>>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("id {0} appears more than once")]
    Duplicate(i64),
    #[error("tree deeper than {0} levels")]
    TooDeep(usize),
    #[error("positions not reachable from a root (parent cycle or missing parent): {0:?}")]
    Detached(Vec<i64>),
}

/// Assemble a forest from `items`. Roots are the items with no parent.
pub fn build_forest<T: TreeItem>(items: Vec<T>, max_depth: usize) -> Result<Vec<TreeNode<T>>, TreeError> {
    let total = items.len();

    let mut by_parent: HashMap<Option<i64>, Vec<T>> = HashMap::new();
    for item in items {
        by_parent.entry(item.parent_id()).or_default().push(item);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by_key(|item| (item.sort_key(), item.id()));
    }

    let roots = by_parent.remove(&None).unwrap_or_default();
    let mut visited = HashSet::with_capacity(total);
    let mut forest = Vec::with_capacity(roots.len());
    for root in roots {
        forest.push(attach(root, &mut by_parent, &mut visited, 1, max_depth)?);
    }

    if visited.len() != total {
        let mut detached: Vec<i64> = by_parent.values().flatten().map(TreeItem::id).collect();
        detached.sort_unstable();
        return Err(TreeError::Detached(detached));
    }

    Ok(forest)
}

fn attach<T: TreeItem>(
    item: T,
    by_parent: &mut HashMap<Option<i64>, Vec<T>>,
    visited: &mut HashSet<i64>,
    depth: usize,
    max_depth: usize,
) -> Result<TreeNode<T>, TreeError> {
    if depth > max_depth {
        return Err(TreeError::TooDeep(max_depth));
    }
    if !visited.insert(item.id()) {
        return Err(TreeError::Duplicate(item.id()));
    }

    let children = by_parent
        .remove(&Some(item.id()))
        .unwrap_or_default()
        .into_iter()
        .map(|child| attach(child, by_parent, visited, depth + 1, max_depth))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TreeNode { item, children })
}
