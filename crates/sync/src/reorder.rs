//! Drag-and-drop reorder planning.
//!
//! Computes new sort priorities for a dragged sidebar item. The fast
//! path halves the gap between the new neighbors and touches only the
//! dragged item; when fractional precision at that position is
//! exhausted the whole sibling list is renormalized to multiples of
//! [`SORT_SPACING`]. All writes go back through the command
//! dispatcher; the planner never touches the store.

use futures::future::try_join_all;

use tether_domain::{Model, ModelKind};

use crate::dispatch::CommandDispatcher;
use crate::ports::{CommandBackend, CommandError};
use crate::tree::{NodeId, SidebarTree, TreeItem};

/// Neighbor gap below which the whole sibling list is renormalized.
pub const RENORMALIZE_THRESHOLD: f64 = 1.0;

/// Renormalized spacing between adjacent siblings.
pub const SORT_SPACING: f64 = 1000.0;

/// Error type for reorder planning.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    /// The referenced item is not in the tree.
    #[error("unknown sidebar item: {0}")]
    UnknownItem(String),
}

/// Which half of an item the cursor is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropSide {
    /// Upper half: insert before the item.
    Above,
    /// Lower half: insert after the item.
    Below,
}

/// A resolved drop position: an index within a parent's children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    /// The node whose child list receives the item.
    pub parent: NodeId,
    /// Insertion index in that child list, counted before the dragged
    /// item is removed.
    pub index: usize,
}

/// The mutations a move requires: one patched model on the fast path,
/// the full sibling list when renormalizing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderPlan {
    /// Fully patched canonical models to persist.
    pub updates: Vec<Model>,
}

/// Resolves where a drop lands relative to the hovered item.
///
/// Dropping on the lower half of an *expanded* folder moves into that
/// folder at index 0 rather than below it as a sibling.
///
/// # Errors
///
/// Returns [`ReorderError::UnknownItem`] when the hovered item is not
/// in the tree.
pub fn drop_target(
    tree: &SidebarTree,
    hovered_id: &str,
    side: DropSide,
) -> Result<DropTarget, ReorderError> {
    let parent = tree
        .parent_of(hovered_id)
        .ok_or_else(|| ReorderError::UnknownItem(hovered_id.to_string()))?;
    let position = tree
        .child_items(parent)
        .position(|item| item.id() == hovered_id)
        .ok_or_else(|| ReorderError::UnknownItem(hovered_id.to_string()))?;

    if side == DropSide::Below {
        if let Some(hovered) = tree.find(hovered_id) {
            let node = tree.node(hovered);
            if matches!(node.item, TreeItem::Folder(_)) && !node.collapsed {
                return Ok(DropTarget {
                    parent: hovered,
                    index: 0,
                });
            }
        }
    }

    let index = match side {
        DropSide::Above => position,
        DropSide::Below => position + 1,
    };
    Ok(DropTarget { parent, index })
}

/// Plans the moves for dropping `dragged_id` at `target`.
///
/// Returns `Ok(None)` when the drop is a no-op (a node dropped onto
/// itself). Reparenting rewrites `folder_id` on every update.
///
/// # Errors
///
/// Returns [`ReorderError::UnknownItem`] when the dragged item is not
/// in the tree.
pub fn plan_move(
    tree: &SidebarTree,
    dragged_id: &str,
    target: &DropTarget,
) -> Result<Option<ReorderPlan>, ReorderError> {
    // Block dragging a folder into itself
    if tree.node(target.parent).item.id() == dragged_id {
        return Ok(None);
    }

    let source_parent = tree
        .parent_of(dragged_id)
        .ok_or_else(|| ReorderError::UnknownItem(dragged_id.to_string()))?;
    let source_index = tree
        .child_items(source_parent)
        .position(|item| item.id() == dragged_id)
        .ok_or_else(|| ReorderError::UnknownItem(dragged_id.to_string()))?;
    let dragged = tree
        .child_items(source_parent)
        .nth(source_index)
        .ok_or_else(|| ReorderError::UnknownItem(dragged_id.to_string()))?;

    let different_tree = target.parent != source_parent;
    let moved_up_in_same_tree = !different_tree && target.index < source_index;

    let mut candidates: Vec<&TreeItem> = tree
        .child_items(target.parent)
        .filter(|item| item.id() != dragged_id)
        .collect();
    // Moving down accounts for the dragged item's removal shifting the
    // list; an item dropped right onto its own slot keeps it.
    let insert_at = if different_tree || moved_up_in_same_tree {
        target.index
    } else {
        target.index.saturating_sub(1)
    }
    .min(candidates.len());
    candidates.insert(insert_at, dragged);

    let before_priority = insert_at
        .checked_sub(1)
        .and_then(|i| candidates.get(i))
        .map_or(0.0, |item| item.sort_priority());
    let after_priority = candidates
        .get(insert_at + 1)
        .map_or(0.0, |item| item.sort_priority());

    let folder_id = match &tree.node(target.parent).item {
        TreeItem::Folder(folder) => Some(folder.id.clone()),
        _ => None,
    };

    let gap = after_priority - before_priority;
    let updates = if gap < RENORMALIZE_THRESHOLD {
        candidates
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let priority = to_f64(i) * SORT_SPACING;
                patched(item, priority, folder_id.clone())
            })
            .collect()
    } else {
        let priority = after_priority - gap / 2.0;
        patched(dragged, priority, folder_id).into_iter().collect()
    };

    Ok(Some(ReorderPlan { updates }))
}

impl ReorderPlan {
    /// Persists the plan through the dispatcher, one command per
    /// affected model, issued concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first command error; each failed command has already
    /// been surfaced by the dispatcher.
    pub async fn persist<B: CommandBackend + 'static>(
        self,
        dispatcher: &CommandDispatcher<B>,
    ) -> Result<(), CommandError> {
        try_join_all(self.updates.into_iter().map(|model| {
            let key = mutation_key(model.kind());
            async move { dispatcher.upsert(key, model).await }
        }))
        .await?;
        Ok(())
    }
}

const fn mutation_key(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::Folder => "update_folder",
        ModelKind::GrpcRequest => "update_grpc_request",
        _ => "update_http_request",
    }
}

fn patched(item: &TreeItem, sort_priority: f64, folder_id: Option<String>) -> Option<Model> {
    match item {
        TreeItem::Folder(folder) => {
            let mut folder = folder.clone();
            folder.sort_priority = sort_priority;
            folder.folder_id = folder_id;
            Some(Model::Folder(folder))
        }
        TreeItem::HttpRequest(request) => {
            let mut request = request.clone();
            request.sort_priority = sort_priority;
            request.folder_id = folder_id;
            Some(Model::HttpRequest(request))
        }
        TreeItem::GrpcRequest(request) => {
            let mut request = request.clone();
            request.sort_priority = sort_priority;
            request.folder_id = folder_id;
            Some(Model::GrpcRequest(request))
        }
        TreeItem::Workspace(_) => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(index: usize) -> f64 {
    index as f64
}
