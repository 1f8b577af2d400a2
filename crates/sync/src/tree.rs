//! Sidebar tree building.
//!
//! Converts the flat folder/request collections into a hierarchical
//! tree rooted at the workspace. The tree is rebuilt from scratch on
//! every store change, never patched incrementally, so it cannot
//! desync from the local store. Nodes live in an arena indexed by
//! [`NodeId`]; a cyclic `folder_id` chain is reported as a structural
//! error instead of recursing forever.

use std::collections::{HashMap, HashSet};

use tether_domain::{Folder, GrpcRequest, HttpRequest, Workspace};

/// Index of a node in the tree arena.
pub type NodeId = usize;

/// Error type for tree construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// A folder's `folder_id` chain loops back on itself.
    #[error("cyclic folder reference involving {id}")]
    CyclicFolder {
        /// A folder on the cycle.
        id: String,
    },
}

/// An item displayed in the sidebar.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeItem {
    /// The workspace root.
    Workspace(Workspace),
    /// A folder.
    Folder(Folder),
    /// An HTTP request.
    HttpRequest(HttpRequest),
    /// A gRPC request.
    GrpcRequest(GrpcRequest),
}

impl TreeItem {
    /// The item's id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Workspace(w) => &w.id,
            Self::Folder(f) => &f.id,
            Self::HttpRequest(r) => &r.id,
            Self::GrpcRequest(r) => &r.id,
        }
    }

    /// The item's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Workspace(w) => &w.name,
            Self::Folder(f) => &f.name,
            Self::HttpRequest(r) => &r.name,
            Self::GrpcRequest(r) => &r.name,
        }
    }

    /// Whether the item can contain children.
    #[must_use]
    pub const fn is_folder(&self) -> bool {
        matches!(self, Self::Workspace(_) | Self::Folder(_))
    }

    /// Sibling ordering key. The workspace acts as a `0`-priority
    /// boundary.
    #[must_use]
    pub const fn sort_priority(&self) -> f64 {
        match self {
            Self::Workspace(_) => 0.0,
            Self::Folder(f) => f.sort_priority,
            Self::HttpRequest(r) => r.sort_priority,
            Self::GrpcRequest(r) => r.sort_priority,
        }
    }
}

/// One node in the sidebar tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarNode {
    /// The displayed item.
    pub item: TreeItem,
    /// Child nodes, sorted ascending by `sort_priority`.
    pub children: Vec<NodeId>,
    /// Nesting depth; the workspace root is `0`.
    pub depth: usize,
    /// Whether this node is collapsed in the current window.
    pub collapsed: bool,
}

/// A linearly-selectable request for keyboard traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableRequest {
    /// The request id.
    pub id: String,
    /// Pre-order index among selectable requests.
    pub index: usize,
    /// The containing node.
    pub parent: NodeId,
}

/// The sidebar tree for one workspace, plus its lookup structures.
#[derive(Debug, Clone, PartialEq)]
pub struct SidebarTree {
    nodes: Vec<SidebarNode>,
    parent_of: HashMap<String, NodeId>,
    selectable: Vec<SelectableRequest>,
}

impl SidebarTree {
    /// Builds the tree for `workspace` from flat collections.
    ///
    /// Items are grouped by `folder_id` (`None` groups under the
    /// workspace), children are sorted ascending by `sort_priority`
    /// regardless of input order, and the traversal is depth-first.
    /// Items whose parent folder does not exist simply never attach.
    ///
    /// `collapsed` folders keep their children in the tree but exclude
    /// them from the selectable list.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::CyclicFolder`] when unattached folders form
    /// a `folder_id` cycle.
    pub fn build(
        workspace: &Workspace,
        folders: &[Folder],
        http_requests: &[HttpRequest],
        grpc_requests: &[GrpcRequest],
        collapsed: &HashSet<String>,
    ) -> Result<Self, TreeError> {
        let mut groups: HashMap<String, Vec<TreeItem>> = HashMap::new();
        let mut group = |parent: Option<&String>, item: TreeItem| {
            let key = parent.unwrap_or(&workspace.id).clone();
            groups.entry(key).or_default().push(item);
        };
        for folder in folders {
            group(folder.folder_id.as_ref(), TreeItem::Folder(folder.clone()));
        }
        for request in http_requests {
            group(
                request.folder_id.as_ref(),
                TreeItem::HttpRequest(request.clone()),
            );
        }
        for request in grpc_requests {
            group(
                request.folder_id.as_ref(),
                TreeItem::GrpcRequest(request.clone()),
            );
        }
        for items in groups.values_mut() {
            items.sort_by(|a, b| a.sort_priority().total_cmp(&b.sort_priority()));
        }

        let mut tree = Self {
            nodes: vec![SidebarNode {
                item: TreeItem::Workspace(workspace.clone()),
                children: Vec::new(),
                depth: 0,
                collapsed: false,
            }],
            parent_of: HashMap::new(),
            selectable: Vec::new(),
        };
        let mut visited = HashSet::new();
        visited.insert(workspace.id.clone());
        tree.attach(0, &mut groups, collapsed, &mut visited)?;

        Self::check_unreachable(folders, &visited)?;
        Ok(tree)
    }

    fn attach(
        &mut self,
        node_id: NodeId,
        groups: &mut HashMap<String, Vec<TreeItem>>,
        collapsed: &HashSet<String>,
        visited: &mut HashSet<String>,
    ) -> Result<(), TreeError> {
        let parent_key = self.nodes[node_id].item.id().to_string();
        let parent_collapsed = self.nodes[node_id].collapsed;
        let depth = self.nodes[node_id].depth + 1;
        let Some(items) = groups.remove(&parent_key) else {
            return Ok(());
        };

        for item in items {
            let id = item.id().to_string();
            let is_folder = matches!(item, TreeItem::Folder(_));
            if is_folder && !visited.insert(id.clone()) {
                return Err(TreeError::CyclicFolder { id });
            }

            let child_id = self.nodes.len();
            self.nodes.push(SidebarNode {
                collapsed: collapsed.contains(&id),
                item,
                children: Vec::new(),
                depth,
            });
            self.nodes[node_id].children.push(child_id);
            self.parent_of.insert(id.clone(), node_id);

            if is_folder {
                self.attach(child_id, groups, collapsed, visited)?;
            } else if !parent_collapsed {
                self.selectable.push(SelectableRequest {
                    id,
                    index: self.selectable.len(),
                    parent: node_id,
                });
            }
        }
        Ok(())
    }

    /// Folders that never attached either have a missing parent
    /// (tolerated) or sit on a cycle (reported).
    fn check_unreachable(folders: &[Folder], visited: &HashSet<String>) -> Result<(), TreeError> {
        let parents: HashMap<&str, Option<&str>> = folders
            .iter()
            .map(|f| (f.id.as_str(), f.folder_id.as_deref()))
            .collect();

        for folder in folders {
            if visited.contains(&folder.id) {
                continue;
            }
            let mut seen = HashSet::new();
            let mut current = folder.id.as_str();
            loop {
                if !seen.insert(current) {
                    return Err(TreeError::CyclicFolder {
                        id: current.to_string(),
                    });
                }
                match parents.get(current).copied() {
                    Some(Some(parent)) => current = parent,
                    // Chain leaves the folder set: missing parent, not a cycle
                    _ => break,
                }
            }
        }
        Ok(())
    }

    /// The workspace root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        0
    }

    /// The node at `id`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &SidebarNode {
        &self.nodes[id]
    }

    /// Total number of nodes, workspace root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree is empty. Never true: the root always exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node containing the given item, for O(1) parent lookup.
    #[must_use]
    pub fn parent_of(&self, item_id: &str) -> Option<NodeId> {
        self.parent_of.get(item_id).copied()
    }

    /// The node holding the given item itself.
    #[must_use]
    pub fn find(&self, item_id: &str) -> Option<NodeId> {
        if self.nodes[0].item.id() == item_id {
            return Some(0);
        }
        let parent = self.parent_of(item_id)?;
        self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&child| self.nodes[child].item.id() == item_id)
    }

    /// Items of a node's children, in display order.
    pub fn child_items(&self, id: NodeId) -> impl Iterator<Item = &TreeItem> {
        self.nodes[id]
            .children
            .iter()
            .map(move |&child| &self.nodes[child].item)
    }

    /// Requests traversable with ArrowUp/ArrowDown, in pre-order.
    #[must_use]
    pub fn selectable_requests(&self) -> &[SelectableRequest] {
        &self.selectable
    }

    /// The selectable request after `id`, for ArrowDown.
    #[must_use]
    pub fn selectable_after(&self, id: &str) -> Option<&SelectableRequest> {
        let index = self.selectable.iter().position(|s| s.id == id)?;
        self.selectable.get(index + 1)
    }

    /// The selectable request before `id`, for ArrowUp.
    #[must_use]
    pub fn selectable_before(&self, id: &str) -> Option<&SelectableRequest> {
        let index = self.selectable.iter().position(|s| s.id == id)?;
        index.checked_sub(1).and_then(|i| self.selectable.get(i))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn folder(workspace: &Workspace, name: &str, priority: f64) -> Folder {
        let mut f = Folder::new(&workspace.id, name);
        f.sort_priority = priority;
        f
    }

    fn request(workspace: &Workspace, name: &str, priority: f64) -> HttpRequest {
        let mut r = HttpRequest::new(&workspace.id, name);
        r.sort_priority = priority;
        r
    }

    fn names<'a>(tree: &'a SidebarTree, id: NodeId) -> Vec<&'a str> {
        tree.child_items(id).map(TreeItem::name).collect()
    }

    #[test]
    fn test_empty_workspace_has_empty_children() {
        let workspace = Workspace::new("Personal");
        let tree =
            SidebarTree::build(&workspace, &[], &[], &[], &HashSet::new()).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.node(tree.root()).children.is_empty());
        assert!(tree.selectable_requests().is_empty());
    }

    #[test]
    fn test_children_sorted_by_priority_regardless_of_input_order() {
        let workspace = Workspace::new("Personal");
        let requests = vec![
            request(&workspace, "third", 2000.0),
            request(&workspace, "first", 0.0),
            request(&workspace, "second", 1000.0),
        ];
        let tree =
            SidebarTree::build(&workspace, &[], &requests, &[], &HashSet::new()).unwrap();
        assert_eq!(names(&tree, tree.root()), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_nesting_and_parent_map() {
        let workspace = Workspace::new("Personal");
        let auth = folder(&workspace, "Auth", 0.0);
        let mut login = request(&workspace, "Login", 0.0);
        login.folder_id = Some(auth.id.clone());

        let tree = SidebarTree::build(
            &workspace,
            std::slice::from_ref(&auth),
            std::slice::from_ref(&login),
            &[],
            &HashSet::new(),
        )
        .unwrap();

        let auth_node = tree.find(&auth.id).unwrap();
        assert_eq!(tree.node(auth_node).depth, 1);
        assert_eq!(names(&tree, auth_node), vec!["Login"]);
        assert_eq!(tree.parent_of(&login.id), Some(auth_node));
        assert_eq!(tree.parent_of(&auth.id), Some(tree.root()));
    }

    #[test]
    fn test_selectable_skips_folders_and_collapsed_contents() {
        let workspace = Workspace::new("Personal");
        let open = folder(&workspace, "Open", 0.0);
        let shut = folder(&workspace, "Shut", 1000.0);
        let mut a = request(&workspace, "a", 0.0);
        a.folder_id = Some(open.id.clone());
        let mut b = request(&workspace, "b", 0.0);
        b.folder_id = Some(shut.id.clone());
        let c = request(&workspace, "c", 2000.0);

        let collapsed = HashSet::from([shut.id.clone()]);
        let tree = SidebarTree::build(
            &workspace,
            &[open, shut.clone()],
            &[a.clone(), b, c.clone()],
            &[],
            &collapsed,
        )
        .unwrap();

        let ids: Vec<&str> = tree
            .selectable_requests()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids, vec![a.id.as_str(), c.id.as_str()]);
        let indexes: Vec<usize> = tree.selectable_requests().iter().map(|s| s.index).collect();
        assert_eq!(indexes, vec![0, 1]);

        // Collapsed folder children stay in the tree itself
        let shut_node = tree.find(&shut.id).unwrap();
        assert_eq!(tree.node(shut_node).children.len(), 1);
    }

    #[test]
    fn test_arrow_traversal() {
        let workspace = Workspace::new("Personal");
        let requests = vec![
            request(&workspace, "a", 0.0),
            request(&workspace, "b", 1000.0),
        ];
        let tree =
            SidebarTree::build(&workspace, &[], &requests, &[], &HashSet::new()).unwrap();

        let a = &requests[0].id;
        let b = &requests[1].id;
        assert_eq!(tree.selectable_after(a).map(|s| s.id.as_str()), Some(b.as_str()));
        assert_eq!(tree.selectable_after(b), None);
        assert_eq!(tree.selectable_before(b).map(|s| s.id.as_str()), Some(a.as_str()));
        assert_eq!(tree.selectable_before(a), None);
    }

    #[test]
    fn test_cyclic_folders_are_reported() {
        let workspace = Workspace::new("Personal");
        let mut a = folder(&workspace, "a", 0.0);
        let mut b = folder(&workspace, "b", 1000.0);
        a.folder_id = Some(b.id.clone());
        b.folder_id = Some(a.id.clone());

        let err =
            SidebarTree::build(&workspace, &[a, b], &[], &[], &HashSet::new()).unwrap_err();
        assert!(matches!(err, TreeError::CyclicFolder { .. }));
    }

    #[test]
    fn test_missing_parent_is_tolerated() {
        let workspace = Workspace::new("Personal");
        let mut orphan = folder(&workspace, "orphan", 0.0);
        orphan.folder_id = Some("fl_missing".to_string());

        let tree =
            SidebarTree::build(&workspace, &[orphan], &[], &[], &HashSet::new()).unwrap();
        assert_eq!(tree.len(), 1);
    }
}
