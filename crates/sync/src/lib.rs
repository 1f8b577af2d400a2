//! Tether Sync - Per-window synchronization engine
//!
//! Keeps any number of independent windows consistent with one shared
//! backend: each window owns a [`store::WindowStore`] replica, applies
//! relay broadcasts through an [`ingress::EventIngress`] echo filter,
//! mutates through a [`dispatch::CommandDispatcher`] choke point, and
//! derives the ordered sidebar tree with [`tree::SidebarTree`] and
//! [`reorder`].

pub mod dispatch;
pub mod ingress;
pub mod ports;
pub mod reconcile;
pub mod reorder;
pub mod store;
pub mod tree;

pub use dispatch::CommandDispatcher;
pub use ingress::EventIngress;
pub use store::WindowStore;
pub use tree::{SidebarTree, TreeError, TreeItem};

/// Identity of one window: its label and the workspace it displays.
///
/// Constructed explicitly and injected wherever the window identity
/// matters; there is no ambient global window state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOptions {
    /// Unique label of this window, echoed back in relay events it
    /// originates.
    pub label: String,
    /// The workspace this window displays, when one is open. Upserts
    /// for other workspaces are not applied.
    pub workspace_id: Option<String>,
}

impl WindowOptions {
    /// Options for a window with no workspace open.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            workspace_id: None,
        }
    }

    /// Scopes the window to a workspace.
    #[must_use]
    pub fn with_workspace(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self
    }
}
