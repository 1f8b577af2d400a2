//! Command backend port.
//!
//! The backend is the opaque request/response command channel shared by
//! all windows. It persists mutations, returns canonical models, and
//! broadcasts the corresponding relay events on its own schedule. No
//! ordering is assumed between a command response and the later
//! broadcast for the same mutation.

use async_trait::async_trait;
use tether_domain::{
    CookieJar, Environment, Folder, GrpcConnection, GrpcRequest, HttpRequest, HttpResponse,
    KeyValue, Model, Plugin, Settings, Workspace,
};

/// Error type for command invocations.
///
/// Commands carry human-readable messages; the dispatcher surfaces them
/// as dismissible toasts and never retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// The backend rejected or failed the command.
    #[error("command failed: {0}")]
    Failed(String),

    /// The referenced model does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// What a successful command did, as reported by the backend.
///
/// `Upserted`/`Deleted` carry the canonical post-mutation model (not the
/// caller's optimistic guess); `Done` is for commands returning nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// The model was created or updated.
    Upserted(Model),
    /// The model was deleted.
    Deleted(Model),
    /// The command completed without a model result.
    Done,
}

/// The backend command channel.
///
/// List/get queries are used once, by [`WindowStore::init`] on window
/// start; thereafter the store is update-only through relay events and
/// dispatcher success callbacks.
///
/// [`WindowStore::init`]: crate::store::WindowStore::init
#[async_trait]
pub trait CommandBackend: Send + Sync {
    /// Creates or updates a model, returning its canonical state.
    async fn upsert_model(&self, model: Model) -> Result<Model, CommandError>;

    /// Deletes a model, returning its last canonical state.
    async fn delete_model(&self, model: Model) -> Result<Model, CommandError>;

    /// Lists all workspaces.
    async fn list_workspaces(&self) -> Result<Vec<Workspace>, CommandError>;

    /// Lists folders in a workspace.
    async fn list_folders(&self, workspace_id: &str) -> Result<Vec<Folder>, CommandError>;

    /// Lists HTTP requests in a workspace.
    async fn list_http_requests(&self, workspace_id: &str)
    -> Result<Vec<HttpRequest>, CommandError>;

    /// Lists gRPC requests in a workspace.
    async fn list_grpc_requests(&self, workspace_id: &str)
    -> Result<Vec<GrpcRequest>, CommandError>;

    /// Lists HTTP responses in a workspace, most recent first.
    async fn list_http_responses(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<HttpResponse>, CommandError>;

    /// Lists gRPC connections in a workspace, most recent first.
    async fn list_grpc_connections(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<GrpcConnection>, CommandError>;

    /// Lists environments in a workspace.
    async fn list_environments(&self, workspace_id: &str)
    -> Result<Vec<Environment>, CommandError>;

    /// Lists cookie jars in a workspace.
    async fn list_cookie_jars(&self, workspace_id: &str) -> Result<Vec<CookieJar>, CommandError>;

    /// Lists installed plugins.
    async fn list_plugins(&self) -> Result<Vec<Plugin>, CommandError>;

    /// Lists all key-value entries.
    async fn list_key_values(&self) -> Result<Vec<KeyValue>, CommandError>;

    /// Returns the settings singleton.
    async fn get_settings(&self) -> Result<Settings, CommandError>;
}
