//! Per-window local store.
//!
//! Each window owns one [`WindowStore`]: an in-memory replica of the
//! backend collections it displays. The store is populated once from
//! backend queries on window start and thereafter changes only through
//! [`WindowStore::apply_upsert`] / [`WindowStore::apply_remove`], called
//! by the event ingress and the command dispatcher's success path.

use std::sync::Arc;

use tokio::sync::RwLock;

use tether_domain::{
    CookieJar, Environment, Folder, GrpcConnection, GrpcRequest, HttpRequest, HttpResponse,
    KeyValue, Model, Plugin, Settings, Workspace,
};

use crate::ports::{CommandBackend, CommandError};
use crate::reconcile;

#[derive(Debug, Default)]
struct Collections {
    workspaces: Vec<Workspace>,
    folders: Vec<Folder>,
    http_requests: Vec<HttpRequest>,
    grpc_requests: Vec<GrpcRequest>,
    http_responses: Vec<HttpResponse>,
    grpc_connections: Vec<GrpcConnection>,
    environments: Vec<Environment>,
    cookie_jars: Vec<CookieJar>,
    plugins: Vec<Plugin>,
    key_values: Vec<KeyValue>,
    settings: Option<Settings>,
}

/// Thread-safe per-window model store. Clone is a cheap handle.
#[derive(Debug, Clone, Default)]
pub struct WindowStore {
    inner: Arc<RwLock<Collections>>,
}

impl WindowStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populates the store from backend queries.
    ///
    /// Workspace-scoped collections are loaded for `workspace_id` when
    /// one is given; plugins, settings, and key values are global.
    ///
    /// # Errors
    ///
    /// Returns the first backend query error; the store is left with
    /// whatever was loaded before the failure.
    pub async fn init<B: CommandBackend + ?Sized>(
        &self,
        backend: &B,
        workspace_id: Option<&str>,
    ) -> Result<(), CommandError> {
        let mut inner = self.inner.write().await;
        inner.workspaces = backend.list_workspaces().await?;
        inner.plugins = backend.list_plugins().await?;
        inner.key_values = backend.list_key_values().await?;
        inner.settings = Some(backend.get_settings().await?);

        if let Some(workspace_id) = workspace_id {
            inner.folders = backend.list_folders(workspace_id).await?;
            inner.http_requests = backend.list_http_requests(workspace_id).await?;
            inner.grpc_requests = backend.list_grpc_requests(workspace_id).await?;
            inner.http_responses = backend.list_http_responses(workspace_id).await?;
            inner.grpc_connections = backend.list_grpc_connections(workspace_id).await?;
            inner.environments = backend.list_environments(workspace_id).await?;
            inner.cookie_jars = backend.list_cookie_jars(workspace_id).await?;
        }
        Ok(())
    }

    /// Clears all collections (window teardown).
    pub async fn dispose(&self) {
        let mut inner = self.inner.write().await;
        *inner = Collections::default();
    }

    /// Applies an upsert, routed by entity kind.
    pub async fn apply_upsert(&self, model: Model) {
        let mut inner = self.inner.write().await;
        match model {
            Model::Workspace(m) => reconcile::upsert(&mut inner.workspaces, m),
            Model::Folder(m) => reconcile::upsert(&mut inner.folders, m),
            Model::HttpRequest(m) => reconcile::upsert(&mut inner.http_requests, m),
            Model::GrpcRequest(m) => reconcile::upsert(&mut inner.grpc_requests, m),
            Model::HttpResponse(m) => reconcile::upsert(&mut inner.http_responses, m),
            Model::GrpcConnection(m) => reconcile::upsert(&mut inner.grpc_connections, m),
            Model::Environment(m) => reconcile::upsert(&mut inner.environments, m),
            Model::CookieJar(m) => reconcile::upsert(&mut inner.cookie_jars, m),
            Model::Plugin(m) => reconcile::upsert(&mut inner.plugins, m),
            Model::KeyValue(m) => reconcile::upsert(&mut inner.key_values, m),
            // Settings is a singleton, replaced wholesale
            Model::Settings(m) => inner.settings = Some(m),
        }
    }

    /// Applies a removal, routed by entity kind. Absent models are a
    /// no-op; Settings has no delete route and is ignored.
    pub async fn apply_remove(&self, model: &Model) {
        let mut inner = self.inner.write().await;
        match model {
            Model::Workspace(m) => reconcile::remove(&mut inner.workspaces, m),
            Model::Folder(m) => reconcile::remove(&mut inner.folders, m),
            Model::HttpRequest(m) => reconcile::remove(&mut inner.http_requests, m),
            Model::GrpcRequest(m) => reconcile::remove(&mut inner.grpc_requests, m),
            Model::HttpResponse(m) => reconcile::remove(&mut inner.http_responses, m),
            Model::GrpcConnection(m) => reconcile::remove(&mut inner.grpc_connections, m),
            Model::Environment(m) => reconcile::remove(&mut inner.environments, m),
            Model::CookieJar(m) => reconcile::remove(&mut inner.cookie_jars, m),
            Model::Plugin(m) => reconcile::remove(&mut inner.plugins, m),
            Model::KeyValue(m) => reconcile::remove(&mut inner.key_values, m),
            Model::Settings(_) => {}
        }
    }

    /// Snapshot of all workspaces.
    pub async fn workspaces(&self) -> Vec<Workspace> {
        self.inner.read().await.workspaces.clone()
    }

    /// Snapshot of the loaded folders.
    pub async fn folders(&self) -> Vec<Folder> {
        self.inner.read().await.folders.clone()
    }

    /// Snapshot of the loaded HTTP requests.
    pub async fn http_requests(&self) -> Vec<HttpRequest> {
        self.inner.read().await.http_requests.clone()
    }

    /// Snapshot of the loaded gRPC requests.
    pub async fn grpc_requests(&self) -> Vec<GrpcRequest> {
        self.inner.read().await.grpc_requests.clone()
    }

    /// Snapshot of the loaded HTTP responses, most recent first.
    pub async fn http_responses(&self) -> Vec<HttpResponse> {
        self.inner.read().await.http_responses.clone()
    }

    /// Snapshot of the loaded gRPC connections, most recent first.
    pub async fn grpc_connections(&self) -> Vec<GrpcConnection> {
        self.inner.read().await.grpc_connections.clone()
    }

    /// Snapshot of the loaded environments.
    pub async fn environments(&self) -> Vec<Environment> {
        self.inner.read().await.environments.clone()
    }

    /// Snapshot of the loaded cookie jars.
    pub async fn cookie_jars(&self) -> Vec<CookieJar> {
        self.inner.read().await.cookie_jars.clone()
    }

    /// Snapshot of the installed plugins.
    pub async fn plugins(&self) -> Vec<Plugin> {
        self.inner.read().await.plugins.clone()
    }

    /// The settings singleton, once loaded.
    pub async fn settings(&self) -> Option<Settings> {
        self.inner.read().await.settings.clone()
    }

    /// Looks up a key-value entry by its compound identity.
    pub async fn key_value(&self, namespace: &str, key: &str) -> Option<KeyValue> {
        self.inner
            .read()
            .await
            .key_values
            .iter()
            .find(|kv| kv.namespace == namespace && kv.key == key)
            .cloned()
    }
}
