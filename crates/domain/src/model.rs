//! Synchronizable entity kinds and their identity rules.
//!
//! Every model that flows through the sync engine is a variant of the
//! [`Model`] tagged union. The serde `model` tag matches the wire format
//! of the event relay (`"http_request"`, `"folder"`, ...), and field
//! names serialize as camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::generate_id;

/// Key-value namespace whose entries are confined to the window that
/// wrote them and never applied from foreign windows.
pub const NO_SYNC_NAMESPACE: &str = "no_sync";

/// A workspace, the root scope for all other workspace-bound models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Human-readable workspace name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
}

impl Workspace {
    /// Creates a new workspace with a generated ID.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            created_at: now,
            updated_at: now,
            name: name.into(),
            description: String::new(),
        }
    }
}

/// A folder grouping requests and other folders within a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Owning workspace.
    pub workspace_id: String,
    /// Parent folder, or `None` when at the workspace root.
    pub folder_id: Option<String>,
    /// Human-readable folder name.
    pub name: String,
    /// Sibling ordering key; lower sorts first.
    pub sort_priority: f64,
}

impl Folder {
    /// Creates a new root-level folder in the given workspace.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            created_at: now,
            updated_at: now,
            workspace_id: workspace_id.into(),
            folder_id: None,
            name: name.into(),
            sort_priority: 0.0,
        }
    }
}

/// An HTTP request definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Owning workspace.
    pub workspace_id: String,
    /// Containing folder, or `None` when at the workspace root.
    pub folder_id: Option<String>,
    /// Human-readable request name.
    pub name: String,
    /// HTTP method.
    pub method: String,
    /// Target URL.
    pub url: String,
    /// Sibling ordering key; lower sorts first.
    pub sort_priority: f64,
}

impl HttpRequest {
    /// Creates a new root-level request in the given workspace.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            created_at: now,
            updated_at: now,
            workspace_id: workspace_id.into(),
            folder_id: None,
            name: name.into(),
            method: "GET".to_string(),
            url: String::new(),
            sort_priority: 0.0,
        }
    }
}

/// A gRPC request definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcRequest {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Owning workspace.
    pub workspace_id: String,
    /// Containing folder, or `None` when at the workspace root.
    pub folder_id: Option<String>,
    /// Human-readable request name.
    pub name: String,
    /// Fully-qualified service name, when selected.
    pub service: Option<String>,
    /// Method name within the service, when selected.
    pub method: Option<String>,
    /// Target URL.
    pub url: String,
    /// Sibling ordering key; lower sorts first.
    pub sort_priority: f64,
}

impl GrpcRequest {
    /// Creates a new root-level request in the given workspace.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            created_at: now,
            updated_at: now,
            workspace_id: workspace_id.into(),
            folder_id: None,
            name: name.into(),
            service: None,
            method: None,
            url: String::new(),
            sort_priority: 0.0,
        }
    }
}

/// A recorded HTTP response (chronological event, most-recent-first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Owning workspace.
    pub workspace_id: String,
    /// The request that produced this response.
    pub request_id: String,
    /// HTTP status code, `0` until headers arrive.
    pub status: i32,
    /// Total elapsed milliseconds.
    pub elapsed: i64,
    /// Final URL after redirects.
    pub url: String,
    /// Transport error, if the exchange failed.
    pub error: Option<String>,
}

impl HttpResponse {
    /// Creates a new empty response for the given request.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>, request_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            created_at: now,
            updated_at: now,
            workspace_id: workspace_id.into(),
            request_id: request_id.into(),
            status: 0,
            elapsed: 0,
            url: String::new(),
            error: None,
        }
    }
}

/// A recorded gRPC connection (chronological event, most-recent-first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcConnection {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Owning workspace.
    pub workspace_id: String,
    /// The request that opened this connection.
    pub request_id: String,
    /// Fully-qualified service name.
    pub service: String,
    /// Method name within the service.
    pub method: String,
    /// gRPC status code.
    pub status: i32,
    /// Target URL.
    pub url: String,
    /// Transport error, if the connection failed.
    pub error: Option<String>,
}

impl GrpcConnection {
    /// Creates a new connection record for the given request.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>, request_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            created_at: now,
            updated_at: now,
            workspace_id: workspace_id.into(),
            request_id: request_id.into(),
            service: String::new(),
            method: String::new(),
            status: 0,
            url: String::new(),
            error: None,
        }
    }
}

/// A single variable within an environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentVariable {
    /// Variable name.
    pub name: String,
    /// Variable value.
    pub value: String,
    /// Whether the variable participates in resolution.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

const fn default_true() -> bool {
    true
}

/// A named set of variables scoped to a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Owning workspace.
    pub workspace_id: String,
    /// Human-readable environment name.
    pub name: String,
    /// Variables defined by this environment.
    #[serde(default)]
    pub variables: Vec<EnvironmentVariable>,
}

impl Environment {
    /// Creates a new empty environment in the given workspace.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            created_at: now,
            updated_at: now,
            workspace_id: workspace_id.into(),
            name: name.into(),
            variables: Vec::new(),
        }
    }
}

/// A cookie jar scoped to a workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieJar {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Owning workspace.
    pub workspace_id: String,
    /// Human-readable jar name.
    pub name: String,
}

impl CookieJar {
    /// Creates a new empty cookie jar in the given workspace.
    #[must_use]
    pub fn new(workspace_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            created_at: now,
            updated_at: now,
            workspace_id: workspace_id.into(),
            name: name.into(),
        }
    }
}

/// An installed plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plugin {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Install directory on disk.
    pub directory: String,
    /// Whether the plugin is enabled.
    pub enabled: bool,
    /// Source URL, when installed from a registry.
    pub url: Option<String>,
}

impl Plugin {
    /// Creates a new enabled plugin rooted at the given directory.
    #[must_use]
    pub fn new(directory: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            created_at: now,
            updated_at: now,
            directory: directory.into(),
            enabled: true,
            url: None,
        }
    }
}

/// Application-wide settings. A singleton: upserts replace it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Unique identifier.
    pub id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Light/dark/system appearance.
    pub appearance: String,
    /// Active theme name.
    pub theme: String,
    /// Whether telemetry is enabled.
    pub telemetry: bool,
}

impl Settings {
    /// Creates settings with system appearance defaults.
    #[must_use]
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: generate_id(),
            created_at: now,
            updated_at: now,
            appearance: "system".to_string(),
            theme: "default".to_string(),
            telemetry: true,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

/// A namespaced key-value entry.
///
/// Identity is the compound `(namespace, key)` pair, not an `id`.
/// Entries in the [`NO_SYNC_NAMESPACE`] namespace are private to the
/// originating window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Namespace the key lives in.
    pub namespace: String,
    /// Key within the namespace.
    pub key: String,
    /// JSON-encoded value.
    pub value: String,
}

impl KeyValue {
    /// Creates a new entry.
    #[must_use]
    pub fn new(
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            namespace: namespace.into(),
            key: key.into(),
            value: value.into(),
        }
    }

    /// Joins multi-segment keys into the canonical `::`-separated form.
    #[must_use]
    pub fn build_key(segments: &[&str]) -> String {
        segments.join("::")
    }

    /// Whether this entry is confined to its originating window.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.namespace == NO_SYNC_NAMESPACE
    }
}

/// The closed set of synchronizable models, tagged by entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Model {
    /// A workspace.
    Workspace(Workspace),
    /// A folder.
    Folder(Folder),
    /// An HTTP request.
    HttpRequest(HttpRequest),
    /// A gRPC request.
    GrpcRequest(GrpcRequest),
    /// An HTTP response record.
    HttpResponse(HttpResponse),
    /// A gRPC connection record.
    GrpcConnection(GrpcConnection),
    /// An environment.
    Environment(Environment),
    /// A cookie jar.
    CookieJar(CookieJar),
    /// A plugin.
    Plugin(Plugin),
    /// Application settings.
    Settings(Settings),
    /// A key-value entry.
    KeyValue(KeyValue),
}

/// Fieldless tag for a [`Model`] variant, used for exhaustive routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Workspace.
    Workspace,
    /// Folder.
    Folder,
    /// HTTP request.
    HttpRequest,
    /// gRPC request.
    GrpcRequest,
    /// HTTP response.
    HttpResponse,
    /// gRPC connection.
    GrpcConnection,
    /// Environment.
    Environment,
    /// Cookie jar.
    CookieJar,
    /// Plugin.
    Plugin,
    /// Settings.
    Settings,
    /// Key-value entry.
    KeyValue,
}

/// Where a freshly-seen model lands in its collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Insertion-order-as-creation-order display lists.
    Append,
    /// Most-recent-first chronological event lists.
    Prepend,
}

impl ModelKind {
    /// Insert position for models of this kind that are not yet present
    /// in their collection.
    #[must_use]
    pub const fn insert_position(self) -> InsertPosition {
        match self {
            Self::HttpResponse | Self::GrpcConnection => InsertPosition::Prepend,
            _ => InsertPosition::Append,
        }
    }
}

impl Model {
    /// Returns the entity-kind tag of this model.
    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::Workspace(_) => ModelKind::Workspace,
            Self::Folder(_) => ModelKind::Folder,
            Self::HttpRequest(_) => ModelKind::HttpRequest,
            Self::GrpcRequest(_) => ModelKind::GrpcRequest,
            Self::HttpResponse(_) => ModelKind::HttpResponse,
            Self::GrpcConnection(_) => ModelKind::GrpcConnection,
            Self::Environment(_) => ModelKind::Environment,
            Self::CookieJar(_) => ModelKind::CookieJar,
            Self::Plugin(_) => ModelKind::Plugin,
            Self::Settings(_) => ModelKind::Settings,
            Self::KeyValue(_) => ModelKind::KeyValue,
        }
    }

    /// Returns the model's `id`, or `None` for kinds without one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Workspace(m) => Some(&m.id),
            Self::Folder(m) => Some(&m.id),
            Self::HttpRequest(m) => Some(&m.id),
            Self::GrpcRequest(m) => Some(&m.id),
            Self::HttpResponse(m) => Some(&m.id),
            Self::GrpcConnection(m) => Some(&m.id),
            Self::Environment(m) => Some(&m.id),
            Self::CookieJar(m) => Some(&m.id),
            Self::Plugin(m) => Some(&m.id),
            Self::Settings(m) => Some(&m.id),
            Self::KeyValue(_) => None,
        }
    }

    /// Returns the owning workspace id for workspace-scoped kinds.
    #[must_use]
    pub fn workspace_id(&self) -> Option<&str> {
        match self {
            Self::Folder(m) => Some(&m.workspace_id),
            Self::HttpRequest(m) => Some(&m.workspace_id),
            Self::GrpcRequest(m) => Some(&m.workspace_id),
            Self::HttpResponse(m) => Some(&m.workspace_id),
            Self::GrpcConnection(m) => Some(&m.workspace_id),
            Self::Environment(m) => Some(&m.workspace_id),
            Self::CookieJar(m) => Some(&m.workspace_id),
            Self::Workspace(_) | Self::Plugin(_) | Self::Settings(_) | Self::KeyValue(_) => None,
        }
    }

    /// Whether two models refer to the same entity.
    ///
    /// Id equality for id-keyed kinds; the compound `(namespace, key)`
    /// pair for key-value entries. Models of different kinds never match.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyValue(a), Self::KeyValue(b)) => {
                a.namespace == b.namespace && a.key == b.key
            }
            (a, b) => a.kind() == b.kind() && a.id().is_some() && a.id() == b.id(),
        }
    }
}
