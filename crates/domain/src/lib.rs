//! Tether Domain - Core model types
//!
//! This crate defines the synchronizable entity kinds for the Tether
//! sync engine. All types here are pure Rust with no I/O dependencies.

pub mod event;
pub mod id;
pub mod model;

pub use event::{ModelEvent, RelayEvent, UpdateSource};
pub use id::generate_id;
pub use model::{
    CookieJar, Environment, EnvironmentVariable, Folder, GrpcConnection, GrpcRequest, HttpRequest,
    HttpResponse, InsertPosition, KeyValue, Model, ModelKind, Plugin, Settings, Workspace,
    NO_SYNC_NAMESPACE,
};
