//! In-memory command backend with relay broadcasting.
//!
//! [`MemoryRelay`] is the shared half: one model table plus a broadcast
//! channel standing in for the real backend and its event relay.
//! [`MemoryBackend`] is a per-window command handle; every successful
//! mutation it performs is broadcast to all subscribed windows tagged
//! with the mutating window's label and update source.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, broadcast};
use tracing::warn;

use tether_domain::{
    CookieJar, Environment, Folder, GrpcConnection, GrpcRequest, HttpRequest, HttpResponse,
    KeyValue, Model, ModelEvent, Plugin, RelayEvent, Settings, UpdateSource, Workspace,
};
use tether_sync::ports::{CommandBackend, CommandError};

const RELAY_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct State {
    models: Vec<Model>,
    settings: Settings,
}

/// The shared backend store and its broadcast relay.
#[derive(Debug, Clone)]
pub struct MemoryRelay {
    state: Arc<Mutex<State>>,
    events: broadcast::Sender<serde_json::Value>,
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRelay {
    /// Creates an empty relay.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(RELAY_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(State::default())),
            events,
        }
    }

    /// Subscribes to the raw broadcast payloads.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<serde_json::Value> {
        self.events.subscribe()
    }

    /// A command handle for an interactive window.
    #[must_use]
    pub fn backend(&self, window_label: impl Into<String>) -> MemoryBackend {
        MemoryBackend {
            label: window_label.into(),
            source: UpdateSource::Window,
            relay: self.clone(),
        }
    }

    /// A command handle for a non-interactive actor (sync agent,
    /// plugin, background job).
    #[must_use]
    pub fn agent(&self, label: impl Into<String>, source: UpdateSource) -> MemoryBackend {
        MemoryBackend {
            label: label.into(),
            source,
            relay: self.clone(),
        }
    }

    /// Inserts a model without broadcasting, as preexisting data that
    /// windows pick up through their init queries.
    pub async fn seed(&self, model: Model) {
        let mut state = self.state.lock().await;
        if let Model::Settings(settings) = model {
            state.settings = settings;
        } else {
            upsert_in(&mut state.models, model);
        }
    }

    /// Broadcasts a raw payload without touching the model table. Lets
    /// tests exercise the malformed-event path.
    pub fn publish_raw(&self, payload: serde_json::Value) {
        // No receivers is fine; broadcast drops the payload
        let _ = self.events.send(payload);
    }

    fn publish(&self, event: &RelayEvent) {
        match serde_json::to_value(event) {
            Ok(payload) => self.publish_raw(payload),
            Err(err) => warn!(%err, "failed to encode relay event"),
        }
    }
}

fn upsert_in(models: &mut Vec<Model>, model: Model) {
    match models.iter().position(|m| m.same_identity(&model)) {
        Some(index) => models[index] = model,
        None => models.push(model),
    }
}

fn touch(model: &mut Model) {
    let now = Utc::now();
    match model {
        Model::Workspace(m) => m.updated_at = now,
        Model::Folder(m) => m.updated_at = now,
        Model::HttpRequest(m) => m.updated_at = now,
        Model::GrpcRequest(m) => m.updated_at = now,
        Model::HttpResponse(m) => m.updated_at = now,
        Model::GrpcConnection(m) => m.updated_at = now,
        Model::Environment(m) => m.updated_at = now,
        Model::CookieJar(m) => m.updated_at = now,
        Model::Plugin(m) => m.updated_at = now,
        Model::Settings(m) => m.updated_at = now,
        Model::KeyValue(m) => m.updated_at = now,
    }
}

fn describe(model: &Model) -> String {
    match model {
        Model::KeyValue(kv) => format!("key_value {}::{}", kv.namespace, kv.key),
        other => format!("{:?} {}", other.kind(), other.id().unwrap_or("<none>")),
    }
}

/// Per-window command handle over a [`MemoryRelay`].
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    label: String,
    source: UpdateSource,
    relay: MemoryRelay,
}

impl MemoryBackend {
    fn event(&self, model: Model) -> ModelEvent {
        ModelEvent {
            model,
            window_label: self.label.clone(),
            update_source: self.source,
        }
    }
}

#[async_trait]
impl CommandBackend for MemoryBackend {
    async fn upsert_model(&self, mut model: Model) -> Result<Model, CommandError> {
        touch(&mut model);
        {
            let mut state = self.relay.state.lock().await;
            if let Model::Settings(settings) = &model {
                state.settings = settings.clone();
            } else {
                upsert_in(&mut state.models, model.clone());
            }
        }
        self.relay
            .publish(&RelayEvent::UpsertedModel(self.event(model.clone())));
        Ok(model)
    }

    async fn delete_model(&self, model: Model) -> Result<Model, CommandError> {
        let removed = {
            let mut state = self.relay.state.lock().await;
            let index = state
                .models
                .iter()
                .position(|m| m.same_identity(&model))
                .ok_or_else(|| CommandError::NotFound(describe(&model)))?;
            state.models.remove(index)
        };
        self.relay
            .publish(&RelayEvent::DeletedModel(self.event(removed.clone())));
        Ok(removed)
    }

    async fn list_workspaces(&self) -> Result<Vec<Workspace>, CommandError> {
        let state = self.relay.state.lock().await;
        Ok(state
            .models
            .iter()
            .filter_map(|m| match m {
                Model::Workspace(w) => Some(w.clone()),
                _ => None,
            })
            .collect())
    }

    async fn list_folders(&self, workspace_id: &str) -> Result<Vec<Folder>, CommandError> {
        let state = self.relay.state.lock().await;
        Ok(state
            .models
            .iter()
            .filter_map(|m| match m {
                Model::Folder(f) if f.workspace_id == workspace_id => Some(f.clone()),
                _ => None,
            })
            .collect())
    }

    async fn list_http_requests(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<HttpRequest>, CommandError> {
        let state = self.relay.state.lock().await;
        Ok(state
            .models
            .iter()
            .filter_map(|m| match m {
                Model::HttpRequest(r) if r.workspace_id == workspace_id => Some(r.clone()),
                _ => None,
            })
            .collect())
    }

    async fn list_grpc_requests(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<GrpcRequest>, CommandError> {
        let state = self.relay.state.lock().await;
        Ok(state
            .models
            .iter()
            .filter_map(|m| match m {
                Model::GrpcRequest(r) if r.workspace_id == workspace_id => Some(r.clone()),
                _ => None,
            })
            .collect())
    }

    async fn list_http_responses(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<HttpResponse>, CommandError> {
        let state = self.relay.state.lock().await;
        let mut responses: Vec<HttpResponse> = state
            .models
            .iter()
            .filter_map(|m| match m {
                Model::HttpResponse(r) if r.workspace_id == workspace_id => Some(r.clone()),
                _ => None,
            })
            .collect();
        // Most recent first, matching the store's prepend policy
        responses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(responses)
    }

    async fn list_grpc_connections(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<GrpcConnection>, CommandError> {
        let state = self.relay.state.lock().await;
        let mut connections: Vec<GrpcConnection> = state
            .models
            .iter()
            .filter_map(|m| match m {
                Model::GrpcConnection(c) if c.workspace_id == workspace_id => Some(c.clone()),
                _ => None,
            })
            .collect();
        connections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(connections)
    }

    async fn list_environments(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<Environment>, CommandError> {
        let state = self.relay.state.lock().await;
        Ok(state
            .models
            .iter()
            .filter_map(|m| match m {
                Model::Environment(e) if e.workspace_id == workspace_id => Some(e.clone()),
                _ => None,
            })
            .collect())
    }

    async fn list_cookie_jars(&self, workspace_id: &str) -> Result<Vec<CookieJar>, CommandError> {
        let state = self.relay.state.lock().await;
        Ok(state
            .models
            .iter()
            .filter_map(|m| match m {
                Model::CookieJar(j) if j.workspace_id == workspace_id => Some(j.clone()),
                _ => None,
            })
            .collect())
    }

    async fn list_plugins(&self) -> Result<Vec<Plugin>, CommandError> {
        let state = self.relay.state.lock().await;
        Ok(state
            .models
            .iter()
            .filter_map(|m| match m {
                Model::Plugin(p) => Some(p.clone()),
                _ => None,
            })
            .collect())
    }

    async fn list_key_values(&self) -> Result<Vec<KeyValue>, CommandError> {
        let state = self.relay.state.lock().await;
        Ok(state
            .models
            .iter()
            .filter_map(|m| match m {
                Model::KeyValue(kv) => Some(kv.clone()),
                _ => None,
            })
            .collect())
    }

    async fn get_settings(&self) -> Result<Settings, CommandError> {
        let state = self.relay.state.lock().await;
        Ok(state.settings.clone())
    }
}
