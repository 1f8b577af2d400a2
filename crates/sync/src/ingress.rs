//! Event ingress and echo filtering.
//!
//! Each window runs one [`EventIngress`] for its lifetime, consuming a
//! single ordered stream of [`RelayEvent`]s and applying them to the
//! local store. The echo filter decides which events to apply:
//!
//! 1. Events from this window always apply, so confirmed writes replace
//!    optimistic placeholders with canonical data.
//! 2. Non-interactive sources (sync, plugin, background) always apply;
//!    they have no optimistic counterpart to deduplicate against.
//! 3. Foreign interactive edits apply unless the model is a key-value
//!    entry in the private `no_sync` namespace.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use tether_domain::{Model, ModelEvent, RelayEvent, UpdateSource};

use crate::WindowOptions;
use crate::ports::EditorNotifier;
use crate::store::WindowStore;

/// Applies relay events to a window's local store.
pub struct EventIngress {
    store: WindowStore,
    options: WindowOptions,
    editor: Arc<dyn EditorNotifier>,
}

impl EventIngress {
    /// Creates an ingress for the given window.
    #[must_use]
    pub fn new(store: WindowStore, options: WindowOptions, editor: Arc<dyn EditorNotifier>) -> Self {
        Self {
            store,
            options,
            editor,
        }
    }

    /// Consumes events until the channel closes.
    ///
    /// Runs for the lifetime of the window; no single event can take
    /// the loop down.
    pub async fn run(self, mut events: UnboundedReceiver<RelayEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        debug!(window = %self.options.label, "relay channel closed, ingress stopping");
    }

    /// Applies a single relay event.
    pub async fn handle(&self, event: RelayEvent) {
        match event {
            RelayEvent::UpsertedModel(payload) => self.handle_upserted(payload).await,
            RelayEvent::DeletedModel(payload) => self.handle_deleted(payload).await,
        }
    }

    async fn handle_upserted(&self, payload: ModelEvent) {
        // Prompt open edit buffers before any filtering, so an editor can
        // offer a refresh even for models this store does not track.
        if let Model::HttpRequest(request) = &payload.model {
            if payload.window_label != self.options.label {
                self.editor.request_updated_externally(&request.id);
            }
        }

        // Only sync models that belong to this window's workspace
        if let (Some(own), Some(theirs)) =
            (self.options.workspace_id.as_deref(), payload.model.workspace_id())
        {
            if own != theirs {
                debug!(workspace = theirs, "skipping foreign-workspace upsert");
                return;
            }
        }

        if self.should_ignore(&payload) {
            return;
        }
        self.store.apply_upsert(payload.model).await;
    }

    async fn handle_deleted(&self, payload: ModelEvent) {
        if self.should_ignore(&payload) {
            return;
        }
        self.store.apply_remove(&payload.model).await;
    }

    fn should_ignore(&self, payload: &ModelEvent) -> bool {
        // Never ignore same-window updates
        if payload.window_label == self.options.label {
            return false;
        }
        if payload.update_source != UpdateSource::Window {
            return false;
        }
        match &payload.model {
            Model::KeyValue(kv) if kv.is_private() => {
                debug!(key = %kv.key, "dropping foreign no_sync key value");
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use tether_domain::{HttpRequest, KeyValue, NO_SYNC_NAMESPACE, Workspace};

    use super::*;
    use crate::ports::NoopEditorNotifier;

    struct RecordingNotifier(Mutex<Vec<String>>);

    impl EditorNotifier for RecordingNotifier {
        fn request_updated_externally(&self, request_id: &str) {
            self.0.lock().unwrap().push(request_id.to_string());
        }
    }

    fn ingress(label: &str, workspace_id: Option<&str>) -> (EventIngress, WindowStore) {
        let store = WindowStore::new();
        let mut options = WindowOptions::new(label);
        options.workspace_id = workspace_id.map(String::from);
        let ingress = EventIngress::new(store.clone(), options, Arc::new(NoopEditorNotifier));
        (ingress, store)
    }

    fn upserted(model: Model, window_label: &str, update_source: UpdateSource) -> RelayEvent {
        RelayEvent::UpsertedModel(ModelEvent {
            model,
            window_label: window_label.to_string(),
            update_source,
        })
    }

    #[tokio::test]
    async fn test_own_window_events_always_apply() {
        let (ingress, store) = ingress("A", None);
        let kv = KeyValue::new(NO_SYNC_NAMESPACE, "sidebar_collapsed::wk1", "{}");
        ingress
            .handle(upserted(Model::KeyValue(kv), "A", UpdateSource::Window))
            .await;
        assert!(
            store
                .key_value(NO_SYNC_NAMESPACE, "sidebar_collapsed::wk1")
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_foreign_no_sync_window_edit_is_dropped() {
        let (ingress, store) = ingress("B", None);
        let kv = KeyValue::new(NO_SYNC_NAMESPACE, "sidebar_collapsed::wk1", "{}");
        ingress
            .handle(upserted(Model::KeyValue(kv), "A", UpdateSource::Window))
            .await;
        assert_eq!(
            store
                .key_value(NO_SYNC_NAMESPACE, "sidebar_collapsed::wk1")
                .await,
            None
        );
    }

    #[tokio::test]
    async fn test_foreign_no_sync_from_sync_source_applies() {
        let (ingress, store) = ingress("B", None);
        let kv = KeyValue::new(NO_SYNC_NAMESPACE, "sidebar_collapsed::wk1", "{}");
        ingress
            .handle(upserted(Model::KeyValue(kv), "A", UpdateSource::Sync))
            .await;
        assert!(
            store
                .key_value(NO_SYNC_NAMESPACE, "sidebar_collapsed::wk1")
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_foreign_workspace_upserts_are_scoped_out() {
        let (ingress, store) = ingress("A", Some("wk1"));
        ingress
            .handle(upserted(
                Model::HttpRequest(HttpRequest::new("wk2", "Other")),
                "B",
                UpdateSource::Window,
            ))
            .await;
        assert!(store.http_requests().await.is_empty());

        // Models without a workspace id are not scoped
        ingress
            .handle(upserted(
                Model::Workspace(Workspace::new("Personal")),
                "B",
                UpdateSource::Window,
            ))
            .await;
        assert_eq!(store.workspaces().await.len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_event_removes_model() {
        let (ingress, store) = ingress("A", None);
        let request = HttpRequest::new("wk1", "List users");
        ingress
            .handle(upserted(
                Model::HttpRequest(request.clone()),
                "B",
                UpdateSource::Window,
            ))
            .await;
        assert_eq!(store.http_requests().await.len(), 1);

        ingress
            .handle(RelayEvent::DeletedModel(ModelEvent {
                model: Model::HttpRequest(request),
                window_label: "B".to_string(),
                update_source: UpdateSource::Window,
            }))
            .await;
        assert!(store.http_requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_foreign_http_request_notifies_editor() {
        let store = WindowStore::new();
        let notifier = Arc::new(RecordingNotifier(Mutex::new(Vec::new())));
        let ingress = EventIngress::new(store, WindowOptions::new("A"), notifier.clone());

        let request = HttpRequest::new("wk1", "List users");
        let id = request.id.clone();
        ingress
            .handle(upserted(
                Model::HttpRequest(request.clone()),
                "B",
                UpdateSource::Window,
            ))
            .await;
        // Own echo must not re-notify
        ingress
            .handle(upserted(
                Model::HttpRequest(request),
                "A",
                UpdateSource::Window,
            ))
            .await;

        assert_eq!(*notifier.0.lock().unwrap(), vec![id]);
    }
}
