//! Command dispatching.
//!
//! Every mutation a window makes passes through one
//! [`CommandDispatcher`]: the single choke point for canonical store
//! updates, error surfacing, and telemetry. On success the store
//! receives the backend's canonical model, never the caller's guess; on
//! failure the store is untouched and the error is shown as a toast
//! deduplicated by mutation key.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use tether_domain::Model;

use crate::ports::{
    CommandBackend, CommandError, CommandOutcome, MutationOutcome, Telemetry, Toast, ToastColor,
    ToastSink,
};
use crate::store::WindowStore;

/// How long error toasts stay visible.
const TOAST_TIMEOUT: Duration = Duration::from_secs(5);

/// Dispatches backend commands for one window.
pub struct CommandDispatcher<B> {
    backend: Arc<B>,
    store: WindowStore,
    telemetry: Arc<dyn Telemetry>,
    toasts: Arc<dyn ToastSink>,
}

impl<B> Clone for CommandDispatcher<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            store: self.store.clone(),
            telemetry: Arc::clone(&self.telemetry),
            toasts: Arc::clone(&self.toasts),
        }
    }
}

impl<B: CommandBackend + 'static> CommandDispatcher<B> {
    /// Creates a dispatcher over the given backend and store.
    #[must_use]
    pub fn new(
        backend: Arc<B>,
        store: WindowStore,
        telemetry: Arc<dyn Telemetry>,
        toasts: Arc<dyn ToastSink>,
    ) -> Self {
        Self {
            backend,
            store,
            telemetry,
            toasts,
        }
    }

    /// Runs a backend command and applies its canonical result.
    ///
    /// `key` identifies the mutation for telemetry and toast
    /// deduplication (e.g. `"update_folder"`).
    ///
    /// # Errors
    ///
    /// Returns the command error after surfacing it; the store is not
    /// mutated on failure.
    pub async fn mutate_async<F, Fut>(&self, key: &str, op: F) -> Result<CommandOutcome, CommandError>
    where
        F: FnOnce(Arc<B>) -> Fut,
        Fut: Future<Output = Result<CommandOutcome, CommandError>>,
    {
        match op(Arc::clone(&self.backend)).await {
            Ok(outcome) => {
                match &outcome {
                    CommandOutcome::Upserted(model) => {
                        self.store.apply_upsert(model.clone()).await;
                    }
                    CommandOutcome::Deleted(model) => self.store.apply_remove(model).await,
                    CommandOutcome::Done => {}
                }
                debug!(key, "mutation succeeded");
                self.telemetry.record(key, MutationOutcome::Success);
                Ok(outcome)
            }
            Err(err) => {
                warn!(key, %err, "mutation failed");
                self.telemetry.record(key, MutationOutcome::Error);
                self.toasts.show(Toast {
                    id: key.to_string(),
                    message: err.to_string(),
                    color: ToastColor::Danger,
                    timeout: TOAST_TIMEOUT,
                });
                Err(err)
            }
        }
    }

    /// Fire-and-forget variant of [`Self::mutate_async`].
    ///
    /// Defers the command to a spawned task and discards the result
    /// channel; success/error policy is identical. There is no way to
    /// cancel the command once issued.
    pub fn mutate<F, Fut>(&self, key: &str, op: F)
    where
        F: FnOnce(Arc<B>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<CommandOutcome, CommandError>> + Send,
    {
        let this = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            let _ = this.mutate_async(&key, op).await;
        });
    }

    /// Upserts a model, applying an optimistic copy before the backend
    /// round-trip resolves.
    ///
    /// The canonical response (or a later relay event) unconditionally
    /// overwrites the optimistic state; the server always wins.
    ///
    /// # Errors
    ///
    /// Returns the command error. The optimistic copy stays in place
    /// until a relay event corrects it.
    pub async fn upsert_optimistic(&self, key: &str, model: Model) -> Result<Model, CommandError> {
        self.store.apply_upsert(model.clone()).await;
        self.upsert(key, model).await
    }

    /// Upserts a model through the backend, returning its canonical
    /// state.
    ///
    /// # Errors
    ///
    /// Returns the command error after surfacing it.
    pub async fn upsert(&self, key: &str, model: Model) -> Result<Model, CommandError> {
        let outcome = self
            .mutate_async(key, |backend| async move {
                backend.upsert_model(model).await.map(CommandOutcome::Upserted)
            })
            .await?;
        match outcome {
            CommandOutcome::Upserted(model) => Ok(model),
            CommandOutcome::Deleted(_) | CommandOutcome::Done => {
                Err(CommandError::Failed("upsert returned no model".to_string()))
            }
        }
    }

    /// Deletes a model through the backend.
    ///
    /// # Errors
    ///
    /// Returns the command error after surfacing it.
    pub async fn delete(&self, key: &str, model: Model) -> Result<Model, CommandError> {
        let outcome = self
            .mutate_async(key, |backend| async move {
                backend.delete_model(model).await.map(CommandOutcome::Deleted)
            })
            .await?;
        match outcome {
            CommandOutcome::Deleted(model) => Ok(model),
            CommandOutcome::Upserted(_) | CommandOutcome::Done => {
                Err(CommandError::Failed("delete returned no model".to_string()))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use tether_domain::{
        CookieJar, Environment, Folder, GrpcConnection, GrpcRequest, HttpRequest, HttpResponse,
        KeyValue, Plugin, Settings, Workspace,
    };

    use super::*;
    use crate::ports::NoopTelemetry;

    /// Backend that accepts every mutation, or fails everything.
    struct StubBackend {
        fail: bool,
    }

    #[async_trait]
    impl CommandBackend for StubBackend {
        async fn upsert_model(&self, model: Model) -> Result<Model, CommandError> {
            if self.fail {
                Err(CommandError::Failed("disk full".to_string()))
            } else {
                Ok(model)
            }
        }

        async fn delete_model(&self, model: Model) -> Result<Model, CommandError> {
            if self.fail {
                Err(CommandError::Failed("disk full".to_string()))
            } else {
                Ok(model)
            }
        }

        async fn list_workspaces(&self) -> Result<Vec<Workspace>, CommandError> {
            Ok(Vec::new())
        }

        async fn list_folders(&self, _: &str) -> Result<Vec<Folder>, CommandError> {
            Ok(Vec::new())
        }

        async fn list_http_requests(&self, _: &str) -> Result<Vec<HttpRequest>, CommandError> {
            Ok(Vec::new())
        }

        async fn list_grpc_requests(&self, _: &str) -> Result<Vec<GrpcRequest>, CommandError> {
            Ok(Vec::new())
        }

        async fn list_http_responses(&self, _: &str) -> Result<Vec<HttpResponse>, CommandError> {
            Ok(Vec::new())
        }

        async fn list_grpc_connections(
            &self,
            _: &str,
        ) -> Result<Vec<GrpcConnection>, CommandError> {
            Ok(Vec::new())
        }

        async fn list_environments(&self, _: &str) -> Result<Vec<Environment>, CommandError> {
            Ok(Vec::new())
        }

        async fn list_cookie_jars(&self, _: &str) -> Result<Vec<CookieJar>, CommandError> {
            Ok(Vec::new())
        }

        async fn list_plugins(&self) -> Result<Vec<Plugin>, CommandError> {
            Ok(Vec::new())
        }

        async fn list_key_values(&self) -> Result<Vec<KeyValue>, CommandError> {
            Ok(Vec::new())
        }

        async fn get_settings(&self) -> Result<Settings, CommandError> {
            Ok(Settings::new())
        }
    }

    #[derive(Default)]
    struct RecordingToasts(Mutex<Vec<Toast>>);

    impl ToastSink for RecordingToasts {
        fn show(&self, toast: Toast) {
            self.0.lock().unwrap().push(toast);
        }
    }

    fn dispatcher(fail: bool) -> (CommandDispatcher<StubBackend>, WindowStore, Arc<RecordingToasts>) {
        let store = WindowStore::new();
        let toasts = Arc::new(RecordingToasts::default());
        let dispatcher = CommandDispatcher::new(
            Arc::new(StubBackend { fail }),
            store.clone(),
            Arc::new(NoopTelemetry),
            toasts.clone(),
        );
        (dispatcher, store, toasts)
    }

    #[tokio::test]
    async fn test_success_applies_canonical_model() {
        let (dispatcher, store, toasts) = dispatcher(false);
        let folder = Folder::new("wk1", "Auth");
        let canonical = dispatcher
            .upsert("create_folder", Model::Folder(folder.clone()))
            .await
            .unwrap();
        assert_eq!(canonical, Model::Folder(folder));
        assert_eq!(store.folders().await.len(), 1);
        assert!(toasts.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_leaves_store_untouched_and_toasts() {
        let (dispatcher, store, toasts) = dispatcher(true);
        let folder = Folder::new("wk1", "Auth");
        let err = dispatcher
            .upsert("create_folder", Model::Folder(folder))
            .await
            .unwrap_err();
        assert_eq!(err, CommandError::Failed("disk full".to_string()));
        assert!(store.folders().await.is_empty());

        let toasts = toasts.0.lock().unwrap();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].id, "create_folder");
        assert_eq!(toasts[0].color, ToastColor::Danger);
    }

    #[tokio::test]
    async fn test_delete_removes_from_store() {
        let (dispatcher, store, _) = dispatcher(false);
        let folder = Folder::new("wk1", "Auth");
        store.apply_upsert(Model::Folder(folder.clone())).await;

        dispatcher
            .delete("delete_folder", Model::Folder(folder))
            .await
            .unwrap();
        assert!(store.folders().await.is_empty());
    }

    #[tokio::test]
    async fn test_optimistic_upsert_visible_before_confirmation() {
        let (dispatcher, store, _) = dispatcher(true);
        let folder = Folder::new("wk1", "Auth");
        // Backend rejects, but the optimistic copy was already applied and
        // stays until a relay event corrects it.
        let _ = dispatcher
            .upsert_optimistic("create_folder", Model::Folder(folder.clone()))
            .await;
        assert_eq!(store.folders().await, vec![folder]);
    }

    #[tokio::test]
    async fn test_fire_and_forget_applies_eventually() {
        let (dispatcher, store, _) = dispatcher(false);
        let folder = Folder::new("wk1", "Auth");
        let model = Model::Folder(folder);
        dispatcher.mutate("create_folder", move |backend| async move {
            backend.upsert_model(model).await.map(CommandOutcome::Upserted)
        });

        // The spawned task resolves on the next scheduling ticks
        for _ in 0..50 {
            if !store.folders().await.is_empty() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("fire-and-forget mutation never applied");
    }
}
