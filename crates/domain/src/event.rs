//! Relay event payloads.
//!
//! Every mutation the backend persists is broadcast to all windows as
//! one of two named events, `upserted_model` and `deleted_model`, each
//! carrying a [`ModelEvent`]. Delivery is at-least-once and unordered
//! across model kinds.

use serde::{Deserialize, Serialize};

use crate::model::Model;

/// What triggered a mutation.
///
/// Only `Window` edits are subject to echo suppression; all other
/// sources have no optimistic counterpart and are always applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSource {
    /// A filesystem/cloud sync agent.
    Sync,
    /// A human-interactive edit in some window.
    Window,
    /// A plugin.
    Plugin,
    /// A background job.
    Background,
}

/// Payload of a single relay broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelEvent {
    /// The model in its canonical post-mutation state.
    pub model: Model,
    /// Label of the window that originated the mutation.
    pub window_label: String,
    /// What triggered the mutation.
    pub update_source: UpdateSource,
}

/// A decoded relay broadcast, tagged by channel name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RelayEvent {
    /// `upserted_model`: the model was created or updated.
    UpsertedModel(ModelEvent),
    /// `deleted_model`: the model was deleted.
    DeletedModel(ModelEvent),
}

impl RelayEvent {
    /// The payload, regardless of channel.
    #[must_use]
    pub const fn payload(&self) -> &ModelEvent {
        match self {
            Self::UpsertedModel(payload) | Self::DeletedModel(payload) => payload,
        }
    }
}
