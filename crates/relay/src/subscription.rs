//! Broadcast-to-ingress bridge.
//!
//! Each window bridges the relay's raw broadcast into the single typed
//! event stream its ingress consumes. The decode boundary lives here:
//! malformed payloads are logged and dropped, never forwarded, so one
//! bad event cannot take down a window's synchronization. Lagged
//! receivers log the gap and keep going (delivery is at-least-once,
//! not gap-free).

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::warn;

use tether_domain::RelayEvent;

/// Decodes one raw payload, dropping malformed ones with a warning.
#[must_use]
pub fn decode_event(payload: serde_json::Value) -> Option<RelayEvent> {
    match serde_json::from_value(payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(%err, "dropping malformed relay event");
            None
        }
    }
}

/// Spawns the bridge task for one window.
///
/// The returned channel closes when the broadcast sender is dropped or
/// the receiver half is dropped by the ingress.
#[must_use]
pub fn spawn_event_bridge(
    mut events: broadcast::Receiver<serde_json::Value>,
) -> UnboundedReceiver<RelayEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(payload) => {
                    if let Some(event) = decode_event(payload) {
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "relay receiver lagged, continuing");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
    rx
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use tether_domain::{Model, ModelEvent, UpdateSource, Workspace};

    use super::*;

    #[test]
    fn test_decode_rejects_unknown_model_tag() {
        let payload = json!({
            "event": "upserted_model",
            "model": { "model": "mystery_kind", "id": "x" },
            "windowLabel": "main",
            "updateSource": "window",
        });
        assert_eq!(decode_event(payload), None);
    }

    #[tokio::test]
    async fn test_bridge_forwards_decoded_events() {
        let (tx, rx) = broadcast::channel(8);
        let mut bridged = spawn_event_bridge(rx);

        let event = RelayEvent::UpsertedModel(ModelEvent {
            model: Model::Workspace(Workspace::new("Personal")),
            window_label: "main".to_string(),
            update_source: UpdateSource::Window,
        });
        tx.send(json!({ "nonsense": true })).unwrap();
        tx.send(serde_json::to_value(&event).unwrap()).unwrap();

        // The malformed payload is skipped, not fatal
        assert_eq!(bridged.recv().await, Some(event));
        drop(tx);
        assert_eq!(bridged.recv().await, None);
    }
}
