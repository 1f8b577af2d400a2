//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the sync engine and external
//! systems. Each port is a trait implemented by adapters elsewhere:
//! the command backend, telemetry recording, user-facing toasts, and
//! the editor collaborator.

mod backend;
mod notify;
mod telemetry;

pub use backend::{CommandBackend, CommandError, CommandOutcome};
pub use notify::{EditorNotifier, NoopEditorNotifier, NoopToastSink, Toast, ToastColor, ToastSink};
pub use telemetry::{MutationOutcome, NoopTelemetry, Telemetry};
