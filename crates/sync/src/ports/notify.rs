//! User-notification ports: toasts and editor refresh prompts.

use std::time::Duration;

/// Severity color of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastColor {
    /// Informational.
    Info,
    /// Error.
    Danger,
}

/// A transient, dismissible notification.
///
/// Toasts with equal `id` replace each other rather than stack, so
/// repeated identical failures show once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Deduplication key (the originating mutation key).
    pub id: String,
    /// Human-readable message.
    pub message: String,
    /// Severity color.
    pub color: ToastColor,
    /// How long the toast stays visible.
    pub timeout: Duration,
}

/// Displays toasts to the user.
pub trait ToastSink: Send + Sync {
    /// Shows a toast, replacing any visible toast with the same id.
    fn show(&self, toast: Toast);
}

/// Toast sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToastSink;

impl ToastSink for NoopToastSink {
    fn show(&self, _toast: Toast) {}
}

/// Notifies editor sessions about external changes.
///
/// When a foreign window updates an HTTP request, any open edit buffer
/// for that request is prompted to refresh.
pub trait EditorNotifier: Send + Sync {
    /// Signals that the given request changed in another window.
    fn request_updated_externally(&self, request_id: &str);
}

/// Editor notifier that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEditorNotifier;

impl EditorNotifier for NoopEditorNotifier {
    fn request_updated_externally(&self, _request_id: &str) {}
}
