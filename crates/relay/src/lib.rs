//! Tether Relay - In-memory backend and relay adapters
//!
//! Adapters behind the sync engine's ports: a shared in-memory
//! [`MemoryRelay`] standing in for the backend store plus its broadcast
//! fan-out, and the [`subscription`] bridge that turns raw broadcast
//! payloads into the typed event stream each window's ingress consumes.

pub mod backend;
pub mod subscription;

pub use backend::{MemoryBackend, MemoryRelay};
pub use subscription::spawn_event_bridge;
