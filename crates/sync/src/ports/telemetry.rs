//! Telemetry port.

/// Outcome of a dispatched mutation, recorded per mutation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The backend command resolved.
    Success,
    /// The backend command rejected.
    Error,
}

/// Records mutation outcomes keyed by mutation key.
pub trait Telemetry: Send + Sync {
    /// Records one outcome for the given mutation key.
    fn record(&self, key: &str, outcome: MutationOutcome);
}

/// Telemetry sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl Telemetry for NoopTelemetry {
    fn record(&self, _key: &str, _outcome: MutationOutcome) {}
}
