//! Listener that mirrors telemetry events into `tracing`.

use crate::event::{EventKind, TelemetryEvent};

/// Re-emits every telemetry event as a `tracing` record.
///
/// Exceptions are logged at `warn`, everything else at `info`. The scope is
/// joined with `/` and the properties are rendered as JSON.
///
/// ```rust
/// use beacon_telemetry::{TelemetryClient, TelemetryConfig, TracingSink};
///
/// let client = TelemetryClient::new(TelemetryConfig::with_scope("app"));
/// let _sub = client.on_did_track_event(TracingSink::listener());
/// client.track_trace("ready");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink {
    _private: (),
}

impl TracingSink {
    /// Returns a listener suitable for `on_did_track_event` or `Emitter::subscribe`.
    pub fn listener() -> impl Fn(&TelemetryEvent) + Send + Sync + 'static {
        let sink = Self::default();
        move |event: &TelemetryEvent| sink.record(event)
    }

    /// Logs one event.
    pub fn record(&self, event: &TelemetryEvent) {
        let scope = event.scope.join("/");
        let properties = serde_json::Value::Object(event.properties.clone()).to_string();
        match event.kind() {
            Some(EventKind::Exception) => tracing::warn!(
                target: "beacon::telemetry",
                event_name = %event.name,
                scope = %scope,
                date = %event.date.to_rfc3339(),
                properties = %properties,
                "telemetry exception"
            ),
            _ => tracing::info!(
                target: "beacon::telemetry",
                event_name = %event.name,
                scope = %scope,
                date = %event.date.to_rfc3339(),
                properties = %properties,
                "telemetry event"
            ),
        }
    }
}
