//! The canonical telemetry event and the inputs that produce it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved event names for the built-in tracking operations.
///
/// Caller-named events from [`TelemetryClient::track_event`] have no kind.
///
/// [`TelemetryClient::track_event`]: crate::TelemetryClient::track_event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// An error report.
    Exception,
    /// A named measurement.
    Metric,
    /// A free-form diagnostic message.
    Trace,
    /// Navigation to a page or screen.
    PageView,
}

impl EventKind {
    /// Returns the event name used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exception => "Exception",
            Self::Metric => "Metric",
            Self::Trace => "Trace",
            Self::PageView => "PageView",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = ParseEventKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Exception" => Ok(Self::Exception),
            "Metric" => Ok(Self::Metric),
            "Trace" => Ok(Self::Trace),
            "PageView" => Ok(Self::PageView),
            _ => Err(ParseEventKindError(s.to_string())),
        }
    }
}

/// Error returned when a name is not one of the reserved event kinds.
#[derive(Debug, Clone)]
pub struct ParseEventKindError(pub String);

impl std::fmt::Display for ParseEventKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "not a reserved event kind: {}", self.0)
    }
}

impl std::error::Error for ParseEventKindError {}

/// A normalized telemetry event, as delivered to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Event name: caller-supplied or a reserved [`EventKind`] name.
    pub name: String,
    /// Wall-clock time the event was fired.
    pub date: DateTime<Utc>,
    /// Origin labels, outermost first.
    pub scope: Vec<String>,
    /// Kind-specific payload.
    pub properties: Map<String, Value>,
}

impl TelemetryEvent {
    /// Returns the reserved kind of this event, if its name is one.
    pub fn kind(&self) -> Option<EventKind> {
        self.name.parse().ok()
    }

    /// Looks up a property by key.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Caller-supplied scope: one label or an ordered list of labels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeValue {
    /// No caller scope.
    #[default]
    None,
    /// A single label.
    One(String),
    /// Several labels, outermost first.
    Many(Vec<String>),
}

impl ScopeValue {
    /// Normalizes the value into a list of labels.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::One(s) => vec![s],
            Self::Many(v) => v,
        }
    }
}

impl From<&str> for ScopeValue {
    fn from(s: &str) -> Self {
        Self::One(s.to_string())
    }
}

impl From<String> for ScopeValue {
    fn from(s: String) -> Self {
        Self::One(s)
    }
}

impl From<Vec<String>> for ScopeValue {
    fn from(v: Vec<String>) -> Self {
        Self::Many(v)
    }
}

impl From<Vec<&str>> for ScopeValue {
    fn from(v: Vec<&str>) -> Self {
        Self::Many(v.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ScopeValue {
    fn from(v: [&str; N]) -> Self {
        Self::Many(v.iter().map(|s| s.to_string()).collect())
    }
}

/// Arguments to [`TelemetryClient::track_event`].
///
/// [`TelemetryClient::track_event`]: crate::TelemetryClient::track_event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOptions {
    /// Event name. An empty name suppresses the event.
    pub name: String,
    /// Caller scope, appended after the client's own scope.
    pub scope: ScopeValue,
    /// Payload.
    pub properties: Map<String, Value>,
}

impl EventOptions {
    /// Starts options for an event called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the caller scope.
    pub fn with_scope(mut self, scope: impl Into<ScopeValue>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Adds one property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replaces all properties.
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }
}

impl From<&str> for EventOptions {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EventOptions {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Re-tracks an already fired event; the date is stamped again.
impl From<TelemetryEvent> for EventOptions {
    fn from(event: TelemetryEvent) -> Self {
        Self {
            name: event.name,
            scope: ScopeValue::Many(event.scope),
            properties: event.properties,
        }
    }
}
