//! The telemetry client: scope state, tracking operations, and fan-out.
//!
//! Every tracking operation funnels into [`TelemetryClient::track_event`],
//! which builds one [`TelemetryEvent`] and fires it on the client's emitter.
//! Operations whose required field is empty do nothing.

use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

use beacon_common::{
    Disposable, Disposables, Emitter, ErrorInfo, ErrorSignal, ErrorSource, Event, Subscription,
};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::config::TelemetryConfig;
use crate::error::TelemetryError;
use crate::event::{EventKind, EventOptions, TelemetryEvent};
use crate::exception::{format_id, resolve_path, ExceptionInput};

#[derive(Debug, Default)]
struct State {
    scope: Option<String>,
    collects_exceptions: bool,
    prev_page: Option<String>,
    prev_page_at: Option<Instant>,
}

struct Inner {
    id: Uuid,
    state: Mutex<State>,
    on_did_track_event: Emitter<TelemetryEvent>,
    disposables: Disposables,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.disposables.dispose();
    }
}

/// A scoped telemetry client.
///
/// Cloning yields another handle to the same client. The client is disposed
/// by [`TelemetryClient::dispose`] or when the last handle is dropped,
/// whichever comes first.
///
/// ```rust
/// use beacon_telemetry::{EventOptions, TelemetryClient, TelemetryConfig};
/// use std::sync::{Arc, Mutex};
///
/// let client = TelemetryClient::new(TelemetryConfig::with_scope("shop"));
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let _sub = client.on_did_track_event(move |e| sink.lock().unwrap().push(e.scope.clone()));
///
/// client.track_event(EventOptions::new("add_to_cart").with_scope("cart"));
///
/// assert_eq!(*seen.lock().unwrap(), vec![vec!["shop".to_string(), "cart".to_string()]]);
/// ```
#[derive(Clone)]
pub struct TelemetryClient {
    inner: Arc<Inner>,
}

impl TelemetryClient {
    /// Creates a client from its configuration.
    pub fn new(config: TelemetryConfig) -> Self {
        let on_did_track_event = Emitter::new();
        let disposables = Disposables::new();
        disposables.push(on_did_track_event.clone());

        let id = Uuid::new_v4();
        tracing::debug!(client = %id, scope = ?config.scope, "telemetry client created");

        Self {
            inner: Arc::new(Inner {
                id,
                state: Mutex::new(State {
                    scope: config.scope,
                    ..State::default()
                }),
                on_did_track_event,
                disposables,
            }),
        }
    }

    fn from_weak(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Identifier used to correlate this client's log records.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Current client scope, if any.
    pub fn scope(&self) -> Option<String> {
        self.state().scope.clone()
    }

    /// Replaces the client scope.
    ///
    /// An empty scope is stored but never prepended to events.
    pub fn set_scope(&self, scope: impl Into<String>) {
        self.state().scope = Some(scope.into());
    }

    /// Removes the client scope.
    pub fn clear_scope(&self) {
        self.state().scope = None;
    }

    /// Subscribe-only handle to the events this client fires.
    pub fn events(&self) -> Event<TelemetryEvent> {
        self.inner.on_did_track_event.event()
    }

    /// Registers `listener` for every event this client fires.
    pub fn on_did_track_event(
        &self,
        listener: impl Fn(&TelemetryEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.events().subscribe(listener)
    }

    /// Returns `true` once [`TelemetryClient::collect_exceptions`] was called.
    pub fn collects_exceptions(&self) -> bool {
        self.state().collects_exceptions
    }

    /// Reports every error raised by `source` as an exception event.
    ///
    /// Signals carrying a structured error are reported verbatim; the others
    /// are wrapped into an error built from their message. The subscription
    /// lives until the client is disposed. Each call adds one subscription.
    pub fn collect_exceptions(&self, source: &dyn ErrorSource) {
        self.state().collects_exceptions = true;

        let weak = Arc::downgrade(&self.inner);
        let sub = source.subscribe(Arc::new(move |signal: &ErrorSignal| {
            let Some(client) = Self::from_weak(&weak) else {
                return;
            };
            let info = match &signal.error {
                Some(error) => error.clone(),
                None => ErrorInfo::from_message(signal.message.clone()),
            };
            client.track_exception(info);
        }));
        self.inner.disposables.push(sub);
        tracing::debug!(client = %self.inner.id, "collecting uncaught errors");
    }

    /// Fires one event.
    ///
    /// The client scope, when set and non-empty, is prepended to the caller
    /// scope. Listeners run before this returns, in subscription order.
    pub fn track_event(&self, options: impl Into<EventOptions>) {
        let options = options.into();
        if options.name.is_empty() {
            return;
        }

        let own_scope = self.state().scope.clone();
        let mut scope = options.scope.into_vec();
        if let Some(own) = own_scope.filter(|s| !s.is_empty()) {
            scope.insert(0, own);
        }

        let event = TelemetryEvent {
            name: options.name,
            date: Utc::now(),
            scope,
            properties: options.properties,
        };
        tracing::trace!(
            client = %self.inner.id,
            event_name = %event.name,
            scope = ?event.scope,
            "firing telemetry event"
        );
        self.inner.on_did_track_event.fire(&event);
    }

    /// Reports an exception.
    ///
    /// Absent input does nothing. Unsupported input is dropped; see
    /// [`TelemetryClient::try_track_exception`] for a strict variant.
    pub fn track_exception(&self, input: impl Into<ExceptionInput>) {
        if let Err(TelemetryError::UnsupportedException { kind }) = self.try_track_exception(input)
        {
            tracing::debug!(client = %self.inner.id, kind, "dropping unsupported exception input");
        }
    }

    /// Reports an exception, saying why nothing was reported.
    ///
    /// # Errors
    ///
    /// - `TelemetryError::MissingField` for null input or an empty message.
    /// - `TelemetryError::UnsupportedException` for input that is neither an
    ///   error nor a message.
    pub fn try_track_exception(
        &self,
        input: impl Into<ExceptionInput>,
    ) -> Result<(), TelemetryError> {
        let input = input.into();
        if input.is_absent() {
            return Err(TelemetryError::MissingField { field: "exception" });
        }

        let info = match input {
            ExceptionInput::Error(info) => info,
            ExceptionInput::Message(message) => ErrorInfo::from_message(message),
            unsupported @ ExceptionInput::Unsupported(_) => {
                return Err(TelemetryError::UnsupportedException {
                    kind: unsupported.type_label(),
                });
            }
        };

        self.track_event(
            EventOptions::new(EventKind::Exception.as_str())
                .with_property("name", info.name)
                .with_property("message", info.message)
                .with_property("stack", info.stack),
        );
        Ok(())
    }

    /// Reports an exception labelled with an identifier found inside `root`.
    ///
    /// Follows `path` one key per level. If every key is found, the message
    /// is `"{label} for id: {id}"` with the value reached, `null` for an empty
    /// path; otherwise it is `label` alone. Never fails, whatever the shape of
    /// `root`.
    pub fn conditional_track_exception<K: AsRef<str>>(
        &self,
        root: &Value,
        path: &[K],
        label: &str,
    ) {
        let message = match resolve_path(root, path) {
            Some(id) => format!("{label} for id: {}", format_id(&id)),
            None => label.to_string(),
        };
        self.track_exception(ErrorInfo::from_message(message));
    }

    /// Reports a named measurement. `value` is passed through unchanged.
    pub fn track_metric(&self, name: &str, value: impl Into<Value>) {
        if name.is_empty() {
            return;
        }
        self.track_event(
            EventOptions::new(EventKind::Metric.as_str())
                .with_property("name", name)
                .with_property("value", value),
        );
    }

    /// Reports a diagnostic message.
    pub fn track_trace(&self, message: &str) {
        if message.is_empty() {
            return;
        }
        self.track_event(
            EventOptions::new(EventKind::Trace.as_str()).with_property("message", message),
        );
    }

    /// Reports a page view.
    ///
    /// `previousPage` and `duration` (milliseconds) describe the previous
    /// call on this client and are null on the first one.
    pub fn track_page_view(&self, page: &str) {
        if page.is_empty() {
            return;
        }

        let options = {
            let mut state = self.state();
            let now = Instant::now();
            let duration = state
                .prev_page_at
                .map(|at| u64::try_from(now.duration_since(at).as_millis()).unwrap_or(u64::MAX));
            let options = EventOptions::new(EventKind::PageView.as_str())
                .with_property("page", page)
                .with_property("previousPage", state.prev_page.clone())
                .with_property("duration", duration);
            state.prev_page = Some(page.to_string());
            state.prev_page_at = Some(now);
            options
        };
        self.track_event(options);
    }

    /// Forwards every event fired by `child` through this client.
    ///
    /// Forwarded events pass through [`TelemetryClient::track_event`], so this
    /// client's scope lands in front of the child's. The returned
    /// subscription is owned by the caller and is not released when this
    /// client is disposed. Mount cycles are not detected.
    pub fn mount(&self, child: &TelemetryClient) -> Subscription {
        let weak = Arc::downgrade(&self.inner);
        let sub = child.on_did_track_event(move |event| {
            if let Some(parent) = Self::from_weak(&weak) {
                parent.track_event(event.clone());
            }
        });
        tracing::debug!(
            parent = %self.inner.id,
            child = %child.inner.id,
            "mounted telemetry client"
        );
        sub
    }

    /// Releases the emitter and every subscription this client registered.
    ///
    /// Tracking after disposal fires nothing.
    pub fn dispose(&self) {
        if self.inner.disposables.is_disposed() {
            return;
        }
        self.inner.disposables.dispose();
        tracing::debug!(client = %self.inner.id, "telemetry client disposed");
    }

    /// Returns `true` once the client has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.inner.disposables.is_disposed()
    }
}

impl Disposable for TelemetryClient {
    fn dispose(&self) {
        TelemetryClient::dispose(self);
    }
}

impl fmt::Debug for TelemetryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("TelemetryClient")
            .field("id", &self.inner.id)
            .field("scope", &state.scope)
            .field("collects_exceptions", &state.collects_exceptions)
            .field("listeners", &self.inner.on_did_track_event.listener_count())
            .field("disposed", &self.inner.disposables.is_disposed())
            .finish()
    }
}
