//! Client-side telemetry for beacon.
//!
//! A [`TelemetryClient`] turns application signals into one normalized
//! [`TelemetryEvent`] shape, tags it with a hierarchical scope, and
//! broadcasts it synchronously to its listeners. Clients compose into a tree
//! with [`TelemetryClient::mount`]: a child's events bubble up through each
//! parent, which prepends its own scope label on the way.
//!
//! # Event kinds
//!
//! | Operation | Event name | Properties | Required |
//! |-----------|------------|------------|----------|
//! | `track_event` | caller-supplied | caller-supplied | `name` |
//! | `track_exception` | `Exception` | `name`, `message`, `stack` | `exception` |
//! | `track_metric` | `Metric` | `name`, `value` | `name` |
//! | `track_trace` | `Trace` | `message` | `message` |
//! | `track_page_view` | `PageView` | `page`, `previousPage`, `duration` | `page` |
//!
//! A call whose required field is empty fires nothing and reports nothing.
//! Instrumentation never fails the instrumented code.
//!
//! # Usage
//!
//! ```rust
//! use beacon_telemetry::{TelemetryClient, TelemetryConfig};
//!
//! let app = TelemetryClient::new(TelemetryConfig::with_scope("app"));
//! let checkout = TelemetryClient::new(TelemetryConfig::with_scope("checkout"));
//! let _link = app.mount(&checkout);
//!
//! let _sub = app.on_did_track_event(|event| {
//!     assert_eq!(event.scope, ["app", "checkout"]);
//! });
//! checkout.track_page_view("/cart");
//! ```

mod client;
mod config;
mod error;
mod event;
mod exception;
mod sink;

pub use beacon_common::{
    Disposable, ErrorInfo, ErrorSignal, ErrorSource, ManualErrorSource, PanicErrorSource,
    Subscription,
};
pub use client::TelemetryClient;
pub use config::{init_logging, load_config, ConfigError, LoggingConfig, TelemetryConfig};
pub use error::TelemetryError;
pub use event::{EventKind, EventOptions, ParseEventKindError, ScopeValue, TelemetryEvent};
pub use exception::ExceptionInput;
pub use sink::TracingSink;
