//! Shared primitives for the beacon telemetry workspace.
//!
//! This crate provides the building blocks the telemetry client is wired
//! from, kept apart so the client can treat them as opaque collaborators:
//!
//! | Primitive | Purpose |
//! |-----------|---------|
//! | [`Emitter`] | Ordered multi-listener broadcaster with disposable subscriptions |
//! | [`Disposables`] | Scoped-lifetime container releasing every resource exactly once |
//! | [`ErrorSource`] | Host-wide uncaught error channel ([`PanicErrorSource`], [`ManualErrorSource`]) |
//! | [`ErrorInfo`] | The error-like record carried by error signals and exception events |
//!
//! # Usage
//!
//! ```rust
//! use beacon_common::{Disposable, Disposables, Emitter};
//! use std::sync::{Arc, Mutex};
//!
//! let emitter: Emitter<u32> = Emitter::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let sub = emitter.subscribe(move |v: &u32| sink.lock().unwrap().push(*v));
//!
//! emitter.fire(&1);
//! sub.dispose();
//! emitter.fire(&2);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1]);
//!
//! let scope = Disposables::new();
//! scope.push(emitter.clone());
//! scope.dispose();
//! assert!(emitter.is_disposed());
//! ```

mod dispose;
mod emitter;
mod error_info;
mod error_source;

pub use dispose::{Disposable, Disposables, Subscription};
pub use emitter::{Emitter, Event, Listener};
pub use error_info::{ErrorInfo, DEFAULT_ERROR_NAME};
pub use error_source::{ErrorSignal, ErrorSource, ManualErrorSource, PanicErrorSource};
