//! Host-wide uncaught error channels.
//!
//! An [`ErrorSource`] is anything that can report errors nobody handled.
//! Two implementations are provided:
//!
//! - [`PanicErrorSource`]: process-wide, fed by a panic hook that is
//!   installed on first use and chains to the previously installed hook.
//! - [`ManualErrorSource`]: raised explicitly by the host (an FFI boundary, a
//!   task join handle, a test).

use std::panic;
use std::sync::OnceLock;

use crate::dispose::Subscription;
use crate::emitter::{Emitter, Listener};
use crate::error_info::{captured_stack, ErrorInfo};

/// One uncaught-error notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSignal {
    /// Message describing the failure. Always present.
    pub message: String,
    /// Structured error, when the host had one.
    pub error: Option<ErrorInfo>,
}

impl ErrorSignal {
    /// A signal that only carries a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    /// A signal carrying a structured error.
    pub fn error(error: ErrorInfo) -> Self {
        Self {
            message: error.message.clone(),
            error: Some(error),
        }
    }
}

/// A subscribable source of uncaught errors.
pub trait ErrorSource: Send + Sync {
    /// Registers `listener` for every subsequent error signal.
    fn subscribe(&self, listener: Listener<ErrorSignal>) -> Subscription;
}

/// Error source raised explicitly by its owner.
#[derive(Debug, Clone, Default)]
pub struct ManualErrorSource {
    emitter: Emitter<ErrorSignal>,
}

impl ManualErrorSource {
    /// Creates a source with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers `signal` to every listener.
    pub fn raise(&self, signal: ErrorSignal) {
        self.emitter.fire(&signal);
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.emitter.listener_count()
    }
}

impl ErrorSource for ManualErrorSource {
    fn subscribe(&self, listener: Listener<ErrorSignal>) -> Subscription {
        self.emitter.event().subscribe_arc(listener)
    }
}

static PANICS: OnceLock<Emitter<ErrorSignal>> = OnceLock::new();

/// Process-wide error source reporting every panic.
///
/// The first call to [`PanicErrorSource::global`] installs a panic hook. The
/// hook runs the previously installed hook first, so default panic output is
/// kept, then delivers an [`ErrorSignal`] named `Panic` to every listener.
/// Listeners run on the panicking thread and must not panic themselves.
#[derive(Debug, Clone, Copy)]
pub struct PanicErrorSource {
    _private: (),
}

impl PanicErrorSource {
    /// Returns the process-wide source, installing the panic hook if needed.
    pub fn global() -> Self {
        PANICS.get_or_init(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                previous(info);

                let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = info.payload().downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Box<dyn Any>".to_string()
                };
                let mut stack = info
                    .location()
                    .map(|loc| format!("at {}:{}:{}", loc.file(), loc.line(), loc.column()))
                    .unwrap_or_default();
                let backtrace = captured_stack();
                if !backtrace.is_empty() {
                    stack.push('\n');
                    stack.push_str(&backtrace);
                }

                if let Some(emitter) = PANICS.get() {
                    emitter.fire(&ErrorSignal::error(
                        ErrorInfo::new("Panic", message).with_stack(stack),
                    ));
                }
            }));
            tracing::debug!("installed panic hook for error collection");
            Emitter::new()
        });
        Self { _private: () }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        PANICS.get().map_or(0, Emitter::listener_count)
    }
}

impl ErrorSource for PanicErrorSource {
    fn subscribe(&self, listener: Listener<ErrorSignal>) -> Subscription {
        match PANICS.get() {
            Some(emitter) => emitter.event().subscribe_arc(listener),
            None => Subscription::noop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispose::Disposable;
    use std::sync::{Arc, Mutex};

    #[test]
    fn manual_source_delivers_until_unsubscribed() {
        let source = ManualErrorSource::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = source.subscribe(Arc::new(move |s: &ErrorSignal| {
            sink.lock().unwrap().push(s.message.clone())
        }));

        source.raise(ErrorSignal::message("first"));
        sub.dispose();
        source.raise(ErrorSignal::message("second"));

        assert_eq!(*seen.lock().unwrap(), vec!["first"]);
        assert_eq!(source.listener_count(), 0);
    }

    #[test]
    fn error_signal_copies_message_from_error() {
        let signal = ErrorSignal::error(ErrorInfo::new("RangeError", "out of range"));
        assert_eq!(signal.message, "out of range");
        assert_eq!(signal.error.unwrap().name, "RangeError");
    }
}
