//! The error-like record shared by error sources and exception events.

use std::backtrace::{Backtrace, BacktraceStatus};

use serde::{Deserialize, Serialize};

/// Name given to errors synthesized from a bare message.
pub const DEFAULT_ERROR_NAME: &str = "Error";

/// A structured error: a name, a message, and an optional stack.
///
/// This is plain data. It is what gets reported, never what gets raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error class name (e.g. `"Error"`, `"ParseIntError"`, `"Panic"`).
    pub name: String,
    /// Human-readable message.
    pub message: String,
    /// Stack or cause chain, if one was available.
    pub stack: Option<String>,
}

impl ErrorInfo {
    /// Creates an error with the given name and message and no stack.
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    /// Synthesizes an error from a bare message.
    ///
    /// The name is [`DEFAULT_ERROR_NAME`] and the stack is the backtrace of
    /// the calling thread, or an empty string when backtraces are disabled.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            name: DEFAULT_ERROR_NAME.to_string(),
            message: message.into(),
            stack: Some(captured_stack()),
        }
    }

    /// Describes a Rust error value.
    ///
    /// The name is the error's bare type name, the message its `Display`
    /// output, and the stack its `source()` chain (one `caused by:` line per
    /// link), or `None` when the error has no source.
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        Self {
            name: short_type_name::<E>().to_string(),
            message: err.to_string(),
            stack: if chain.is_empty() {
                None
            } else {
                Some(chain.join("\n"))
            },
        }
    }

    /// Replaces the stack.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

impl std::fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

/// Backtrace of the current thread, or `""` if capture is disabled.
pub(crate) fn captured_stack() -> String {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => backtrace.to_string(),
        _ => String::new(),
    }
}

/// `std::any::type_name` without the module path or generic arguments.
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
