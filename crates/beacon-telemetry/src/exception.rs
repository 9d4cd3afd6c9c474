//! Exception inputs and the key-path lookup behind conditional exceptions.

use std::borrow::Cow;

use beacon_common::ErrorInfo;
use serde_json::Value;

/// What a caller may hand to [`TelemetryClient::track_exception`].
///
/// [`TelemetryClient::track_exception`]: crate::TelemetryClient::track_exception
#[derive(Debug, Clone, PartialEq)]
pub enum ExceptionInput {
    /// A structured error; name, message and stack are reported verbatim.
    Error(ErrorInfo),
    /// A bare message; reported as an error with the default name.
    Message(String),
    /// Anything else. Not reported.
    ///
    /// Whether such input should be dropped or rejected is an open product
    /// question; `track_exception` drops it and `try_track_exception`
    /// rejects it.
    Unsupported(Value),
}

impl ExceptionInput {
    /// Describes a Rust error value. See [`ErrorInfo::from_error`].
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        Self::Error(ErrorInfo::from_error(err))
    }

    /// Returns `true` when there is nothing to report: a null value or an
    /// empty message.
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Message(m) => m.is_empty(),
            Self::Unsupported(v) => v.is_null(),
            Self::Error(_) => false,
        }
    }

    /// Short description of the input type, for logs and errors.
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::Error(_) => "error",
            Self::Message(_) => "string",
            Self::Unsupported(v) => json_type(v),
        }
    }
}

impl From<ErrorInfo> for ExceptionInput {
    fn from(info: ErrorInfo) -> Self {
        Self::Error(info)
    }
}

impl From<&str> for ExceptionInput {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for ExceptionInput {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

/// JSON strings become messages, objects shaped like [`ErrorInfo`] (string
/// `name` and `message`, optional `stack`) become errors, and everything else
/// is unsupported.
impl From<Value> for ExceptionInput {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Message(s),
            Value::Object(_) => match serde_json::from_value::<ErrorInfo>(value.clone()) {
                Ok(info) => Self::Error(info),
                Err(_) => Self::Unsupported(value),
            },
            other => Self::Unsupported(other),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Follows `path` from `root`, one key per level.
///
/// A key matches an object member with that name, an array element or a
/// string character (UTF-16 unit) whose canonical index it spells, or the
/// `length` of an array or string. Returns `None` as soon as a level does not
/// own the key. An empty path owns nothing to descend into and resolves to
/// `null`.
pub(crate) fn resolve_path<'a, K: AsRef<str>>(
    root: &'a Value,
    path: &[K],
) -> Option<Cow<'a, Value>> {
    if path.is_empty() {
        return Some(Cow::Owned(Value::Null));
    }
    let mut current = Cow::Borrowed(root);
    for key in path {
        let key = key.as_ref();
        current = match current {
            Cow::Borrowed(value) => own_member(value, key)?,
            Cow::Owned(value) => Cow::Owned(own_member(&value, key)?.into_owned()),
        };
    }
    Some(current)
}

fn own_member<'a>(value: &'a Value, key: &str) -> Option<Cow<'a, Value>> {
    match value {
        Value::Object(map) => map.get(key).map(Cow::Borrowed),
        Value::Array(items) if key == "length" => Some(Cow::Owned(Value::from(items.len()))),
        Value::Array(items) => index(key).and_then(|i| items.get(i)).map(Cow::Borrowed),
        Value::String(s) if key == "length" => {
            Some(Cow::Owned(Value::from(s.encode_utf16().count())))
        }
        Value::String(s) => {
            let unit = s.encode_utf16().nth(index(key)?)?;
            Some(Cow::Owned(Value::String(String::from_utf16_lossy(&[unit]))))
        }
        _ => None,
    }
}

/// Parses a canonical array index: no sign, no leading zeros.
fn index(key: &str) -> Option<usize> {
    key.parse::<usize>().ok().filter(|i| i.to_string() == key)
}

/// Renders a resolved identifier; strings appear without quotes.
pub(crate) fn format_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_members_and_indices() {
        let root = json!({"order": {"lines": [{"sku": "A-1"}]}});
        assert_eq!(
            resolve_path(&root, &["order", "lines", "0", "sku"]).as_deref(),
            Some(&json!("A-1"))
        );
    }

    #[test]
    fn stops_at_first_missing_key() {
        let root = json!({"a": {}});
        assert_eq!(resolve_path(&root, &["a", "b"]), None);
        assert_eq!(resolve_path(&root, &["x", "a"]), None);
        assert_eq!(resolve_path(&root, &["x", "a", "b"]), None);
    }

    #[test]
    fn scalars_and_null_own_nothing() {
        assert_eq!(resolve_path(&Value::Null, &["a"]), None);
        assert_eq!(resolve_path(&json!(3), &["a"]), None);
        assert_eq!(resolve_path(&json!({"a": null}), &["a", "b"]), None);
        assert_eq!(resolve_path(&json!([1, 2]), &["5"]), None);
        assert_eq!(resolve_path(&json!([1, 2]), &["-1"]), None);
        assert_eq!(resolve_path(&json!([1, 2]), &["01"]), None);
        assert_eq!(resolve_path(&json!([1, 2]), &["+1"]), None);
    }

    #[test]
    fn strings_own_their_indices_and_length() {
        let root = json!({"code": "abc"});
        assert_eq!(
            resolve_path(&root, &["code", "1"]).as_deref(),
            Some(&json!("b"))
        );
        assert_eq!(
            resolve_path(&root, &["code", "length"]).as_deref(),
            Some(&json!(3))
        );
        assert_eq!(
            resolve_path(&root, &["code", "0", "0"]).as_deref(),
            Some(&json!("a"))
        );
        assert_eq!(resolve_path(&root, &["code", "3"]), None);
        assert_eq!(resolve_path(&root, &["code", "length", "x"]), None);
    }

    #[test]
    fn arrays_own_their_length() {
        assert_eq!(
            resolve_path(&json!([7, 8, 9]), &["length"]).as_deref(),
            Some(&json!(3))
        );
    }

    #[test]
    fn empty_path_resolves_to_null() {
        let empty: [&str; 0] = [];
        assert_eq!(
            resolve_path(&json!({"a": 1}), &empty).as_deref(),
            Some(&Value::Null)
        );
    }

    #[test]
    fn null_member_still_counts_as_owned() {
        let root = json!({"id": null});
        assert_eq!(resolve_path(&root, &["id"]).as_deref(), Some(&Value::Null));
    }

    #[test]
    fn format_id_unquotes_strings() {
        assert_eq!(format_id(&json!("abc")), "abc");
        assert_eq!(format_id(&json!(42)), "42");
        assert_eq!(format_id(&json!(true)), "true");
    }

    #[test]
    fn json_values_classify_by_shape() {
        assert_eq!(ExceptionInput::from(json!("boom")), ExceptionInput::Message("boom".into()));
        assert!(matches!(
            ExceptionInput::from(json!({"name": "TypeError", "message": "bad"})),
            ExceptionInput::Error(ref e) if e.name == "TypeError" && e.stack.is_none()
        ));
        assert!(matches!(
            ExceptionInput::from(json!({"code": 3})),
            ExceptionInput::Unsupported(_)
        ));
        assert_eq!(ExceptionInput::from(json!(12)).type_label(), "number");
    }

    #[test]
    fn absence_covers_null_and_empty_message() {
        assert!(ExceptionInput::from(Value::Null).is_absent());
        assert!(ExceptionInput::from("").is_absent());
        assert!(!ExceptionInput::from("x").is_absent());
        assert!(!ExceptionInput::from(json!(0)).is_absent());
    }
}
