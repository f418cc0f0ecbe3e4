//! Dotted-path lookups into a feature's property bag.
//!
//! A string value of the form `"@other.path"` is a reference: the lookup
//! resolves `other.path` instead, one level deep.

use serde_json::Value;

fn path_key<'a>(props: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(props, |v, key| v.get(key))
        .filter(|v| !v.is_null())
}

/// Looks up `path`, following a single `@` reference.
pub fn get_property<'a>(props: &'a Value, path: &str) -> Option<&'a Value> {
    let val = path_key(props, path)?;
    match val.as_str() {
        Some(s) if s.len() > 1 && s.starts_with('@') => path_key(props, &s[1..]),
        _ => Some(val),
    }
}

/// `params.<key>`, with `@` references resolved.
pub fn get_parameter<'a>(props: &'a Value, key: &str) -> Option<&'a Value> {
    get_property(props, &format!("params.{key}"))
}

/// `style.<key>`, with `@` references resolved.
pub fn get_style<'a>(props: &'a Value, key: &str) -> Option<&'a Value> {
    get_property(props, &format!("style.{key}"))
}

/// `params.<key>` as a string.
pub fn param_str<'a>(props: &'a Value, key: &str) -> Option<&'a str> {
    get_parameter(props, key).and_then(Value::as_str)
}

/// `params.<key>` as a number.
pub fn param_f64(props: &Value, key: &str) -> Option<f64> {
    get_parameter(props, key).and_then(Value::as_f64)
}

/// `params.<key>` as a boolean.
pub fn param_bool(props: &Value, key: &str) -> Option<bool> {
    get_parameter(props, key).and_then(Value::as_bool)
}

/// Textual rendering of a property used in cache keys.
///
/// Strings are taken verbatim, everything else in its JSON form.
pub fn key_fragment(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => default.to_string(),
    }
}
