//! Typed coercions out of the dynamic HCL value model.

use hcl::{Map, Value};
use std::fmt;

use crate::{ConfigError, ConfigResult};

/// Human-readable name of a value's type, used in diagnostics.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

pub fn expect_string(value: &Value) -> ConfigResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(mismatch("string", other)),
    }
}

pub fn expect_list(value: &Value) -> ConfigResult<&[Value]> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(mismatch("list", other)),
    }
}

pub fn expect_object(value: &Value) -> ConfigResult<&Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(mismatch("object", other)),
    }
}

/// Coerce a list of strings, failing on the first non-string element.
pub fn expect_string_list(value: &Value) -> ConfigResult<Vec<String>> {
    expect_list(value)?.iter().map(expect_string).collect()
}

/// Render a value for display. Strings are shown without quotes.
pub fn to_display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => Rendered(other).to_string(),
    }
}

/// HCL-like rendering of a value, with nested strings quoted.
struct Rendered<'a>(&'a Value);

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", Rendered(item))?;
                }
                f.write_str("]")
            }
            Value::Object(map) if map.is_empty() => f.write_str("{}"),
            Value::Object(map) => {
                f.write_str("{ ")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", key, Rendered(item))?;
                }
                f.write_str(" }")
            }
        }
    }
}

fn mismatch(expected: &'static str, found: &Value) -> ConfigError {
    ConfigError::TypeMismatch {
        expected,
        found: type_name(found),
    }
}
