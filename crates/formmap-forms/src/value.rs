//! Bound field values.
//!
//! [`FieldValue`] is what a field holds at runtime. Request parameters arrive
//! as strings; JSON bodies and bound objects may carry numbers, booleans, or
//! nested structures; conversion turns strings into typed scalars; image
//! submit buttons accumulate lists.

use std::fmt;

/// The runtime value of a field.
///
/// `Null` means "absent": nothing was bound and no initial value was declared.
///
/// # Examples
///
/// ```
/// use formmap_forms::value::FieldValue;
///
/// let v = FieldValue::from("42");
/// assert_eq!(v.as_str(), Some("42"));
/// assert!(!v.is_empty());
///
/// let json: serde_json::Value = FieldValue::Float(3.5).into();
/// assert_eq!(json, serde_json::json!(3.5));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// No value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Float(f64),
    /// A string, as received from the wire.
    String(String),
    /// A list of values (image submit coordinates, multi-valued JSON members).
    List(Vec<FieldValue>),
    /// A structured JSON value that has no scalar form (a JSON object).
    Json(serde_json::Value),
}

impl FieldValue {
    /// Returns `true` for [`FieldValue::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for absent values, empty strings, and empty lists.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            _ => false,
        }
    }

    /// Returns the string slice of a `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items of a `List` value.
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Renders a scalar value as text, the way it would appear on the wire.
    ///
    /// Returns `None` for `Null`, lists, and JSON objects.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::List(_) | Self::Json(_) => None,
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
        }
    }

    /// Converts this value into a JSON value.
    ///
    /// Non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", if *b { "1" } else { "0" }),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => {
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{v}")?;
                }
                Ok(())
            }
            Self::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            obj @ serde_json::Value::Object(_) => Self::Json(obj),
        }
    }
}

impl From<FieldValue> for serde_json::Value {
    fn from(value: FieldValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<Self>> for FieldValue {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_empty() {
        assert!(FieldValue::Null.is_empty());
        assert!(FieldValue::from("").is_empty());
        assert!(FieldValue::List(vec![]).is_empty());
        assert!(!FieldValue::from("x").is_empty());
        assert!(!FieldValue::Int(0).is_empty());
        assert!(!FieldValue::Bool(false).is_empty());
    }

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(FieldValue::from(serde_json::json!(7)), FieldValue::Int(7));
        assert_eq!(FieldValue::from(serde_json::json!(2.5)), FieldValue::Float(2.5));
        assert_eq!(
            FieldValue::from(serde_json::json!(["a", 1])),
            FieldValue::List(vec![FieldValue::from("a"), FieldValue::Int(1)])
        );
        let obj = serde_json::json!({"k": "v"});
        assert_eq!(FieldValue::from(obj.clone()), FieldValue::Json(obj));
    }

    #[test]
    fn test_to_json_non_finite_is_null() {
        assert_eq!(FieldValue::Float(f64::NAN).to_json(), serde_json::Value::Null);
        assert_eq!(FieldValue::Int(-3).to_json(), serde_json::json!(-3));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(FieldValue::Bool(true).to_text().as_deref(), Some("1"));
        assert_eq!(FieldValue::Float(2.75).to_text().as_deref(), Some("2.75"));
        assert_eq!(FieldValue::Null.to_text(), None);
        assert_eq!(FieldValue::List(vec![]).to_text(), None);
    }

    #[test]
    fn test_display() {
        let list = FieldValue::List(vec![FieldValue::from("5"), FieldValue::from("9")]);
        assert_eq!(list.to_string(), "5,9");
        assert_eq!(FieldValue::Null.to_string(), "");
        assert_eq!(FieldValue::Bool(false).to_string(), "0");
    }
}
