//! Node parameter values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single parameter value: text, a number, a flag, or a list of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ParamValue>),
}

impl ParamValue {
    pub fn text(s: impl Into<String>) -> Self {
        ParamValue::Text(s.into())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view. Text that parses as an integer counts.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            ParamValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            ParamValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Int(v) => Some(*v as f64),
            ParamValue::Float(v) => Some(*v),
            ParamValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<ParamValue>> {
        match self {
            ParamValue::List(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the value renders as nothing (empty text or empty list).
    pub fn is_blank(&self) -> bool {
        match self {
            ParamValue::Text(s) => s.trim().is_empty(),
            ParamValue::List(v) => v.is_empty(),
            _ => false,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::Bool(v) => serde_json::Value::Bool(*v),
            ParamValue::Int(v) => serde_json::Value::from(*v),
            ParamValue::Float(v) => serde_json::Value::from(*v),
            ParamValue::Text(v) => serde_json::Value::String(v.clone()),
            ParamValue::List(v) => serde_json::Value::Array(v.iter().map(Self::to_json).collect()),
        }
    }

    /// Convert a TOML value from a kind definition file. Tables are not
    /// representable and yield `None`.
    pub fn from_toml(value: &toml::Value) -> Option<Self> {
        match value {
            toml::Value::String(s) => Some(ParamValue::Text(s.clone())),
            toml::Value::Integer(i) => Some(ParamValue::Int(*i)),
            toml::Value::Float(f) => Some(ParamValue::Float(*f)),
            toml::Value::Boolean(b) => Some(ParamValue::Bool(*b)),
            toml::Value::Array(items) => items
                .iter()
                .map(Self::from_toml)
                .collect::<Option<Vec<_>>>()
                .map(ParamValue::List),
            toml::Value::Datetime(d) => Some(ParamValue::Text(d.to_string())),
            toml::Value::Table(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(v) => write!(f, "{}", v),
            ParamValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

/// Ordered parameter map of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Parameters(BTreeMap<String, ParamValue>);

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ParamValue> {
        self.0.get_mut(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Text of a parameter, or `""` when absent or not text.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).and_then(ParamValue::as_str).unwrap_or("")
    }

    /// Rendered form of a parameter, or `""` when absent.
    pub fn display(&self, key: &str) -> String {
        self.get(key).map(|v| v.to_string()).unwrap_or_default()
    }

    pub fn list(&self, key: &str) -> &[ParamValue] {
        self.get(key).and_then(ParamValue::as_list).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// Overlay every entry of `other` onto this map.
    pub fn merge(&mut self, other: &Parameters) {
        for (k, v) in other.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.0.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
    }
}

impl FromIterator<(String, ParamValue)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert_eq!(ParamValue::Bool(true).as_bool(), Some(true));
        assert_eq!(ParamValue::Int(42).as_int(), Some(42));
        assert_eq!(ParamValue::text("7").as_int(), Some(7));
        assert_eq!(ParamValue::Float(2.5).as_float(), Some(2.5));
        assert_eq!(ParamValue::text("hello").as_str(), Some("hello"));
        assert_eq!(ParamValue::text("x").as_int(), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(ParamValue::Int(5).to_string(), "5");
        assert_eq!(ParamValue::text("a.out").to_string(), "a.out");
        let list = ParamValue::List(vec![ParamValue::text("x > 1"), ParamValue::Int(2)]);
        assert_eq!(list.to_string(), "[x > 1, 2]");
    }

    #[test]
    fn test_parameters_text_defaults_to_empty() {
        let params = Parameters::new().with("condition_expr", "x");
        assert_eq!(params.text("condition_expr"), "x");
        assert_eq!(params.text("missing"), "");
        assert!(params.list("missing").is_empty());
    }

    #[test]
    fn test_from_toml() {
        let value: toml::Value = toml::from_str("v = [1, 2]").unwrap();
        let parsed = ParamValue::from_toml(&value["v"]).unwrap();
        assert_eq!(parsed, ParamValue::List(vec![ParamValue::Int(1), ParamValue::Int(2)]));
    }
}
