//! Call parameters passed to tool handlers.
//!
//! Parameters are a structured JSON object with declared-vs-extra key
//! semantics: keys declared in an [`ActionSpec`](super::spec::ActionSpec)
//! are checked by the validator, undeclared keys pass through to the
//! handler untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ToolError;

/// A mapping from parameter name to value, supplied per call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Parameters(Map<String, Value>);

impl Parameters {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build parameters from an arbitrary JSON value.
    ///
    /// Non-object values (including null) yield an empty set, matching the
    /// gateway's treatment of an absent `parameters` field.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Get a raw parameter value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether a parameter is present (even if null).
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Get a string parameter, if present and a string.
    pub fn str_opt(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Get a required, non-empty string parameter.
    ///
    /// Absent, non-string, or empty values all fail with
    /// [`ToolError::InvalidParameters`] naming the field. Handlers use this
    /// for identity-bearing fields they re-check internally.
    pub fn require_str(&self, name: &str) -> Result<&str, ToolError> {
        match self.str_opt(name) {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(ToolError::missing_parameter(name)),
        }
    }

    /// Get a boolean parameter, falling back to a default.
    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.0.get(name).and_then(Value::as_bool).unwrap_or(default)
    }

    /// Get an unsigned integer parameter, falling back to a default.
    ///
    /// Accepts numeric strings as well; the direct query-string routes
    /// deliver numbers that way.
    pub fn u64_or(&self, name: &str, default: u64) -> u64 {
        match self.0.get(name) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(default),
            Some(Value::String(s)) => s.parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Get a number parameter rendered as a string, if present.
    ///
    /// Accepts both JSON numbers and numeric strings; coordinates arrive
    /// either way through the direct query-string routes.
    pub fn number_as_string(&self, name: &str) -> Option<String> {
        match self.0.get(name) {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Consume into the underlying JSON object.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Parameters {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_object() {
        let params = Parameters::from_value(json!({"key": "k", "limit": 5}));
        assert_eq!(params.str_opt("key"), Some("k"));
        assert_eq!(params.u64_or("limit", 100), 5);
    }

    #[test]
    fn test_from_value_non_object_is_empty() {
        assert!(Parameters::from_value(json!(null)).is_empty());
        assert!(Parameters::from_value(json!("text")).is_empty());
        assert!(Parameters::from_value(json!([1, 2])).is_empty());
    }

    #[test]
    fn test_require_str_rejects_empty() {
        let params = Parameters::from_value(json!({"key": ""}));
        assert!(params.require_str("key").is_err());
    }

    #[test]
    fn test_require_str_rejects_absent() {
        let params = Parameters::new();
        let err = params.require_str("username").unwrap_err();
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn test_u64_or_parses_numeric_strings() {
        let params = Parameters::from_value(json!({"limit": "25", "offset": 3, "bad": "x"}));
        assert_eq!(params.u64_or("limit", 100), 25);
        assert_eq!(params.u64_or("offset", 0), 3);
        assert_eq!(params.u64_or("bad", 7), 7);
        assert_eq!(params.u64_or("absent", 7), 7);
    }

    #[test]
    fn test_number_as_string_accepts_both_forms() {
        let params = Parameters::from_value(json!({"lat": 48.85, "lng": "2.35"}));
        assert_eq!(params.number_as_string("lat").as_deref(), Some("48.85"));
        assert_eq!(params.number_as_string("lng").as_deref(), Some("2.35"));
        assert_eq!(params.number_as_string("alt"), None);
    }

    #[test]
    fn test_extra_keys_are_preserved() {
        let params = Parameters::from_value(json!({"declared": 1, "extra": {"nested": true}}));
        assert!(params.contains("extra"));
        assert_eq!(params.get("extra"), Some(&json!({"nested": true})));
    }
}
