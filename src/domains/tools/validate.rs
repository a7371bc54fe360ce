//! Parameter validation against an action's declared specs.
//!
//! Validation walks the declared parameters in declaration order and stops
//! at the first failure. It does not coerce logical types; backends are
//! responsible for final interpretation of values.

use serde_json::Value;

use super::error::ToolError;
use super::params::Parameters;
use super::spec::ActionSpec;

/// Validate call parameters against the action's parameter specs.
///
/// For each declared parameter, in order:
/// - absent (or null) and required: fail, naming the field;
/// - present but empty-string on a required field: fail the same way
///   (falsy required values are treated as missing);
/// - absent and optional: substitute the declared default, or leave out
///   when none is declared;
/// - present: passed through as-is.
///
/// Undeclared keys are passed through unvalidated; handlers may accept
/// extra fields.
pub fn validate(spec: &ActionSpec, params: Parameters) -> Result<Parameters, ToolError> {
    let mut validated = params;

    for param in spec.parameters() {
        match validated.get(param.name()) {
            None | Some(Value::Null) => {
                if param.is_required() {
                    return Err(ToolError::missing_parameter(param.name()));
                }
                if let Some(default) = param.default() {
                    validated.insert(param.name().to_string(), default.clone());
                }
            }
            Some(value) => {
                if param.is_required() && is_empty(value) {
                    return Err(ToolError::missing_parameter(param.name()));
                }
            }
        }
    }

    Ok(validated)
}

fn is_empty(value: &Value) -> bool {
    matches!(value, Value::String(s) if s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::spec::ParamType;
    use serde_json::json;

    fn issue_spec() -> ActionSpec {
        ActionSpec::builder("getIssues", "Get issues for a repository")
            .required("owner", ParamType::String, "Repository owner")
            .required("repo", ParamType::String, "Repository name")
            .with_default("state", ParamType::String, "Issue state", json!("open"))
            .optional("labels", ParamType::String, "Label filter")
            .returns("array", "List of issue objects")
            .handler(|_| async { Ok(json!([])) })
    }

    #[test]
    fn test_missing_required_names_field() {
        let params = Parameters::from_value(json!({"owner": "octocat"}));
        let err = validate(&issue_spec(), params).unwrap_err();
        assert_eq!(err.kind(), "InvalidParameters");
        assert!(err.to_string().contains("repo"));
    }

    #[test]
    fn test_fail_fast_reports_first_missing() {
        let params = Parameters::new();
        let err = validate(&issue_spec(), params).unwrap_err();
        assert!(err.to_string().contains("owner"));
        assert!(!err.to_string().contains("repo"));
    }

    #[test]
    fn test_empty_required_string_treated_as_missing() {
        let params = Parameters::from_value(json!({"owner": "", "repo": "hello"}));
        let err = validate(&issue_spec(), params).unwrap_err();
        assert!(err.to_string().contains("owner"));
    }

    #[test]
    fn test_null_required_treated_as_missing() {
        let params = Parameters::from_value(json!({"owner": null, "repo": "hello"}));
        assert!(validate(&issue_spec(), params).is_err());
    }

    #[test]
    fn test_default_substituted_when_absent() {
        let params = Parameters::from_value(json!({"owner": "octocat", "repo": "hello"}));
        let validated = validate(&issue_spec(), params).unwrap();
        assert_eq!(validated.str_opt("state"), Some("open"));
    }

    #[test]
    fn test_supplied_value_wins_over_default() {
        let params =
            Parameters::from_value(json!({"owner": "o", "repo": "r", "state": "closed"}));
        let validated = validate(&issue_spec(), params).unwrap();
        assert_eq!(validated.str_opt("state"), Some("closed"));
    }

    #[test]
    fn test_optional_without_default_stays_absent() {
        let params = Parameters::from_value(json!({"owner": "o", "repo": "r"}));
        let validated = validate(&issue_spec(), params).unwrap();
        assert!(!validated.contains("labels"));
    }

    #[test]
    fn test_extra_keys_pass_through() {
        let params =
            Parameters::from_value(json!({"owner": "o", "repo": "r", "per_page": 50}));
        let validated = validate(&issue_spec(), params).unwrap();
        assert_eq!(validated.u64_or("per_page", 0), 50);
    }
}
