//! Response shape classification.
//!
//! The upstream API may return the same logical analysis in several
//! structural variants. Classification is a priority-ordered predicate
//! list: the first matching predicate wins, and a clarification request
//! outranks every display shape (a payload can look like valid JSON or
//! markdown and still require clarification).

use serde_json::Value;

/// The structural variant of a raw API response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `{ success, data: { success, data: { properties } } }`
    DoubleWrappedJson,

    /// `{ success, data: { properties } }`
    WrappedJson,

    /// `{ properties: [{ property_address, .. }] }`
    DirectJson,

    /// `{ query, answer, sources, .. }`
    NewMarkdown,

    /// `{ analysis: "..." }`
    LegacyMarkdown,

    /// Clarification required before analysis can complete
    VerificationFailed,

    /// `{ status: "success", summary, properties, analysis, .. }`
    LegacySuccess,

    /// None of the above. Displayable as raw JSON, not an error.
    Unknown,
}

impl ResponseShape {
    /// True for the shapes that carry a structured property list
    pub fn is_json(&self) -> bool {
        matches!(
            self,
            Self::DoubleWrappedJson | Self::WrappedJson | Self::DirectJson | Self::LegacySuccess
        )
    }

    /// True for the markdown-bodied shapes
    pub fn is_markdown(&self) -> bool {
        matches!(self, Self::NewMarkdown | Self::LegacyMarkdown)
    }
}

/// Walk a key path, returning the value at the end if every key exists
pub(crate) fn at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// Non-empty JSON array at the given path
fn non_empty_array(value: &Value, path: &[&str]) -> bool {
    at(value, path)
        .and_then(Value::as_array)
        .map(|a| !a.is_empty())
        .unwrap_or(false)
}

/// Non-empty string at the given path
fn non_empty_string(value: &Value, path: &[&str]) -> bool {
    at(value, path)
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false)
}

pub(crate) fn is_double_wrapped(response: &Value) -> bool {
    response.get("success").is_some()
        && at(response, &["data", "success"]).is_some()
        && non_empty_array(response, &["data", "data", "properties"])
}

pub(crate) fn is_wrapped(response: &Value) -> bool {
    !is_double_wrapped(response)
        && response.get("success").is_some()
        && non_empty_array(response, &["data", "properties"])
}

pub(crate) fn is_direct(response: &Value) -> bool {
    if is_double_wrapped(response) || is_wrapped(response) {
        return false;
    }

    // `property_address` disambiguates from the legacy success shape,
    // which names the field `address`.
    non_empty_array(response, &["properties"])
        && at(response, &["properties"])
            .and_then(|p| p.get(0))
            .and_then(|first| first.get("property_address"))
            .is_some()
}

pub(crate) fn is_new_markdown(response: &Value) -> bool {
    non_empty_string(response, &["answer"])
}

pub(crate) fn is_legacy_markdown(response: &Value) -> bool {
    non_empty_string(response, &["analysis"])
}

pub(crate) fn is_verification_failed(response: &Value) -> bool {
    let status_failed = at(response, &["status"])
        .and_then(Value::as_str)
        .map(|s| s == "verification_failed")
        .unwrap_or(false);

    let inner_status_failed = at(response, &["data", "status"])
        .and_then(Value::as_str)
        .map(|s| s == "verification_failed")
        .unwrap_or(false);

    let needs_clarification = at(response, &["needs_clarification"])
        .and_then(Value::as_bool)
        .unwrap_or(false)
        && non_empty_array(response, &["clarification_questions"]);

    status_failed || inner_status_failed || needs_clarification
}

pub(crate) fn is_legacy_success(response: &Value) -> bool {
    at(response, &["status"])
        .and_then(Value::as_str)
        .map(|s| s == "success")
        .unwrap_or(false)
}

/// Classify a raw response into exactly one shape.
///
/// Clarification requests are checked before every display shape; the
/// remaining predicates run in priority order with first-match-wins.
pub fn detect(response: &Value) -> ResponseShape {
    if is_verification_failed(response) {
        return ResponseShape::VerificationFailed;
    }

    if is_double_wrapped(response) {
        ResponseShape::DoubleWrappedJson
    } else if is_wrapped(response) {
        ResponseShape::WrappedJson
    } else if is_direct(response) {
        ResponseShape::DirectJson
    } else if is_new_markdown(response) {
        ResponseShape::NewMarkdown
    } else if is_legacy_markdown(response) {
        ResponseShape::LegacyMarkdown
    } else if is_legacy_success(response) {
        ResponseShape::LegacySuccess
    } else {
        ResponseShape::Unknown
    }
}

/// Whether a response can be displayed without degrading to raw JSON.
///
/// Mirrors the client-side validity check that drives the automatic
/// markdown-mode retry: any JSON or markdown shape counts, regardless of
/// whether the payload also requires clarification.
pub fn is_displayable(response: &Value) -> bool {
    is_double_wrapped(response)
        || is_wrapped(response)
        || is_direct(response)
        || is_new_markdown(response)
        || is_legacy_markdown(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_double_wrapped_detection() {
        let response = json!({
            "success": true,
            "data": {
                "success": true,
                "data": { "properties": [{"property_address": "1 Smith St"}] }
            }
        });
        assert_eq!(detect(&response), ResponseShape::DoubleWrappedJson);
    }

    #[test]
    fn test_wrapped_detection() {
        let response = json!({
            "success": true,
            "data": { "properties": [{"property_address": "1 Smith St"}] }
        });
        assert_eq!(detect(&response), ResponseShape::WrappedJson);
    }

    #[test]
    fn test_direct_requires_property_address() {
        let direct = json!({
            "properties": [{"property_address": "1 Smith St"}]
        });
        assert_eq!(detect(&direct), ResponseShape::DirectJson);

        // Legacy field name does not satisfy the direct predicate
        let legacy_fields = json!({
            "properties": [{"address": "1 Smith St"}]
        });
        assert_eq!(detect(&legacy_fields), ResponseShape::Unknown);
    }

    #[test]
    fn test_markdown_shapes() {
        let new = json!({"query": "...", "answer": "## Analysis\n..."});
        assert_eq!(detect(&new), ResponseShape::NewMarkdown);

        let legacy = json!({"analysis": "Some analysis text"});
        assert_eq!(detect(&legacy), ResponseShape::LegacyMarkdown);

        // Empty strings don't count
        let empty = json!({"answer": ""});
        assert_eq!(detect(&empty), ResponseShape::Unknown);
    }

    #[test]
    fn test_verification_failed_variants() {
        let by_status = json!({
            "status": "verification_failed",
            "verification": { "clarification_questions": [] }
        });
        assert_eq!(detect(&by_status), ResponseShape::VerificationFailed);

        let by_inner_status = json!({
            "data": { "status": "verification_failed" }
        });
        assert_eq!(detect(&by_inner_status), ResponseShape::VerificationFailed);

        let by_flag = json!({
            "needs_clarification": true,
            "clarification_questions": [{"question": "?"}]
        });
        assert_eq!(detect(&by_flag), ResponseShape::VerificationFailed);

        // Flag without questions is not a clarification request
        let flag_only = json!({"needs_clarification": true});
        assert_eq!(detect(&flag_only), ResponseShape::Unknown);
    }

    #[test]
    fn test_verification_failed_outranks_display_shapes() {
        // Looks like a valid markdown response AND requires clarification
        let both = json!({
            "answer": "## Partial analysis",
            "needs_clarification": true,
            "clarification_questions": [{"question": "Where did you live?"}]
        });
        assert_eq!(detect(&both), ResponseShape::VerificationFailed);
    }

    #[test]
    fn test_legacy_success() {
        let response = json!({
            "status": "success",
            "properties": [{"address": "1 Smith St"}]
        });
        assert_eq!(detect(&response), ResponseShape::LegacySuccess);
    }

    #[test]
    fn test_null_is_unknown() {
        assert_eq!(detect(&Value::Null), ResponseShape::Unknown);
    }

    #[test]
    fn test_is_displayable() {
        assert!(is_displayable(&json!({
            "success": true,
            "data": { "properties": [{}] }
        })));
        assert!(is_displayable(&json!({"answer": "text"})));
        assert!(!is_displayable(&json!({"status": "success"})));
        assert!(!is_displayable(&json!({"unrelated": 1})));
    }
}
