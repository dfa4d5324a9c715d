//! Shared utilities for Google API modules

use serde_json::Value;

/// Extract an array field from a JSON response, returning an empty vec if missing.
///
/// Google APIs return lists under varying field names ("items", "messages", "files", "spaces").
pub fn extract_array(response: &Value, field: &str) -> Vec<Value> {
    response
        .get(field)
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Percent-encode a single path segment (an id supplied by the caller).
pub fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Encode a slash-separated resource name (`spaces/AAA/messages/BBB`)
/// segment by segment, keeping the slashes.
pub fn resource_path(name: &str) -> String {
    name.trim_matches('/')
        .split('/')
        .map(segment)
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_array_defaults_to_empty() {
        let v = json!({"files": [{"id": "a"}]});
        assert_eq!(extract_array(&v, "files").len(), 1);
        assert!(extract_array(&v, "items").is_empty());
    }

    #[test]
    fn test_segment_escapes_reserved_characters() {
        assert_eq!(segment("Sheet1!A1:B2"), "Sheet1%21A1%3AB2");
        assert_eq!(segment("a/b"), "a%2Fb");
    }

    #[test]
    fn test_resource_path_keeps_hierarchy() {
        assert_eq!(resource_path("spaces/AAA/messages/B.C"), "spaces/AAA/messages/B.C");
        assert_eq!(resource_path("/spaces/A B/"), "spaces/A%20B");
    }
}
