//! Free-form list columns.
//!
//! Preference lists, allergens and review tags are kept in TEXT columns,
//! either as a JSON array or as the raw text a client sent. Reads are
//! lenient: a JSON array, otherwise comma separated values, otherwise a
//! single value.

use serde_json::Value;

/// Parse a stored list column.
pub fn parse_list(raw: Option<&str>) -> Vec<String> {
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Vec::new(),
    };

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items.iter().filter_map(item_text).collect(),
        Ok(Value::String(single)) => non_empty(&single).into_iter().collect(),
        _ => raw.split(',').filter_map(non_empty).collect(),
    }
}

/// Encode a client supplied list for storage.
///
/// Arrays are stored as JSON, strings as they were sent, empty values
/// and anything else as NULL.
pub fn store_list(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) if !items.is_empty() => Some(Value::Array(items.clone()).to_string()),
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

/// Encode a list of values as a JSON array, NULL when empty.
pub fn encode_list<S: AsRef<str>>(items: &[S]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let items: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
    serde_json::to_string(&items).ok()
}

fn item_text(item: &Value) -> Option<String> {
    match item {
        Value::String(text) => non_empty(text),
        Value::Null => None,
        other => non_empty(&other.to_string()),
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_json_array() {
        assert_eq!(
            parse_list(Some(r#"[" North Indian ", "", "Bengali"]"#)),
            vec!["North Indian", "Bengali"]
        );
        assert_eq!(parse_list(Some("[1, null, \"2\"]")), vec!["1", "2"]);
    }

    #[test]
    fn parse_comma_separated() {
        assert_eq!(
            parse_list(Some("peanuts, dairy ,,gluten")),
            vec!["peanuts", "dairy", "gluten"]
        );
    }

    #[test]
    fn parse_single_value() {
        assert_eq!(parse_list(Some("South Indian")), vec!["South Indian"]);
        assert_eq!(parse_list(Some("\"jain\"")), vec!["jain"]);
        assert!(parse_list(Some("   ")).is_empty());
        assert!(parse_list(None).is_empty());
    }

    #[test]
    fn store_client_values() {
        assert_eq!(
            store_list(&json!(["lunch", "dinner"])),
            Some(r#"["lunch","dinner"]"#.to_string())
        );
        assert_eq!(store_list(&json!("nuts, milk")), Some("nuts, milk".into()));
        assert_eq!(store_list(&json!([])), None);
        assert_eq!(store_list(&json!("")), None);
        assert_eq!(store_list(&json!(12)), None);
    }

    #[test]
    fn encode_values() {
        assert_eq!(encode_list(&["spicy", "fresh"]), Some(r#"["spicy","fresh"]"#.into()));
        assert_eq!(encode_list::<&str>(&[]), None);
    }
}
