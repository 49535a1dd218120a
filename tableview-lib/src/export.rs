//! In-memory CSV rows from cached records.
//!
//! Keys of the first record form the heading; each record's values follow in
//! the same key order. Values are joined with `,` as-is: embedded commas and
//! newlines are not escaped.

use serde_json::Value;

/// Builds the heading line followed by one line per object record.
///
/// Non-object records are skipped. Returns an empty vector when there is no
/// object record to take the heading from.
pub fn csv_rows(results: &[Value]) -> Vec<String> {
    let Some(first) = results.iter().find_map(Value::as_object) else {
        return Vec::new();
    };
    let keys: Vec<&String> = first.keys().collect();

    let mut rows = Vec::with_capacity(results.len() + 1);
    rows.push(
        keys.iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(","),
    );
    for record in results.iter().filter_map(Value::as_object) {
        let cells: Vec<String> = keys
            .iter()
            .map(|key| record.get(key.as_str()).map(cell).unwrap_or_default())
            .collect();
        rows.push(cells.join(","));
    }
    rows
}

/// Joins [`csv_rows`] with newlines.
pub fn to_csv(results: &[Value]) -> String {
    csv_rows(results).join("\n")
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_heading_and_rows() {
        let results = vec![
            json!({"email": "ada@example.com", "progress": 0.5, "passed": null}),
            json!({"email": "alan@example.com", "progress": 1, "passed": true}),
        ];
        assert_eq!(
            to_csv(&results),
            "email,progress,passed\nada@example.com,0.5,\nalan@example.com,1,true"
        );
    }

    #[test]
    fn test_rows_follow_heading_key_order() {
        let results = vec![json!({"a": 1, "b": 2}), json!({"b": 4, "c": 5, "a": 3})];
        assert_eq!(csv_rows(&results), vec!["a,b", "1,2", "3,4"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(csv_rows(&[]).is_empty());
        assert_eq!(to_csv(&[json!(1)]), "");
    }

    // Known limitation: cells are not quoted.
    #[test]
    fn test_embedded_separators_are_not_escaped() {
        let results = vec![json!({"name": "Lovelace, Ada", "note": "line1\nline2"})];
        let csv = to_csv(&results);
        assert_eq!(csv, "name,note\nLovelace, Ada,line1\nline2");
        assert_eq!(csv.lines().count(), 3);
        assert_eq!(csv.lines().nth(1).unwrap().split(',').count(), 3);
    }
}
