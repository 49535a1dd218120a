//! Validated page envelope returned by fetchers.

use serde_json::Map;
use serde_json::Value;

use crate::error::FetchError;
use crate::query::TablePage;

/// The list endpoint's response, checked and with its keys normalized.
///
/// Backends and client wrappers disagree on casing (`numPages`, `num_pages`,
/// `NumPages`), so envelope keys are matched ignoring case, `_` and `-`.
/// A `{"data": {...}}` wrapper is accepted as well as a bare object.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEnvelope {
    /// Total number of matching records.
    pub count: u64,
    /// Number of pages, when the backend reports it.
    pub num_pages: Option<u64>,
    /// Records on this page.
    pub results: Vec<Value>,
}

impl PageEnvelope {
    /// Creates an envelope without a page count.
    pub fn new(results: Vec<Value>, count: u64) -> Self {
        Self {
            count,
            num_pages: None,
            results,
        }
    }

    /// Sets the page count reported by the backend.
    pub fn with_num_pages(mut self, num_pages: u64) -> Self {
        self.num_pages = Some(num_pages);
        self
    }

    /// Parses and validates a raw JSON response body.
    pub fn from_json(value: Value) -> Result<Self, FetchError> {
        let mut body = match value {
            Value::Object(body) => body,
            other => {
                return Err(FetchError::schema(format!(
                    "expected a JSON object, got {}",
                    kind_of(&other)
                )));
            }
        };

        if find_key(&body, "results").is_none() {
            if let Some(key) = find_key(&body, "data") {
                match body.remove(&key) {
                    Some(Value::Object(inner)) => body = inner,
                    Some(other) => {
                        return Err(FetchError::schema(format!(
                            "expected `data` to be an object, got {}",
                            kind_of(&other)
                        )));
                    }
                    None => {}
                }
            }
        }

        let results = match take(&mut body, "results") {
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(FetchError::schema(format!(
                    "expected `results` to be an array, got {}",
                    kind_of(&other)
                )));
            }
            None => return Err(FetchError::schema("missing `results`")),
        };

        let count = match take(&mut body, "count") {
            Some(value) => as_count(&value, "count")?,
            None => return Err(FetchError::schema("missing `count`")),
        };

        let num_pages = match take(&mut body, "numpages") {
            None | Some(Value::Null) => None,
            Some(value) => Some(as_count(&value, "num_pages")?),
        };

        Ok(Self {
            count,
            num_pages,
            results,
        })
    }

    /// Converts to a table page, deriving the page count when it was not reported.
    pub fn into_page(self, page_size: usize) -> TablePage {
        match self.num_pages {
            Some(pages) => TablePage::new(self.results, self.count, pages),
            None => TablePage::from_count(self.results, self.count, page_size),
        }
    }
}

fn canonical(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn find_key(body: &Map<String, Value>, wanted: &str) -> Option<String> {
    body.keys().find(|key| canonical(key) == wanted).cloned()
}

fn take(body: &mut Map<String, Value>, wanted: &str) -> Option<Value> {
    let key = find_key(body, wanted)?;
    body.remove(&key)
}

fn as_count(value: &Value, name: &str) -> Result<u64, FetchError> {
    value.as_u64().ok_or_else(|| {
        FetchError::schema(format!(
            "expected `{}` to be a non-negative integer, got {}",
            name, value
        ))
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_wrapped_camel_case() {
        let env = PageEnvelope::from_json(json!({
            "data": {"count": 45, "numPages": 3, "results": [{"id": 1}]}
        }))
        .unwrap();
        assert_eq!(env.count, 45);
        assert_eq!(env.num_pages, Some(3));
        assert_eq!(env.results.len(), 1);
    }

    #[test]
    fn test_bare_snake_case() {
        let env = PageEnvelope::from_json(json!({
            "count": 2, "num_pages": 1, "next": null, "results": [{}, {}]
        }))
        .unwrap();
        assert_eq!(env.num_pages, Some(1));
    }

    #[test]
    fn test_missing_num_pages_is_derived() {
        let env = PageEnvelope::from_json(json!({"Count": 41, "Results": []})).unwrap();
        assert_eq!(env.num_pages, None);
        let page = env.into_page(20);
        assert_eq!(page.page_count(), 3);
        assert_eq!(page.item_count(), 41);
    }

    #[test]
    fn test_null_num_pages_is_absent() {
        let env = PageEnvelope::from_json(json!({"count": 0, "numPages": null, "results": []}))
            .unwrap();
        assert_eq!(env.num_pages, None);
    }

    #[test]
    fn test_schema_errors() {
        let err = PageEnvelope::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, FetchError::Schema { .. }));

        let err = PageEnvelope::from_json(json!({"count": 1})).unwrap_err();
        assert_eq!(err.to_string(), "Response schema error: missing `results`");

        let err = PageEnvelope::from_json(json!({"count": -1, "results": []})).unwrap_err();
        assert!(err.to_string().contains("non-negative integer"));

        let err = PageEnvelope::from_json(json!({"data": "nope"})).unwrap_err();
        assert!(err.to_string().contains("`data` to be an object"));
    }
}
