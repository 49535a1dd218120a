//! Record key casing adapter.

use serde_json::Map;
use serde_json::Value;

/// Casing applied to record keys at the fetch boundary.
///
/// The page envelope itself is matched case-insensitively; this only decides
/// what record keys look like once they enter the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyCase {
    /// Keep keys exactly as received.
    #[default]
    Preserve,
    /// `last_activity_date` → `lastActivityDate`.
    Camel,
    /// `lastActivityDate` → `last_activity_date`.
    Snake,
}

impl KeyCase {
    /// Rewrites object keys recursively.
    pub fn apply(self, value: Value) -> Value {
        match self {
            Self::Preserve => value,
            Self::Camel => rewrite_keys(value, &to_camel_case),
            Self::Snake => rewrite_keys(value, &to_snake_case),
        }
    }

    /// Converts a single key.
    pub fn convert(self, key: &str) -> String {
        match self {
            Self::Preserve => key.to_string(),
            Self::Camel => to_camel_case(key),
            Self::Snake => to_snake_case(key),
        }
    }
}

fn rewrite_keys(value: Value, convert: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Object(map) => {
            let rewritten: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (convert(&k), rewrite_keys(v, convert)))
                .collect();
            Value::Object(rewritten)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|v| rewrite_keys(v, convert))
                .collect(),
        ),
        other => other,
    }
}

/// Converts `snake_case` or `kebab-case` to `camelCase`.
pub fn to_camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' || c == '-' {
            // leading separators are kept, e.g. `_id`
            if out.chars().all(|o| o == '_') {
                out.push(c);
            } else {
                upper_next = true;
            }
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Converts `camelCase` or `PascalCase` to `snake_case`.
pub fn to_snake_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c == '-' {
            out.push('_');
            continue;
        }
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p == '_' || p == '-' => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(char::is_lowercase),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("last_activity_date"), "lastActivityDate");
        assert_eq!(to_camel_case("user-email"), "userEmail");
        assert_eq!(to_camel_case("_id"), "_id");
        assert_eq!(to_camel_case("already"), "already");
    }

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("lastActivityDate"), "last_activity_date");
        assert_eq!(to_snake_case("NumPages"), "num_pages");
        assert_eq!(to_snake_case("HTTPStatus"), "http_status");
        assert_eq!(to_snake_case("course2Key"), "course2_key");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn test_apply_recurses() {
        let value = json!({"user_email": "a@b.c", "course_run": {"run_key": "x"}, "tags": [{"tag_name": "t"}]});
        assert_eq!(
            KeyCase::Camel.apply(value.clone()),
            json!({"userEmail": "a@b.c", "courseRun": {"runKey": "x"}, "tags": [{"tagName": "t"}]})
        );
        assert_eq!(KeyCase::Preserve.apply(value.clone()), value);
    }
}
