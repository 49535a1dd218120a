//! Client-side sorting for fully resident result sets.
//!
//! When the cached page already holds every matching record (`page_count ==
//! 1`), a sort change can be served locally without a round trip. Only the
//! primary sort field is honored, so tie-breaks may differ from the backend.

use std::cmp::Ordering;
use std::cmp::Reverse;

use serde_json::Value;

use crate::query::ColumnFieldMap;
use crate::query::SortClause;
use crate::query::ordering_string;
use crate::store::TableState;

/// Returns `true` if the cached page of `state` is the whole result set.
pub fn can_sort_locally(state: &TableState) -> bool {
    state.data.page_count() == 1
}

/// Sorts records in place by the primary field of an ordering string.
///
/// A `-` prefix sorts descending. The sort is stable; an empty ordering
/// leaves the records untouched.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tableview_lib::sort::sort_locally;
///
/// let mut rows = vec![json!({"v": 3}), json!({"v": 1}), json!({"v": 2})];
/// sort_locally(&mut rows, "v");
/// assert_eq!(rows, vec![json!({"v": 1}), json!({"v": 2}), json!({"v": 3})]);
/// ```
pub fn sort_locally(results: &mut [Value], ordering: &str) {
    let Some(primary) = ordering.split(',').map(str::trim).find(|f| !f.is_empty()) else {
        return;
    };
    let (field, descending) = match primary.strip_prefix('-') {
        Some(field) => (field, true),
        None => (primary, false),
    };

    if descending {
        results.sort_by_cached_key(|record| Reverse(SortKey::of(record.get(field))));
    } else {
        results.sort_by_cached_key(|record| SortKey::of(record.get(field)));
    }
}

/// Sorts records in place by sort clauses, resolving columns like the translator does.
pub fn sort_by_clauses(results: &mut [Value], sort: &[SortClause], columns: &ColumnFieldMap) {
    if let Some(ordering) = ordering_string(sort, columns) {
        sort_locally(results, &ordering);
    }
}

/// Comparable key extracted from a record field.
///
/// Empty values sort before numbers, numbers before text.
#[derive(Debug, Clone)]
enum SortKey {
    Empty,
    Number(f64),
    Text(String),
}

impl SortKey {
    fn of(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Empty,
            Some(Value::Number(n)) => match n.as_f64() {
                Some(f) if f.is_finite() => Self::Number(f),
                _ => Self::Text(n.to_string()),
            },
            Some(Value::String(s)) if s.is_empty() => Self::Empty,
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Self::Number(f),
                _ => Self::Text(s.clone()),
            },
            Some(other) => Self::Text(other.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for SortKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortKey {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::query::TablePage;

    fn values(rows: &[Value], field: &str) -> Vec<Value> {
        rows.iter().map(|r| r.get(field).cloned().unwrap_or(Value::Null)).collect()
    }

    #[test]
    fn test_ascending_numbers() {
        let mut rows = vec![json!({"v": 3}), json!({"v": 1}), json!({"v": 2})];
        sort_locally(&mut rows, "v");
        assert_eq!(rows, vec![json!({"v": 1}), json!({"v": 2}), json!({"v": 3})]);
    }

    #[test]
    fn test_descending_prefix() {
        let mut rows = vec![json!({"v": 3}), json!({"v": 1}), json!({"v": 2})];
        sort_locally(&mut rows, "-v");
        assert_eq!(values(&rows, "v"), vec![json!(3), json!(2), json!(1)]);
    }

    #[test]
    fn test_numeric_strings_compare_as_numbers() {
        let mut rows = vec![json!({"n": "10"}), json!({"n": "9"}), json!({"n": "100.5"})];
        sort_locally(&mut rows, "n");
        assert_eq!(values(&rows, "n"), vec![json!("9"), json!("10"), json!("100.5")]);
    }

    #[test]
    fn test_empties_sort_to_one_end() {
        let mut rows = vec![
            json!({"name": "bravo"}),
            json!({"name": null}),
            json!({}),
            json!({"name": "alpha"}),
            json!({"name": ""}),
        ];
        sort_locally(&mut rows, "name");
        assert_eq!(
            values(&rows, "name"),
            vec![Value::Null, Value::Null, json!(""), json!("alpha"), json!("bravo")]
        );

        sort_locally(&mut rows, "-name");
        let tail = &values(&rows, "name")[2..];
        assert!(tail.iter().all(|v| v.is_null() || v == &json!("")));
    }

    #[test]
    fn test_only_primary_field_and_stable() {
        let mut rows = vec![
            json!({"a": 1, "b": "z"}),
            json!({"a": 0, "b": "y"}),
            json!({"a": 1, "b": "x"}),
        ];
        sort_locally(&mut rows, "a,-b");
        assert_eq!(values(&rows, "b"), vec![json!("y"), json!("z"), json!("x")]);
    }

    #[test]
    fn test_sort_by_clauses_resolves_columns() {
        let columns = ColumnFieldMap::new().with("date", "last_activity_date");
        let mut rows = vec![
            json!({"last_activity_date": "2024-03-01"}),
            json!({"last_activity_date": "2024-01-15"}),
        ];
        sort_by_clauses(&mut rows, &[SortClause::asc("date")], &columns);
        assert_eq!(rows[0]["last_activity_date"], "2024-01-15");
    }

    #[test]
    fn test_can_sort_locally_requires_single_page() {
        let mut state = TableState::mounted();
        assert!(!can_sort_locally(&state));
        state.data = TablePage::new(vec![json!({"v": 1})], 1, 1);
        assert!(can_sort_locally(&state));
        state.data = TablePage::new(vec![json!({"v": 1})], 40, 2);
        assert!(!can_sort_locally(&state));
    }
}
