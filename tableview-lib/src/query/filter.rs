//! Table filters and the rules that turn them into API parameters.

use std::collections::BTreeMap;
use std::collections::HashMap;

/// A filter value set by the presentation layer, e.g. a search box or a status picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableFilter {
    /// Filter id as known to the presentation layer.
    pub id: String,
    /// Raw filter value.
    pub value: String,
}

impl TableFilter {
    /// Creates a new filter.
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// How a recognized filter id maps onto the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterRule {
    /// Free-text filter sent as the backend's search parameter.
    Search {
        /// Name of the search parameter (usually `search`).
        param: String,
    },
    /// Named filter sent under its own key.
    Param {
        /// API parameter name.
        key: String,
    },
}

impl FilterRule {
    /// Returns the API parameter this rule writes.
    pub fn key(&self) -> &str {
        match self {
            Self::Search { param } => param,
            Self::Param { key } => key,
        }
    }
}

/// Per-table filter rule set.
///
/// Filters whose id has no rule are ignored during translation.
///
/// # Example
///
/// ```
/// use tableview_lib::query::FilterRules;
///
/// let rules = FilterRules::new()
///     .search("enrollment_details", "search")
///     .param("status", "enrollment_status");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRules {
    rules: HashMap<String, FilterRule>,
}

impl FilterRules {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a free-text filter to a search parameter.
    pub fn search(mut self, filter_id: impl Into<String>, param: impl Into<String>) -> Self {
        self.rules.insert(
            filter_id.into(),
            FilterRule::Search {
                param: param.into(),
            },
        );
        self
    }

    /// Maps a named filter to its own API key.
    pub fn param(mut self, filter_id: impl Into<String>, key: impl Into<String>) -> Self {
        self.rules
            .insert(filter_id.into(), FilterRule::Param { key: key.into() });
        self
    }

    /// Returns the rule registered for a filter id.
    pub fn rule(&self, filter_id: &str) -> Option<&FilterRule> {
        self.rules.get(filter_id)
    }

    /// Writes every recognized, non-blank filter into `params`.
    ///
    /// Later filters overwrite earlier ones that resolve to the same key.
    pub fn apply(&self, filters: &[TableFilter], params: &mut BTreeMap<String, String>) {
        for filter in filters {
            let Some(rule) = self.rule(&filter.id) else {
                log::trace!("ignoring unrecognized filter `{}`", filter.id);
                continue;
            };
            if filter.value.trim().is_empty() {
                continue;
            }
            params.insert(rule.key().to_string(), filter.value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_rules() {
        let rules = FilterRules::new()
            .search("enrollment_details", "search")
            .param("status", "enrollment_status");
        let filters = vec![
            TableFilter::new("enrollment_details", "ada@example.com"),
            TableFilter::new("status", "enrolled"),
            TableFilter::new("unknown", "x"),
        ];

        let mut params = BTreeMap::new();
        rules.apply(&filters, &mut params);

        assert_eq!(params.len(), 2);
        assert_eq!(params["search"], "ada@example.com");
        assert_eq!(params["enrollment_status"], "enrolled");
    }

    #[test]
    fn test_blank_values_skipped() {
        let rules = FilterRules::new().search("q", "search");
        let mut params = BTreeMap::new();
        rules.apply(&[TableFilter::new("q", "   ")], &mut params);
        assert!(params.is_empty());
    }
}
