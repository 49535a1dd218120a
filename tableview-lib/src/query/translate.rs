//! Query translation: UI table state to backend API options.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::Serialize;

use super::FilterRules;
use super::SortClause;
use super::TableQuery;

/// Keys always derived from the query itself.
const RESERVED_KEYS: [&str; 3] = ["page", "page_size", "ordering"];

/// Static mapping from presentation column ids to API field names.
///
/// # Example
///
/// ```
/// use tableview_lib::query::ColumnFieldMap;
///
/// let columns = ColumnFieldMap::new().with("date", "last_activity_date");
/// assert_eq!(columns.resolve("date"), "last_activity_date");
/// assert_eq!(columns.resolve("email"), "email");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnFieldMap {
    fields: HashMap<String, String>,
}

impl ColumnFieldMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column → field mapping.
    pub fn with(mut self, column_id: impl Into<String>, field: impl Into<String>) -> Self {
        self.fields.insert(column_id.into(), field.into());
        self
    }

    /// Resolves a column id, falling back to the raw id when unmapped.
    pub fn resolve<'a>(&'a self, column_id: &'a str) -> &'a str {
        self.fields
            .get(column_id)
            .map(String::as_str)
            .unwrap_or(column_id)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ColumnFieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Parameters sent to the page-based list endpoint.
///
/// Serializes as `{page, pageSize, ordering?, ...params}`, which is also the
/// analytics payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    /// One-based page number.
    pub page: usize,
    /// Requested page size.
    pub page_size: usize,
    /// Comma-joined ordering string, `-` prefixed for descending fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
    /// Filter-derived and static parameters.
    #[serde(flatten)]
    pub params: BTreeMap<String, String>,
}

impl ApiOptions {
    /// Returns an extra parameter by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the query string pairs in a stable order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.params.len() + 3);
        pairs.push(("page".to_string(), self.page.to_string()));
        pairs.push(("page_size".to_string(), self.page_size.to_string()));
        if let Some(ordering) = &self.ordering {
            pairs.push(("ordering".to_string(), ordering.clone()));
        }
        pairs.extend(self.params.iter().map(|(k, v)| (k.clone(), v.clone())));
        pairs
    }
}

/// Builds the ordering string for a list of sort clauses.
///
/// Returns `None` when there is nothing to sort by.
pub fn ordering_string(sort: &[SortClause], columns: &ColumnFieldMap) -> Option<String> {
    if sort.is_empty() {
        return None;
    }
    let fields: Vec<_> = sort
        .iter()
        .map(|clause| {
            let field = columns.resolve(clause.column_id());
            if clause.is_descending() {
                format!("-{}", field)
            } else {
                field.to_string()
            }
        })
        .collect();
    Some(fields.join(","))
}

/// Translates a table query into API options.
///
/// Static options are applied first; anything derived from the query wins.
pub fn to_api_options(
    query: &TableQuery,
    columns: &ColumnFieldMap,
    rules: &FilterRules,
    static_options: &BTreeMap<String, String>,
) -> ApiOptions {
    let mut params: BTreeMap<String, String> = static_options
        .iter()
        .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    rules.apply(query.filters(), &mut params);
    params.retain(|key, _| !RESERVED_KEYS.contains(&key.as_str()));

    ApiOptions {
        page: query.page_index() + 1,
        page_size: query.page_size(),
        ordering: ordering_string(query.sort(), columns),
        params,
    }
}

/// Per-table translation settings bundled together.
///
/// # Example
///
/// ```
/// use tableview_lib::query::{ColumnFieldMap, FilterRules, TableQuery, Translator};
///
/// let translator = Translator::new()
///     .columns(ColumnFieldMap::new().with("date", "last_activity_date"))
///     .filters(FilterRules::new().search("enrollment_details", "search"))
///     .static_option("learner_status", "active");
///
/// let options = translator.to_api_options(&TableQuery::new(1, 20).sort_desc("date"));
/// assert_eq!(options.page, 2);
/// assert_eq!(options.ordering.as_deref(), Some("-last_activity_date"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Translator {
    columns: ColumnFieldMap,
    rules: FilterRules,
    static_options: BTreeMap<String, String>,
}

impl Translator {
    /// Creates a translator with no mappings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the column → field mapping.
    pub fn columns(mut self, columns: ColumnFieldMap) -> Self {
        self.columns = columns;
        self
    }

    /// Sets the filter rules.
    pub fn filters(mut self, rules: FilterRules) -> Self {
        self.rules = rules;
        self
    }

    /// Adds an option sent with every request.
    pub fn static_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.static_options.insert(key.into(), value.into());
        self
    }

    /// Returns the column mapping.
    pub fn column_map(&self) -> &ColumnFieldMap {
        &self.columns
    }

    /// Translates a query.
    pub fn to_api_options(&self, query: &TableQuery) -> ApiOptions {
        to_api_options(query, &self.columns, &self.rules, &self.static_options)
    }
}
