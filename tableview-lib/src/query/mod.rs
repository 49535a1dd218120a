//! Table queries and their translation to API options.
//!
//! A [`TableQuery`] is what the presentation layer knows: a zero-based page
//! index, a page size, sort clauses on presentation columns and filter values.
//! The [`Translator`] turns it into [`ApiOptions`] the backend understands.

mod filter;
mod order;
mod page;
mod translate;

pub use filter::FilterRule;
pub use filter::FilterRules;
pub use filter::TableFilter;
pub use order::Direction;
pub use order::SortClause;
pub use page::TablePage;
pub use page::page_count_for;
pub use translate::ApiOptions;
pub use translate::ColumnFieldMap;
pub use translate::Translator;
pub use translate::ordering_string;
pub use translate::to_api_options;

/// Pagination, sort and filter state of one table at one moment.
///
/// # Panics
///
/// Construction panics if `page_size` is zero; an invalid query is a bug in
/// the caller, not a runtime condition.
///
/// # Example
///
/// ```
/// use tableview_lib::query::TableQuery;
///
/// let query = TableQuery::new(1, 20)
///     .sort_desc("date")
///     .filter("enrollment_details", "ada");
/// assert_eq!(query.page_index(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableQuery {
    page_index: usize,
    page_size: usize,
    sort: Vec<SortClause>,
    filters: Vec<TableFilter>,
}

impl TableQuery {
    /// Creates a query for a zero-based page index.
    pub fn new(page_index: usize, page_size: usize) -> Self {
        assert!(page_size > 0, "page_size must be greater than zero");
        Self {
            page_index,
            page_size,
            sort: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Creates a query for the first page.
    pub fn first_page(page_size: usize) -> Self {
        Self::new(0, page_size)
    }

    /// Appends a sort clause.
    pub fn sort_by(mut self, clause: SortClause) -> Self {
        self.sort.push(clause);
        self
    }

    /// Appends an ascending sort on a column.
    pub fn sort_asc(self, column_id: impl Into<String>) -> Self {
        self.sort_by(SortClause::asc(column_id))
    }

    /// Appends a descending sort on a column.
    pub fn sort_desc(self, column_id: impl Into<String>) -> Self {
        self.sort_by(SortClause::desc(column_id))
    }

    /// Appends a filter value.
    pub fn filter(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(TableFilter::new(id, value));
        self
    }

    /// Returns a copy of this query pointing at another page.
    pub fn with_page_index(&self, page_index: usize) -> Self {
        Self {
            page_index,
            ..self.clone()
        }
    }

    /// Returns a copy of this query with its sort clauses replaced.
    pub fn with_sort(&self, sort: Vec<SortClause>) -> Self {
        Self {
            sort,
            ..self.clone()
        }
    }

    /// Returns the zero-based page index.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Returns the page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the sort clauses, primary first.
    pub fn sort(&self) -> &[SortClause] {
        &self.sort
    }

    /// Returns the filter values.
    pub fn filters(&self) -> &[TableFilter] {
        &self.filters
    }

    /// Returns `true` if `other` only changes the sort clauses of this query.
    pub fn differs_only_in_sort(&self, other: &TableQuery) -> bool {
        self.page_index == other.page_index
            && self.page_size == other.page_size
            && self.filters == other.filters
            && self.sort != other.sort
    }
}
