//! Page type holding the current data of one table.

use serde::Serialize;
use serde_json::Value;

/// A page of table results with pagination totals.
///
/// Records are opaque JSON values; the controller never looks inside them
/// except to sort a fully resident result set.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tableview_lib::query::TablePage;
///
/// let page = TablePage::from_count(vec![json!({"id": 1})], 45, 20);
/// assert_eq!(page.item_count(), 45);
/// assert_eq!(page.page_count(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePage {
    results: Vec<Value>,
    item_count: u64,
    page_count: u64,
}

impl TablePage {
    /// Creates a page with explicit totals.
    pub fn new(results: Vec<Value>, item_count: u64, page_count: u64) -> Self {
        Self {
            results,
            item_count,
            page_count,
        }
    }

    /// Creates a page deriving the page count from the item count.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    pub fn from_count(results: Vec<Value>, item_count: u64, page_size: usize) -> Self {
        Self::new(results, item_count, page_count_for(item_count, page_size))
    }

    /// Creates the page used when zero rows matched.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the records of this page.
    pub fn results(&self) -> &[Value] {
        &self.results
    }

    pub(crate) fn results_mut(&mut self) -> &mut Vec<Value> {
        &mut self.results
    }

    /// Consumes the page and returns the records.
    pub fn into_results(self) -> Vec<Value> {
        self.results
    }

    /// Returns the total number of matching records across all pages.
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Returns the number of pages the result set spans.
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    /// Returns `true` if this page has no records.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the number of records in this page.
    pub fn len(&self) -> usize {
        self.results.len()
    }
}

/// `ceil(item_count / page_size)`.
///
/// # Panics
///
/// Panics if `page_size` is zero.
pub fn page_count_for(item_count: u64, page_size: usize) -> u64 {
    assert!(page_size > 0, "page_size must be greater than zero");
    item_count.div_ceil(page_size as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count_rounds_up() {
        assert_eq!(page_count_for(0, 20), 0);
        assert_eq!(page_count_for(1, 20), 1);
        assert_eq!(page_count_for(20, 20), 1);
        assert_eq!(page_count_for(21, 20), 2);
        assert_eq!(page_count_for(45, 20), 3);
    }

    #[test]
    fn test_empty_page() {
        let page = TablePage::empty();
        assert!(page.is_empty());
        assert_eq!(page.item_count(), 0);
        assert_eq!(page.page_count(), 0);
    }
}
