//! Helpers for reflecting a table's page in the URL as `{table_id}-page=N`.
//!
//! The controller never reads or writes URLs; the presentation layer uses
//! these to pick the initial page for [`fetch_immediate`] and to update the
//! query string after a page change.
//!
//! [`fetch_immediate`]: crate::controller::TableController::fetch_immediate

use url::form_urlencoded;

/// Returns the query parameter name for a table's page.
pub fn page_param(table_id: &str) -> String {
    format!("{}-page", table_id)
}

/// Reads the zero-based page index from a query string.
///
/// The URL carries one-based pages; missing, zero or malformed values yield
/// `None`. A leading `?` is accepted.
pub fn page_index_from_query(table_id: &str, query: &str) -> Option<usize> {
    let name = page_param(table_id);
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| value.parse::<usize>().ok())
        .and_then(|page| page.checked_sub(1))
}

/// Returns the `name=value` pair for a zero-based page index.
pub fn page_query_pair(table_id: &str, page_index: usize) -> (String, String) {
    (page_param(table_id), (page_index + 1).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_url() {
        assert_eq!(page_param("enrollments"), "enrollments-page");
        assert_eq!(
            page_index_from_query("enrollments", "?foo=1&enrollments-page=3"),
            Some(2)
        );
        assert_eq!(
            page_query_pair("enrollments", 2),
            ("enrollments-page".to_string(), "3".to_string())
        );
    }

    #[test]
    fn test_invalid_pages() {
        assert_eq!(page_index_from_query("t", "t-page=0"), None);
        assert_eq!(page_index_from_query("t", "t-page=abc"), None);
        assert_eq!(page_index_from_query("t", "other-page=2"), None);
        assert_eq!(page_index_from_query("t", ""), None);
    }
}
