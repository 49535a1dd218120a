//! Error snapshot stored in table state

use super::FetchError;

/// A fatal fetch error as kept in [`TableState`](crate::store::TableState).
///
/// Unlike [`FetchError`] this is cheap to clone, so state snapshots can carry it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableError {
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code, if the failure had one.
    pub status: Option<u16>,
    /// Whether re-issuing the same query may succeed.
    pub retryable: bool,
}

impl TableError {
    /// Creates a new table error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            retryable: false,
        }
    }
}

impl From<&FetchError> for TableError {
    fn from(err: &FetchError) -> Self {
        Self {
            message: err.to_string(),
            status: err.status_code(),
            retryable: err.is_retryable(),
        }
    }
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
