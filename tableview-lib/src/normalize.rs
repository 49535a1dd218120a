//! Error normalization: which failures mean "no rows" and which are fatal.

use crate::error::FetchError;

/// Outcome of normalizing a fetch failure.
#[derive(Debug)]
pub enum Normalized {
    /// Zero rows legitimately matched; commit an empty page.
    Empty,
    /// A real failure; store it and keep the previous data.
    Fatal(FetchError),
}

impl Normalized {
    /// Returns `true` for [`Normalized::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` for [`Normalized::Fatal`].
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Policy mapping fetch failures to [`Normalized`] outcomes.
///
/// Some list endpoints answer 404 when a filter matches nothing. The default
/// policy treats 404 as an empty result; backends where 404 means "no such
/// route" should use [`ErrorNormalizer::strict`].
///
/// # Example
///
/// ```
/// use tableview_lib::error::FetchError;
/// use tableview_lib::normalize::ErrorNormalizer;
///
/// let normalizer = ErrorNormalizer::default();
/// assert!(normalizer.normalize(FetchError::not_found()).is_empty());
/// assert!(ErrorNormalizer::strict().normalize(FetchError::not_found()).is_fatal());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorNormalizer {
    empty_statuses: Vec<u16>,
}

impl Default for ErrorNormalizer {
    fn default() -> Self {
        Self {
            empty_statuses: vec![404],
        }
    }
}

impl ErrorNormalizer {
    /// Creates the default policy (404 means empty).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a policy where every failure is fatal.
    pub fn strict() -> Self {
        Self {
            empty_statuses: Vec::new(),
        }
    }

    /// Adds a status code that means "zero rows matched".
    pub fn treat_as_empty(mut self, status: u16) -> Self {
        if !self.empty_statuses.contains(&status) {
            self.empty_statuses.push(status);
        }
        self
    }

    /// Returns the statuses treated as empty results.
    pub fn empty_statuses(&self) -> &[u16] {
        &self.empty_statuses
    }

    /// Classifies a fetch failure.
    pub fn normalize(&self, err: FetchError) -> Normalized {
        match err.status_code() {
            Some(status) if self.empty_statuses.contains(&status) => Normalized::Empty,
            _ => Normalized::Fatal(err),
        }
    }
}
