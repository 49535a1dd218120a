//! Sort clauses for table queries.

/// Sort direction for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Returns `true` for [`Direction::Desc`].
    pub fn is_descending(self) -> bool {
        matches!(self, Self::Desc)
    }

    /// Builds a direction from a `desc` flag as emitted by table widgets.
    pub fn from_desc(desc: bool) -> Self {
        if desc { Self::Desc } else { Self::Asc }
    }
}

/// A single sort instruction on a presentation column.
///
/// Queries carry an ordered list of these; the first clause is the primary sort.
///
/// # Example
///
/// ```
/// use tableview_lib::query::SortClause;
///
/// let clause = SortClause::desc("date");
/// assert!(clause.is_descending());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    column_id: String,
    direction: Direction,
}

impl SortClause {
    /// Creates a sort clause.
    pub fn new(column_id: impl Into<String>, direction: Direction) -> Self {
        Self {
            column_id: column_id.into(),
            direction,
        }
    }

    /// Creates an ascending sort on a column.
    pub fn asc(column_id: impl Into<String>) -> Self {
        Self::new(column_id, Direction::Asc)
    }

    /// Creates a descending sort on a column.
    pub fn desc(column_id: impl Into<String>) -> Self {
        Self::new(column_id, Direction::Desc)
    }

    /// Returns the presentation column id.
    pub fn column_id(&self) -> &str {
        &self.column_id
    }

    /// Returns the sort direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns `true` if this clause sorts descending.
    pub fn is_descending(&self) -> bool {
        self.direction.is_descending()
    }
}
