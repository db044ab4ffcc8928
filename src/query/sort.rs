//! Sort parameters

use std::fmt;

use super::{QueryError, Queryable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One `ORDER BY` term. Columns are checked against a [`Queryable`] column table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortItem {
    pub column: String,
    pub direction: SortDirection,
}

impl SortItem {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parse a `sort_by` value; a leading `-` selects descending order
    pub fn parse<T: Queryable>(value: &str) -> Result<Self, QueryError> {
        let (column, direction) = match value.strip_prefix('-') {
            Some(column) => (column, SortDirection::Descending),
            None => (value, SortDirection::Ascending),
        };

        if !T::is_sortable(column) {
            return Err(QueryError::NotSortable {
                column: column.to_string(),
            });
        }

        Ok(Self {
            column: column.to_string(),
            direction,
        })
    }
}

impl fmt::Display for SortItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => write!(f, "{}", self.column),
            SortDirection::Descending => write!(f, "{} DESC", self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IngestJob;

    #[test]
    fn test_parse_ascending_and_descending() {
        let item = SortItem::parse::<IngestJob>("start_time").unwrap();
        assert_eq!(item, SortItem::ascending("start_time"));
        assert_eq!(item.to_string(), "start_time");

        let item = SortItem::parse::<IngestJob>("-id").unwrap();
        assert_eq!(item, SortItem::descending("id"));
        assert_eq!(item.to_string(), "id DESC");
    }

    #[test]
    fn test_parse_rejects_unknown_column() {
        let err = SortItem::parse::<IngestJob>("password").unwrap_err();
        assert_eq!(
            err,
            QueryError::NotSortable {
                column: "password".to_string()
            }
        );

        assert!(SortItem::parse::<IngestJob>("").is_err());
        assert!(SortItem::parse::<IngestJob>("-").is_err());
    }
}
