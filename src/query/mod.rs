//! Query-string parsing for list endpoints
//!
//! List endpoints accept `skip`, `limit`, repeated `sort_by` values and any
//! number of `column=op:value` filter predicates. Parsing is driven by the
//! column table a resource exposes through [`Queryable`], and produces typed
//! values: [`SortItem`]s and [`FilterExpr`]s. [`SqlFilter::build`] turns the
//! filter expressions into a parameterized predicate for the store.

pub mod filter;
pub mod params;
pub mod sort;

use thiserror::Error;

pub use filter::{FilterExpr, FilterOperator, SqlFilter};
pub use params::{ListParams, DEFAULT_LIMIT};
pub use sort::{SortDirection, SortItem};

/// Value domain of a queryable column, used to validate filter operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
    Timestamp,
    Status,
}

/// Describes how one column of a resource may be sorted and filtered
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub sortable: bool,
    pub operators: &'static [FilterOperator],
}

impl ColumnSpec {
    pub const fn new(
        name: &'static str,
        kind: ColumnKind,
        sortable: bool,
        operators: &'static [FilterOperator],
    ) -> Self {
        Self {
            name,
            kind,
            sortable,
            operators,
        }
    }

    pub fn supports(&self, operator: FilterOperator) -> bool {
        self.operators.contains(&operator)
    }
}

/// Resources that can be listed with sorting and filtering
pub trait Queryable {
    fn columns() -> &'static [ColumnSpec];

    fn column(name: &str) -> Option<&'static ColumnSpec> {
        Self::columns().iter().find(|column| column.name == name)
    }

    fn is_sortable(name: &str) -> bool {
        Self::column(name).is_some_and(|column| column.sortable)
    }
}

/// Rejections produced while parsing list query parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("column format does not support sorting: '{column}'")]
    NotSortable { column: String },

    #[error("the specified column cannot be filtered: '{column}'")]
    ColumnNotFilterable { column: String },

    #[error("malformed filter predicate for column '{column}': '{predicate}'")]
    MalformedPredicate { column: String, predicate: String },

    #[error("the specified filter predicate is not supported for this column: '{column}' does not accept '{operator}'")]
    PredicateNotSupported { column: String, operator: String },

    #[error("invalid value for column '{column}': {reason}")]
    InvalidOperand { column: String, reason: String },

    #[error("query parameter '{name}' is malformed: '{value}'")]
    MalformedParameter { name: String, value: String },
}
