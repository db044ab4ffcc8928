//! Pagination, sorting and filtering parameters of a list request

use super::{FilterExpr, QueryError, Queryable, SortItem, SqlFilter};

pub const QUERY_PARAMETER_SKIP: &str = "skip";
pub const QUERY_PARAMETER_LIMIT: &str = "limit";
pub const QUERY_PARAMETER_SORT_BY: &str = "sort_by";

/// Page size used when a request does not give `limit`
pub const DEFAULT_LIMIT: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub skip: u32,
    pub limit: u32,
    pub sort: Vec<SortItem>,
    pub filters: Vec<FilterExpr>,
}

impl ListParams {
    /// Parse raw query pairs. Sorting is validated first, then filters, then
    /// pagination. Every key that is not a pagination or sort parameter is
    /// treated as a filter column.
    pub fn parse<T: Queryable>(pairs: &[(String, String)]) -> Result<Self, QueryError> {
        let sort = pairs
            .iter()
            .filter(|(key, _)| key == QUERY_PARAMETER_SORT_BY)
            .map(|(_, value)| SortItem::parse::<T>(value))
            .collect::<Result<Vec<_>, _>>()?;

        let filters = pairs
            .iter()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(column, predicate)| FilterExpr::parse::<T>(column, predicate))
            .collect::<Result<Vec<_>, _>>()?;

        let skip = parse_count(pairs, QUERY_PARAMETER_SKIP, 0)?;
        let limit = parse_count(pairs, QUERY_PARAMETER_LIMIT, DEFAULT_LIMIT)?;

        Ok(Self {
            skip,
            limit,
            sort,
            filters,
        })
    }

    pub fn sql_filter(&self) -> SqlFilter {
        SqlFilter::build(&self.filters)
    }
}

fn is_reserved(key: &str) -> bool {
    matches!(
        key,
        QUERY_PARAMETER_SKIP | QUERY_PARAMETER_LIMIT | QUERY_PARAMETER_SORT_BY
    )
}

fn parse_count(pairs: &[(String, String)], name: &str, default: u32) -> Result<u32, QueryError> {
    match pairs.iter().find(|(key, _)| key == name) {
        None => Ok(default),
        Some((_, value)) => value
            .parse::<u32>()
            .map_err(|_| QueryError::MalformedParameter {
                name: name.to_string(),
                value: value.clone(),
            }),
    }
}
