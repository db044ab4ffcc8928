//! Filter predicates and the SQL they compile to

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use super::{ColumnKind, QueryError, Queryable};
use crate::model::JobStatus;

/// Comparison operators accepted in `column=op:value` predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEquals,
    LessThan,
    LessThanOrEquals,
    ApproximatelyEquals,
}

impl FilterOperator {
    pub fn token(self) -> &'static str {
        match self {
            FilterOperator::Equals => "eq",
            FilterOperator::NotEquals => "neq",
            FilterOperator::GreaterThan => "gt",
            FilterOperator::GreaterThanOrEquals => "gte",
            FilterOperator::LessThan => "lt",
            FilterOperator::LessThanOrEquals => "lte",
            FilterOperator::ApproximatelyEquals => "~eq",
        }
    }

    fn sql(self) -> &'static str {
        match self {
            FilterOperator::Equals => "=",
            FilterOperator::NotEquals => "<>",
            FilterOperator::GreaterThan => ">",
            FilterOperator::GreaterThanOrEquals => ">=",
            FilterOperator::LessThan => "<",
            FilterOperator::LessThanOrEquals => "<=",
            FilterOperator::ApproximatelyEquals => "ILIKE",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for FilterOperator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(FilterOperator::Equals),
            "neq" => Ok(FilterOperator::NotEquals),
            "gt" => Ok(FilterOperator::GreaterThan),
            "gte" => Ok(FilterOperator::GreaterThanOrEquals),
            "lt" => Ok(FilterOperator::LessThan),
            "lte" => Ok(FilterOperator::LessThanOrEquals),
            "~eq" => Ok(FilterOperator::ApproximatelyEquals),
            _ => Err(()),
        }
    }
}

/// A single validated predicate: `column operator operand`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpr {
    pub column: String,
    pub kind: ColumnKind,
    pub operator: FilterOperator,
    pub operand: String,
}

impl FilterExpr {
    /// Parse the `op:value` predicate given for `column`.
    ///
    /// The operand is normalized for its column kind: integers and statuses
    /// become their decimal form, timestamps become RFC 3339 in UTC.
    pub fn parse<T: Queryable>(column: &str, predicate: &str) -> Result<Self, QueryError> {
        let spec = T::column(column).ok_or_else(|| QueryError::ColumnNotFilterable {
            column: column.to_string(),
        })?;

        let malformed = || QueryError::MalformedPredicate {
            column: column.to_string(),
            predicate: predicate.to_string(),
        };

        // Split on the first colon only; timestamp operands contain colons
        let (token, raw) = predicate.split_once(':').ok_or_else(malformed)?;
        if raw.is_empty() {
            return Err(malformed());
        }

        let operator = token
            .parse::<FilterOperator>()
            .map_err(|_| QueryError::PredicateNotSupported {
                column: column.to_string(),
                operator: token.to_string(),
            })?;

        if !spec.supports(operator) {
            return Err(QueryError::PredicateNotSupported {
                column: column.to_string(),
                operator: token.to_string(),
            });
        }

        let invalid = |reason: String| QueryError::InvalidOperand {
            column: column.to_string(),
            reason,
        };

        let operand = match spec.kind {
            ColumnKind::Text => raw.to_string(),
            ColumnKind::Integer => raw
                .parse::<i64>()
                .map(|value| value.to_string())
                .map_err(|_| invalid(format!("'{raw}' is not an integer")))?,
            ColumnKind::Timestamp => DateTime::parse_from_rfc3339(raw)
                .map(|value| value.with_timezone(&Utc).to_rfc3339())
                .map_err(|_| invalid(format!("'{raw}' is not an RFC 3339 timestamp")))?,
            ColumnKind::Status => raw
                .parse::<JobStatus>()
                .map(|status| status.code().to_string())
                .map_err(invalid)?,
        };

        Ok(Self {
            column: spec.name.to_string(),
            kind: spec.kind,
            operator,
            operand,
        })
    }
}

/// A parameterized SQL predicate with `?` positional placeholders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlFilter {
    pub sql: String,
    pub params: Vec<String>,
}

impl SqlFilter {
    /// Compile filter expressions into a conjunction
    pub fn build(filters: &[FilterExpr]) -> Self {
        let mut terms = Vec::with_capacity(filters.len());
        let mut params = Vec::with_capacity(filters.len());

        for filter in filters {
            let placeholder = match filter.kind {
                ColumnKind::Text => "?",
                ColumnKind::Integer | ColumnKind::Status => "CAST(? AS BIGINT)",
                ColumnKind::Timestamp => "CAST(? AS TIMESTAMPTZ)",
            };

            match filter.operator {
                FilterOperator::ApproximatelyEquals => {
                    terms.push(format!(
                        "{} {} {} ESCAPE '\\'",
                        filter.column,
                        filter.operator.sql(),
                        placeholder
                    ));
                    params.push(format!("%{}%", escape_like(&filter.operand)));
                }
                _ => {
                    terms.push(format!(
                        "{} {} {}",
                        filter.column,
                        filter.operator.sql(),
                        placeholder
                    ));
                    params.push(filter.operand.clone());
                }
            }
        }

        Self {
            sql: terms.join(" AND "),
            params,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Escape `LIKE` wildcards so the operand matches literally
fn escape_like(operand: &str) -> String {
    let mut escaped = String::with_capacity(operand.len());
    for ch in operand.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IngestJob;

    #[test]
    fn test_equality_on_text_column() {
        let expr = FilterExpr::parse::<IngestJob>("user_id", "eq:123").unwrap();
        let filter = SqlFilter::build(&[expr]);

        assert_eq!(
            filter,
            SqlFilter {
                sql: "user_id = ?".to_string(),
                params: vec!["123".to_string()],
            }
        );
    }

    #[test]
    fn test_typed_columns_are_cast() {
        let filters = vec![
            FilterExpr::parse::<IngestJob>("id", "gte:10").unwrap(),
            FilterExpr::parse::<IngestJob>("status", "neq:complete").unwrap(),
            FilterExpr::parse::<IngestJob>("start_time", "lt:2024-05-01T10:00:00+02:00").unwrap(),
        ];
        let filter = SqlFilter::build(&filters);

        assert_eq!(
            filter.sql,
            "id >= CAST(? AS BIGINT) AND status <> CAST(? AS BIGINT) AND start_time < CAST(? AS TIMESTAMPTZ)"
        );
        assert_eq!(filter.params, vec!["10", "2", "2024-05-01T08:00:00+00:00"]);
    }

    #[test]
    fn test_approximate_match_wraps_operand() {
        let expr = FilterExpr::parse::<IngestJob>("user_email_address", "~eq:example").unwrap();
        let filter = SqlFilter::build(&[expr]);

        assert_eq!(filter.sql, r"user_email_address ILIKE ? ESCAPE '\'");
        assert_eq!(filter.params, vec!["%example%"]);
    }

    #[test]
    fn test_approximate_match_escapes_wildcards() {
        let filters = vec![
            FilterExpr::parse::<IngestJob>("user_email_address", "~eq:a_b").unwrap(),
            FilterExpr::parse::<IngestJob>("status_message", "~eq:100%").unwrap(),
            FilterExpr::parse::<IngestJob>("status_message", r"~eq:c:\tmp").unwrap(),
        ];
        let filter = SqlFilter::build(&filters);

        assert_eq!(filter.params, vec![r"%a\_b%", r"%100\%%", r"%c:\\tmp%"]);
    }

    #[test]
    fn test_empty_filter() {
        let filter = SqlFilter::build(&[]);
        assert!(filter.is_empty());
        assert!(filter.params.is_empty());
    }

    #[test]
    fn test_rejections() {
        assert!(matches!(
            FilterExpr::parse::<IngestJob>("secret", "eq:1"),
            Err(QueryError::ColumnNotFilterable { .. })
        ));
        assert!(matches!(
            FilterExpr::parse::<IngestJob>("id", "123"),
            Err(QueryError::MalformedPredicate { .. })
        ));
        assert!(matches!(
            FilterExpr::parse::<IngestJob>("id", "eq:"),
            Err(QueryError::MalformedPredicate { .. })
        ));
        assert!(matches!(
            FilterExpr::parse::<IngestJob>("id", "like:1"),
            Err(QueryError::PredicateNotSupported { .. })
        ));
        assert!(matches!(
            FilterExpr::parse::<IngestJob>("user_id", "gt:1"),
            Err(QueryError::PredicateNotSupported { .. })
        ));
        assert!(matches!(
            FilterExpr::parse::<IngestJob>("id", "eq:abc"),
            Err(QueryError::InvalidOperand { .. })
        ));
        assert!(matches!(
            FilterExpr::parse::<IngestJob>("end_time", "gt:yesterday"),
            Err(QueryError::InvalidOperand { .. })
        ));
    }
}
