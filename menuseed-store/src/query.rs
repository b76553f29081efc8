//! Query filters understood by the document and file listing calls.

use serde_json::{json, Value};

use menuseed_core::RecordId;

/// Default page size the backend applies when no limit is given.
pub const DEFAULT_LIMIT: u32 = 25;

/// A single listing filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Attribute equals any of `values`.
    Equal { attribute: String, values: Vec<Value> },
    /// Return at most `n` results.
    Limit(u32),
    /// Resume after the record with this id.
    CursorAfter(RecordId),
}

impl Query {
    pub fn equal(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Query::Equal {
            attribute: attribute.into(),
            values: vec![value.into()],
        }
    }

    pub fn limit(n: u32) -> Self {
        Query::Limit(n)
    }

    pub fn cursor_after(id: &RecordId) -> Self {
        Query::CursorAfter(id.clone())
    }

    /// Serialize to the backend's JSON query syntax.
    pub fn to_wire(&self) -> String {
        let value = match self {
            Query::Equal { attribute, values } => json!({
                "method": "equal",
                "attribute": attribute,
                "values": values,
            }),
            Query::Limit(n) => json!({ "method": "limit", "values": [n] }),
            Query::CursorAfter(id) => json!({ "method": "cursorAfter", "values": [id.0] }),
        };
        value.to_string()
    }
}

/// The effective limit of a query set.
pub fn effective_limit(queries: &[Query]) -> u32 {
    queries
        .iter()
        .rev()
        .find_map(|q| match q {
            Query::Limit(n) => Some(*n),
            _ => None,
        })
        .unwrap_or(DEFAULT_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Query::limit(1), r#"{"method":"limit","values":[1]}"#)]
    #[case(
        Query::equal("name", "Bacon"),
        r#"{"attribute":"name","method":"equal","values":["Bacon"]}"#
    )]
    #[case(
        Query::cursor_after(&RecordId::from("abc")),
        r#"{"method":"cursorAfter","values":["abc"]}"#
    )]
    fn wire_format(#[case] query: Query, #[case] expected: &str) {
        let actual: Value = serde_json::from_str(&query.to_wire()).unwrap();
        let expected: Value = serde_json::from_str(expected).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn last_limit_wins_and_default_applies() {
        assert_eq!(effective_limit(&[]), DEFAULT_LIMIT);
        assert_eq!(effective_limit(&[Query::limit(5), Query::limit(7)]), 7);
    }
}
