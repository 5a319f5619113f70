use strum_macros::{Display, EnumString};

use crate::data_types::ColumnId;

/// Filter operators recognized by the query executor. A closed set: an
/// operator string the UI sends that isn't listed here is a parse error,
/// not a silent fallthrough.
///
/// The `empty`/`notEmpty` pair tests the numeric projection (number
/// columns); the `empty2`/`notEmpty2` pair tests the raw value (text
/// columns). The operator names are part of the wire contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum FilterOp {
    #[strum(serialize = "empty")]
    Empty,
    #[strum(serialize = "notEmpty")]
    NotEmpty,
    #[strum(serialize = "empty2")]
    EmptyText,
    #[strum(serialize = "notEmpty2")]
    NotEmptyText,
    #[strum(serialize = "includesString")]
    IncludesString,
    #[strum(serialize = "eq")]
    Eq,
    #[strum(serialize = "gt")]
    Gt,
    #[strum(serialize = "lt")]
    Lt,
}

impl FilterOp {
    /// Value-comparing operators with an empty filter value match every
    /// row; such conditions compile to nothing.
    pub fn matches_everything(&self, value: &str) -> bool {
        matches!(
            self,
            FilterOp::IncludesString | FilterOp::Eq | FilterOp::Gt | FilterOp::Lt
        ) && value.is_empty()
    }
}

/// Per-condition combinator accepted from the UI contract. The executor
/// combines all active conditions conjunctively regardless; `Or` is stored
/// and round-tripped but not (yet) evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum FilterLogic {
    #[default]
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
}

/// One declarative filter condition over a column's cells.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub column_id: ColumnId,
    pub op: FilterOp,
    pub value: String,
    pub logic: FilterLogic,
}

impl FilterCondition {
    pub fn new(column_id: ColumnId, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column_id,
            op,
            value: value.into(),
            logic: FilterLogic::And,
        }
    }
}

/// Turn a search term into a case-insensitive LIKE pattern, escaping LIKE
/// metacharacters so the term is matched literally. Meant to be compared
/// against `LOWER(value)` with `ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("empty", FilterOp::Empty)]
    #[case("notEmpty", FilterOp::NotEmpty)]
    #[case("empty2", FilterOp::EmptyText)]
    #[case("notEmpty2", FilterOp::NotEmptyText)]
    #[case("includesString", FilterOp::IncludesString)]
    #[case("eq", FilterOp::Eq)]
    #[case("gt", FilterOp::Gt)]
    #[case("lt", FilterOp::Lt)]
    fn test_operator_names_round_trip(#[case] name: &str, #[case] op: FilterOp) {
        assert_eq!(FilterOp::from_str(name).unwrap(), op);
        assert_eq!(op.to_string(), name);
    }

    #[test]
    fn test_unknown_operator_is_an_error() {
        assert!(FilterOp::from_str("contains").is_err());
        assert!(FilterOp::from_str("EMPTY").is_err());
    }

    #[test]
    fn test_trivial_conditions() {
        assert!(FilterOp::Gt.matches_everything(""));
        assert!(FilterOp::IncludesString.matches_everything(""));
        assert!(!FilterOp::Gt.matches_everything("5"));
        // Emptiness checks never trivially match
        assert!(!FilterOp::Empty.matches_everything(""));
        assert!(!FilterOp::NotEmptyText.matches_everything(""));
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("Alice"), "%alice%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("C:\\temp"), "%c:\\\\temp%");
    }
}
