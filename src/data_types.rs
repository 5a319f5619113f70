use std::collections::HashMap;

use strum_macros::{Display, EnumString};

pub type BaseId = i64;
pub type TableId = i64;
pub type ColumnId = i64;
pub type RowId = i64;
pub type CellId = i64;
pub type ViewId = i64;
pub type ViewSortId = i64;
pub type ViewFilterId = i64;

/// Declared type of a column. Stored in the backing store as its
/// lowercase string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum ColumnType {
    #[default]
    #[strum(serialize = "text")]
    Text,
    #[strum(serialize = "number")]
    Number,
}

/// Parse a cell value as a finite float, the way a spreadsheet number
/// field would. Surrounding whitespace is ignored; non-finite values
/// (inf/NaN) don't count as numbers.
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Compute a cell's numeric projection from its raw value and the owning
/// column's type. This is the single derivation point: every write path
/// goes through it, so `numeric_value` can never go stale.
pub fn derive_numeric(value: &str, column_type: ColumnType) -> Option<f64> {
    match column_type {
        ColumnType::Number => parse_number(value),
        ColumnType::Text => None,
    }
}

/// How cell values are produced for newly inserted rows.
#[derive(Debug, Clone)]
pub enum RowValuePolicy {
    /// Every cell gets the column's default value (empty string if none).
    Blank,
    /// Generated sample data: text columns get a display name, number
    /// columns a bounded random integer. Bulk row creation doubles as
    /// seed-data generation.
    Sample,
    /// Caller-provided values per column; missing columns fall back to
    /// the empty string.
    Provided(HashMap<ColumnId, String>),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("42", Some(42.0))]
    #[case("-17.5", Some(-17.5))]
    #[case("1e3", Some(1000.0))]
    #[case(" 7 ", Some(7.0))]
    #[case("abc", None)]
    #[case("", None)]
    #[case("inf", None)]
    #[case("NaN", None)]
    fn test_parse_number(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_number(input), expected);
    }

    #[test]
    fn test_derive_numeric_respects_column_type() {
        assert_eq!(derive_numeric("42", ColumnType::Number), Some(42.0));
        assert_eq!(derive_numeric("abc", ColumnType::Number), None);
        // A numeric-looking value in a text column has no projection
        assert_eq!(derive_numeric("42", ColumnType::Text), None);
    }

    #[test]
    fn test_column_type_round_trip() {
        assert_eq!(ColumnType::from_str("number").unwrap(), ColumnType::Number);
        assert_eq!(ColumnType::Text.to_string(), "text");
        assert!(ColumnType::from_str("formula").is_err());
    }
}
