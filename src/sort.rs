use std::cmp::Ordering;

use serde_json::Value;

use crate::data_types::ColumnId;

/// One sort key: a column plus a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column_id: ColumnId,
    pub descending: bool,
}

impl SortKey {
    pub fn asc(column_id: ColumnId) -> Self {
        Self {
            column_id,
            descending: false,
        }
    }

    pub fn desc(column_id: ColumnId) -> Self {
        Self {
            column_id,
            descending: true,
        }
    }
}

/// A materialized row: a JSON object keyed by column id (stringified),
/// plus the `id` and `order` bookkeeping keys.
pub type FlatRow = serde_json::Map<String, Value>;

/// Sort flattened rows by an ordered list of keys.
///
/// Per key: if both values are numbers they compare numerically, otherwise
/// their string renditions compare lexicographically (case folded first, so
/// the order approximates a locale-aware collation; null renders as the
/// empty string). The first non-equal key decides, inverted when the key is
/// descending. Rows equal under every key fall back to `order` ascending so
/// the result doesn't depend on storage fetch order.
pub fn sort_rows(rows: &mut [FlatRow], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }

    rows.sort_by(|a, b| {
        for key in keys {
            let field = key.column_id.to_string();
            let ordering = compare_values(
                a.get(&field).unwrap_or(&Value::Null),
                b.get(&field).unwrap_or(&Value::Null),
            );
            if ordering != Ordering::Equal {
                return if key.descending {
                    ordering.reverse()
                } else {
                    ordering
                };
            }
        }
        row_order(a).cmp(&row_order(b))
    });
}

fn row_order(row: &FlatRow) -> i64 {
    row.get("order").and_then(Value::as_i64).unwrap_or(0)
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        // Projections are always finite, so total_cmp and partial_cmp agree
        return x.total_cmp(&y);
    }

    let (a, b) = (rendition(a), rendition(b));
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(&b))
}

fn rendition(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n
            .as_f64()
            .map(|f| f.to_string())
            .unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}
