use std::collections::HashMap;
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::context::GridContext;
use crate::data_types::{ColumnType, RowId, TableId, ViewId};
use crate::error::{GridError, GridResult};
use crate::filter::{FilterCondition, FilterLogic, FilterOp};
use crate::repository::interface::{
    ColumnRecord, Error as RepositoryError, RowRecord,
};
use crate::sort::{sort_rows, FlatRow, SortKey};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// A declarative query over one table: an optional view whose saved
/// configuration supplies filters/sorts, inline overrides for both, a
/// global search term and a pagination cursor.
#[derive(Debug, Clone)]
pub struct GridQuery {
    pub table_id: TableId,
    pub view_id: Option<ViewId>,
    /// Inline filters; when set they take precedence over the view's saved
    /// filters.
    pub filters: Option<Vec<FilterCondition>>,
    /// Inline sort keys; when set they take precedence over the view's
    /// saved sorts.
    pub sorts: Option<Vec<SortKey>>,
    pub search: Option<String>,
    /// Resume after this row id (the `next_cursor` of the previous page).
    pub cursor: Option<RowId>,
    pub page_size: usize,
}

impl GridQuery {
    pub fn new(table_id: TableId) -> Self {
        Self {
            table_id,
            view_id: None,
            filters: None,
            sorts: None,
            search: None,
            cursor: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of query results. `data` rows are JSON objects keyed by
/// stringified column id, plus `id` and `order`.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub data: Vec<FlatRow>,
    pub next_cursor: Option<RowId>,
    pub has_next_page: bool,
}

impl GridContext {
    /// Execute a query and return one page of flattened rows.
    ///
    /// Matching rows are fetched in id order and the page is sorted in
    /// memory afterwards, so the sort applies within a page rather than
    /// across the whole result set (pages stay disjoint under a moving
    /// cursor even while rows are being mutated).
    pub async fn get_data(&self, query: &GridQuery) -> GridResult<QueryPage> {
        self.ensure_table(query.table_id).await?;

        let page_size = i64::try_from(query.page_size).ok().filter(|s| *s >= 1).ok_or(
            GridError::InvalidInput {
                reason: format!("page size must be at least 1, got {}", query.page_size),
            },
        )?;

        let (filters, sorts) = self.resolve_view_config(query).await?;

        let rows = self
            .repository
            .fetch_row_page(
                query.table_id,
                &filters,
                query.search.as_deref(),
                query.cursor,
                page_size,
            )
            .await?;

        let columns = self.repository.list_columns(query.table_id).await?;
        let mut data = self.flatten_rows(&rows, &columns).await?;
        sort_rows(&mut data, &sorts);

        let has_next_page = rows.len() == query.page_size;
        let next_cursor = if has_next_page {
            rows.last().map(|r| r.id)
        } else {
            None
        };

        debug!(
            table_id = query.table_id,
            rows = data.len(),
            has_next_page,
            "executed query"
        );

        Ok(QueryPage {
            data,
            next_cursor,
            has_next_page,
        })
    }

    /// Number of rows matching the query's filters, ignoring pagination.
    pub async fn total_rows(&self, query: &GridQuery) -> GridResult<i64> {
        self.ensure_table(query.table_id).await?;

        let (filters, _) = self.resolve_view_config(query).await?;
        Ok(self.repository.count_rows(query.table_id, &filters).await?)
    }

    /// Number of individual cells matching a search term, for "N found"
    /// indicators (a row with two matching cells counts twice).
    pub async fn total_matches(
        &self,
        table_id: TableId,
        search: &str,
    ) -> GridResult<i64> {
        self.ensure_table(table_id).await?;

        Ok(self
            .repository
            .count_matching_cells(table_id, search)
            .await?)
    }

    /// Existence check up front, so an empty result is distinguishable from
    /// a missing table (COUNT(*) alone always yields a row).
    async fn ensure_table(&self, table_id: TableId) -> GridResult<()> {
        self.repository.get_table(table_id).await.map_err(|e| match e {
            RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                GridError::TableDoesNotExist { id: table_id }
            }
            e => e.into(),
        })?;
        Ok(())
    }

    /// Determine the effective filters and sorts: inline ones take
    /// precedence, otherwise the view's saved configuration applies.
    async fn resolve_view_config(
        &self,
        query: &GridQuery,
    ) -> GridResult<(Vec<FilterCondition>, Vec<SortKey>)> {
        let mut filters = query.filters.clone();
        let mut sorts = query.sorts.clone();

        if let Some(view_id) = query.view_id {
            if filters.is_none() {
                let saved = self.repository.list_view_filters(view_id).await?;
                filters = Some(
                    saved
                        .into_iter()
                        .map(|f| {
                            // Stored operators come from the closed set, but
                            // guard against hand-edited rows
                            let op = FilterOp::from_str(&f.operator).map_err(|_| {
                                GridError::InvalidInput {
                                    reason: format!(
                                        "unknown filter operator {:?}",
                                        f.operator
                                    ),
                                }
                            })?;
                            let logic = FilterLogic::from_str(&f.logic)
                                .unwrap_or_default();
                            Ok(FilterCondition {
                                column_id: f.column_id,
                                op,
                                value: f.value,
                                logic,
                            })
                        })
                        .collect::<GridResult<Vec<_>>>()?,
                );
            }
            if sorts.is_none() {
                let saved = self.repository.list_view_sorts(view_id).await?;
                sorts = Some(
                    saved
                        .into_iter()
                        .map(|s| SortKey {
                            column_id: s.column_id,
                            descending: s.descending,
                        })
                        .collect(),
                );
            }
        }

        Ok((filters.unwrap_or_default(), sorts.unwrap_or_default()))
    }

    /// Join rows with their cells into JSON objects keyed by stringified
    /// column id. Number columns expose the numeric projection (JSON
    /// number, or null when the raw value doesn't parse), text columns the
    /// raw string; a missing cell renders as the empty string.
    async fn flatten_rows(
        &self,
        rows: &[RowRecord],
        columns: &[ColumnRecord],
    ) -> GridResult<Vec<FlatRow>> {
        let row_ids = rows.iter().map(|r| r.id).collect::<Vec<_>>();
        let cells = self.repository.cells_for_rows(&row_ids).await?;

        let mut by_position: HashMap<(RowId, i64), &_> = HashMap::new();
        for cell in &cells {
            by_position.insert((cell.row_id, cell.column_id), cell);
        }

        let mut data = Vec::with_capacity(rows.len());
        for row in rows {
            let mut flat = FlatRow::new();
            flat.insert("id".to_string(), Value::from(row.id));
            flat.insert("order".to_string(), Value::from(row.ord));
            for column in columns {
                let value = match by_position.get(&(row.id, column.id)) {
                    Some(cell) => match column.column_type() {
                        ColumnType::Number => cell
                            .numeric_value
                            .and_then(serde_json::Number::from_f64)
                            .map(Value::Number)
                            .unwrap_or(Value::Null),
                        ColumnType::Text => Value::String(cell.value.clone()),
                    },
                    None => Value::String(String::new()),
                };
                flat.insert(column.id.to_string(), value);
            }
            data.push(flat);
        }

        Ok(data)
    }
}
