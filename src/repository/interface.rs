use std::fmt::Debug;
use std::str::FromStr;

use async_trait::async_trait;

use crate::data_types::{
    BaseId, CellId, ColumnId, ColumnType, RowId, RowValuePolicy, TableId, ViewFilterId,
    ViewId, ViewSortId,
};
use crate::filter::{FilterCondition, FilterLogic, FilterOp};

/// Columns seeded into every newly created table.
pub const SEED_COLUMNS: &[(&str, ColumnType)] =
    &[("Name", ColumnType::Text), ("Value", ColumnType::Number)];

/// Name of the view seeded into every newly created table.
pub const SEED_VIEW_NAME: &str = "Grid view";

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct BaseRecord {
    pub id: BaseId,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct TableRecord {
    pub id: TableId,
    pub base_id: BaseId,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct ColumnRecord {
    pub id: ColumnId,
    pub table_id: TableId,
    pub name: String,
    pub r#type: String,
    pub ord: i64,
    pub default_value: Option<String>,
}

impl ColumnRecord {
    /// The declared type; unrecognized stored strings degrade to text.
    pub fn column_type(&self) -> ColumnType {
        ColumnType::from_str(&self.r#type).unwrap_or_default()
    }
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct RowRecord {
    pub id: RowId,
    pub table_id: TableId,
    pub ord: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq)]
pub struct CellRecord {
    pub id: CellId,
    pub row_id: RowId,
    pub column_id: ColumnId,
    pub value: String,
    pub numeric_value: Option<f64>,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct ViewRecord {
    pub id: ViewId,
    pub table_id: TableId,
    pub name: String,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct ViewSortRecord {
    pub id: ViewSortId,
    pub view_id: ViewId,
    pub column_id: ColumnId,
    pub descending: bool,
    pub position: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct ViewFilterRecord {
    pub id: ViewFilterId,
    pub view_id: ViewId,
    pub column_id: ColumnId,
    pub operator: String,
    pub value: String,
    pub logic: String,
}

/// A newly created table together with its seed columns and seed view,
/// all created in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSeed {
    pub table: TableRecord,
    pub columns: Vec<ColumnRecord>,
    pub view: ViewRecord,
}

/// Wrapper for conversion of database-specific error codes into actual errors
#[derive(Debug)]
pub enum Error {
    UniqueConstraintViolation(sqlx::Error),
    FKConstraintViolation(sqlx::Error),

    // All other errors
    SqlxError(sqlx::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Storage interface for the grid engine. Multi-step operations
/// (`create_table`, `create_column`, `create_rows`, the cascading deletes)
/// execute inside a single transaction so callers never observe a
/// partially-applied mutation.
#[async_trait]
pub trait Repository: Send + Sync + Debug {
    async fn setup(&self);

    // Bases
    async fn create_base(&self, name: &str) -> Result<BaseRecord, Error>;

    async fn get_base(&self, base_id: BaseId) -> Result<BaseRecord, Error>;

    async fn list_bases(&self) -> Result<Vec<BaseRecord>, Error>;

    async fn delete_base(&self, base_id: BaseId) -> Result<(), Error>;

    // Tables
    async fn create_table(&self, base_id: BaseId, name: &str)
        -> Result<TableSeed, Error>;

    async fn get_table(&self, table_id: TableId) -> Result<TableRecord, Error>;

    async fn list_tables(&self, base_id: BaseId) -> Result<Vec<TableRecord>, Error>;

    async fn rename_table(&self, table_id: TableId, name: &str) -> Result<(), Error>;

    async fn delete_table(&self, table_id: TableId) -> Result<(), Error>;

    // Columns
    async fn list_columns(&self, table_id: TableId) -> Result<Vec<ColumnRecord>, Error>;

    async fn get_column(&self, column_id: ColumnId) -> Result<ColumnRecord, Error>;

    async fn create_column(
        &self,
        table_id: TableId,
        name: &str,
        column_type: ColumnType,
        default_value: Option<&str>,
    ) -> Result<ColumnRecord, Error>;

    async fn rename_column(&self, column_id: ColumnId, name: &str) -> Result<(), Error>;

    async fn delete_column(&self, column_id: ColumnId) -> Result<(), Error>;

    // Rows
    async fn create_rows(
        &self,
        table_id: TableId,
        count: i64,
        policy: RowValuePolicy,
    ) -> Result<Vec<RowRecord>, Error>;

    async fn get_row(&self, row_id: RowId) -> Result<RowRecord, Error>;

    async fn list_rows(&self, table_id: TableId) -> Result<Vec<RowRecord>, Error>;

    async fn delete_row(&self, row_id: RowId) -> Result<(), Error>;

    /// Fetch up to `limit` rows matching the compiled filter/search
    /// predicate, ordered by row id, seeking past `cursor`.
    async fn fetch_row_page(
        &self,
        table_id: TableId,
        filters: &[FilterCondition],
        search: Option<&str>,
        cursor: Option<RowId>,
        limit: i64,
    ) -> Result<Vec<RowRecord>, Error>;

    async fn count_rows(
        &self,
        table_id: TableId,
        filters: &[FilterCondition],
    ) -> Result<i64, Error>;

    async fn count_matching_cells(
        &self,
        table_id: TableId,
        search: &str,
    ) -> Result<i64, Error>;

    // Cells
    async fn get_cell(
        &self,
        row_id: RowId,
        column_id: ColumnId,
    ) -> Result<Option<CellRecord>, Error>;

    async fn upsert_cell(
        &self,
        row_id: RowId,
        column_id: ColumnId,
        value: &str,
        column_type: ColumnType,
    ) -> Result<CellRecord, Error>;

    async fn cells_for_rows(&self, row_ids: &[RowId]) -> Result<Vec<CellRecord>, Error>;

    // Views
    async fn create_view(&self, table_id: TableId, name: &str)
        -> Result<ViewRecord, Error>;

    async fn get_view(&self, view_id: ViewId) -> Result<ViewRecord, Error>;

    async fn list_views(&self, table_id: TableId) -> Result<Vec<ViewRecord>, Error>;

    async fn delete_view(&self, view_id: ViewId) -> Result<(), Error>;

    // View sorts
    async fn list_view_sorts(&self, view_id: ViewId)
        -> Result<Vec<ViewSortRecord>, Error>;

    async fn get_view_sort(&self, sort_id: ViewSortId) -> Result<ViewSortRecord, Error>;

    async fn create_view_sort(
        &self,
        view_id: ViewId,
        column_id: ColumnId,
        descending: bool,
    ) -> Result<ViewSortRecord, Error>;

    async fn update_view_sort(
        &self,
        sort_id: ViewSortId,
        column_id: ColumnId,
        descending: bool,
    ) -> Result<ViewSortRecord, Error>;

    async fn delete_view_sort(&self, sort_id: ViewSortId) -> Result<(), Error>;

    // View filters
    async fn list_view_filters(
        &self,
        view_id: ViewId,
    ) -> Result<Vec<ViewFilterRecord>, Error>;

    async fn get_view_filter(
        &self,
        filter_id: ViewFilterId,
    ) -> Result<ViewFilterRecord, Error>;

    async fn create_view_filter(
        &self,
        view_id: ViewId,
        column_id: ColumnId,
        operator: FilterOp,
        value: &str,
        logic: FilterLogic,
    ) -> Result<ViewFilterRecord, Error>;

    async fn update_view_filter(
        &self,
        filter_id: ViewFilterId,
        column_id: ColumnId,
        operator: FilterOp,
        value: &str,
        logic: FilterLogic,
    ) -> Result<ViewFilterRecord, Error>;

    async fn delete_view_filter(&self, filter_id: ViewFilterId) -> Result<(), Error>;
}
