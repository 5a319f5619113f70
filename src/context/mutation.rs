use std::collections::HashMap;

use tracing::{debug, info};

use crate::context::GridContext;
use crate::data_types::{
    BaseId, ColumnId, ColumnType, RowId, RowValuePolicy, TableId,
};
use crate::error::{GridError, GridResult};
use crate::repository::interface::{
    BaseRecord, CellRecord, ColumnRecord, Error as RepositoryError, RowRecord,
    TableSeed,
};

/// Default name for a column created without one.
const UNTITLED_COLUMN: &str = "Untitled Column";

/// Upper bound on a single bulk row insertion.
pub const MAX_BULK_ROWS: i64 = 50_000;

fn validate_name(name: &str, what: &str) -> GridResult<()> {
    if name.trim().is_empty() {
        return Err(GridError::InvalidInput {
            reason: format!("{what} name cannot be empty"),
        });
    }
    Ok(())
}

impl GridContext {
    // Bases

    pub async fn create_base(&self, name: &str) -> GridResult<BaseRecord> {
        validate_name(name, "Base")?;

        let base = self.repository.create_base(name).await.map_err(|e| match e {
            RepositoryError::UniqueConstraintViolation(_) => GridError::BaseAlreadyExists {
                name: name.to_string(),
            },
            e => e.into(),
        })?;

        info!(base_id = base.id, name, "created base");
        Ok(base)
    }

    pub async fn list_bases(&self) -> GridResult<Vec<BaseRecord>> {
        Ok(self.repository.list_bases().await?)
    }

    pub async fn delete_base(&self, base_id: BaseId) -> GridResult<()> {
        self.repository.delete_base(base_id).await.map_err(|e| match e {
            RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                GridError::BaseDoesNotExist { id: base_id }
            }
            e => e.into(),
        })?;

        info!(base_id, "deleted base");
        Ok(())
    }

    // Tables

    /// Create a table with its seed columns and default view.
    pub async fn add_table(&self, base_id: BaseId, name: &str) -> GridResult<TableSeed> {
        validate_name(name, "Table")?;

        let seed = self
            .repository
            .create_table(base_id, name)
            .await
            .map_err(|e| match e {
                RepositoryError::FKConstraintViolation(_) => {
                    GridError::BaseDoesNotExist { id: base_id }
                }
                e => e.into(),
            })?;

        info!(table_id = seed.table.id, base_id, name, "created table");
        Ok(seed)
    }

    pub async fn update_table_name(
        &self,
        table_id: TableId,
        name: &str,
    ) -> GridResult<()> {
        validate_name(name, "Table")?;

        self.repository
            .rename_table(table_id, name)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::TableDoesNotExist { id: table_id }
                }
                e => e.into(),
            })?;
        Ok(())
    }

    pub async fn delete_table(&self, table_id: TableId) -> GridResult<()> {
        self.repository
            .delete_table(table_id)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::TableDoesNotExist { id: table_id }
                }
                e => e.into(),
            })?;

        info!(table_id, "deleted table");
        Ok(())
    }

    // Columns

    /// Add a column to a table. Every existing row gets a cell for it
    /// holding the default value, so the grid stays rectangular.
    pub async fn add_field(
        &self,
        table_id: TableId,
        name: Option<&str>,
        column_type: ColumnType,
        default_value: Option<&str>,
    ) -> GridResult<ColumnRecord> {
        let name = match name {
            Some(name) => {
                validate_name(name, "Column")?;
                name
            }
            None => UNTITLED_COLUMN,
        };

        let column = self
            .repository
            .create_column(table_id, name, column_type, default_value)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::TableDoesNotExist { id: table_id }
                }
                e => e.into(),
            })?;

        debug!(column_id = column.id, table_id, name, "created column");
        Ok(column)
    }

    pub async fn rename_column(
        &self,
        column_id: ColumnId,
        name: &str,
    ) -> GridResult<()> {
        validate_name(name, "Column")?;

        self.repository
            .rename_column(column_id, name)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::ColumnDoesNotExist { id: column_id }
                }
                e => e.into(),
            })?;
        Ok(())
    }

    pub async fn delete_column(&self, column_id: ColumnId) -> GridResult<()> {
        self.repository
            .delete_column(column_id)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::ColumnDoesNotExist { id: column_id }
                }
                e => e.into(),
            })?;

        info!(column_id, "deleted column");
        Ok(())
    }

    // Rows

    /// Bulk-insert rows populated with generated sample values. The whole
    /// batch commits atomically and receives a contiguous order range even
    /// under concurrent callers.
    pub async fn add_rows(
        &self,
        table_id: TableId,
        count: i64,
    ) -> GridResult<Vec<RowRecord>> {
        if count < 1 || count > MAX_BULK_ROWS {
            return Err(GridError::InvalidInput {
                reason: format!("row count must be between 1 and {MAX_BULK_ROWS}"),
            });
        }

        let rows = self
            .repository
            .create_rows(table_id, count, RowValuePolicy::Sample)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::TableDoesNotExist { id: table_id }
                }
                e => e.into(),
            })?;

        info!(table_id, count, "created rows");
        Ok(rows)
    }

    /// Insert a single row. With `values`, each known column gets the
    /// provided value; otherwise cells hold the column defaults.
    pub async fn add_single_row(
        &self,
        table_id: TableId,
        values: Option<HashMap<ColumnId, String>>,
    ) -> GridResult<RowRecord> {
        let policy = match values {
            Some(values) => RowValuePolicy::Provided(values),
            None => RowValuePolicy::Blank,
        };

        let mut rows = self
            .repository
            .create_rows(table_id, 1, policy)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::TableDoesNotExist { id: table_id }
                }
                e => e.into(),
            })?;

        // create_rows(_, 1, _) returns exactly one row
        rows.pop().ok_or(GridError::TableDoesNotExist { id: table_id })
    }

    pub async fn delete_row(&self, row_id: RowId) -> GridResult<()> {
        self.repository.delete_row(row_id).await.map_err(|e| match e {
            RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                GridError::RowDoesNotExist { id: row_id }
            }
            e => e.into(),
        })?;

        debug!(row_id, "deleted row");
        Ok(())
    }

    // Cells

    /// Write a cell value. The numeric projection is recomputed from the
    /// owning column's type as part of the same write.
    pub async fn update_cell(
        &self,
        row_id: RowId,
        column_id: ColumnId,
        value: &str,
    ) -> GridResult<CellRecord> {
        let row = self.repository.get_row(row_id).await.map_err(|e| match e {
            RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                GridError::RowDoesNotExist { id: row_id }
            }
            e => e.into(),
        })?;

        let column = self
            .repository
            .get_column(column_id)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::ColumnDoesNotExist { id: column_id }
                }
                e => e.into(),
            })?;

        if row.table_id != column.table_id {
            return Err(GridError::CellTableMismatch { row_id, column_id });
        }

        let cell = self
            .repository
            .upsert_cell(row_id, column_id, value, column.column_type())
            .await?;

        debug!(row_id, column_id, "updated cell");
        Ok(cell)
    }
}
