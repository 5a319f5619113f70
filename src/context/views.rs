use tracing::info;

use crate::context::GridContext;
use crate::data_types::{ColumnId, TableId, ViewFilterId, ViewId, ViewSortId};
use crate::error::{GridError, GridResult};
use crate::filter::{FilterLogic, FilterOp};
use crate::repository::interface::{
    Error as RepositoryError, ViewFilterRecord, ViewRecord, ViewSortRecord,
};

impl GridContext {
    pub async fn create_view(
        &self,
        table_id: TableId,
        name: &str,
    ) -> GridResult<ViewRecord> {
        if name.trim().is_empty() {
            return Err(GridError::InvalidInput {
                reason: "View name cannot be empty".to_string(),
            });
        }

        let view = self
            .repository
            .create_view(table_id, name)
            .await
            .map_err(|e| match e {
                RepositoryError::FKConstraintViolation(_) => {
                    GridError::TableDoesNotExist { id: table_id }
                }
                e => e.into(),
            })?;

        info!(view_id = view.id, table_id, name, "created view");
        Ok(view)
    }

    pub async fn get_view(&self, view_id: ViewId) -> GridResult<ViewRecord> {
        self.repository.get_view(view_id).await.map_err(|e| match e {
            RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                GridError::ViewDoesNotExist { id: view_id }
            }
            e => e.into(),
        })
    }

    pub async fn list_views(&self, table_id: TableId) -> GridResult<Vec<ViewRecord>> {
        Ok(self.repository.list_views(table_id).await?)
    }

    pub async fn delete_view(&self, view_id: ViewId) -> GridResult<()> {
        self.repository.delete_view(view_id).await.map_err(|e| match e {
            RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                GridError::ViewDoesNotExist { id: view_id }
            }
            e => e.into(),
        })?;

        info!(view_id, "deleted view");
        Ok(())
    }

    /// Check that a column belongs to the view's table before saving it
    /// into the view configuration.
    async fn check_view_column(
        &self,
        view_id: ViewId,
        column_id: ColumnId,
    ) -> GridResult<()> {
        let view = self.get_view(view_id).await?;
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

        if column.table_id != view.table_id {
            return Err(GridError::InvalidInput {
                reason: format!(
                    "column {column_id} does not belong to the table of view {view_id}"
                ),
            });
        }
        Ok(())
    }

    // Sorts

    pub async fn list_view_sorts(
        &self,
        view_id: ViewId,
    ) -> GridResult<Vec<ViewSortRecord>> {
        self.get_view(view_id).await?;
        Ok(self.repository.list_view_sorts(view_id).await?)
    }

    /// Append a sort key to a view. New keys go to the end of the list:
    /// earlier keys take precedence when comparing rows.
    pub async fn add_view_sort(
        &self,
        view_id: ViewId,
        column_id: ColumnId,
        descending: bool,
    ) -> GridResult<ViewSortRecord> {
        self.check_view_column(view_id, column_id).await?;

        Ok(self
            .repository
            .create_view_sort(view_id, column_id, descending)
            .await?)
    }

    /// Repoint or flip an existing sort key; its position in the list is
    /// preserved.
    pub async fn update_view_sort(
        &self,
        sort_id: ViewSortId,
        column_id: ColumnId,
        descending: bool,
    ) -> GridResult<ViewSortRecord> {
        let current = self
            .repository
            .get_view_sort(sort_id)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::ViewSortDoesNotExist { id: sort_id }
                }
                e => e.into(),
            })?;
        self.check_view_column(current.view_id, column_id).await?;

        let sort = self
            .repository
            .update_view_sort(sort_id, column_id, descending)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::ViewSortDoesNotExist { id: sort_id }
                }
                e => e.into(),
            })?;
        Ok(sort)
    }

    pub async fn delete_view_sort(&self, sort_id: ViewSortId) -> GridResult<()> {
        self.repository
            .delete_view_sort(sort_id)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::ViewSortDoesNotExist { id: sort_id }
                }
                e => e.into(),
            })?;
        Ok(())
    }

    // Filters

    pub async fn list_view_filters(
        &self,
        view_id: ViewId,
    ) -> GridResult<Vec<ViewFilterRecord>> {
        self.get_view(view_id).await?;
        Ok(self.repository.list_view_filters(view_id).await?)
    }

    pub async fn add_view_filter(
        &self,
        view_id: ViewId,
        column_id: ColumnId,
        operator: FilterOp,
        value: &str,
        logic: FilterLogic,
    ) -> GridResult<ViewFilterRecord> {
        self.check_view_column(view_id, column_id).await?;

        Ok(self
            .repository
            .create_view_filter(view_id, column_id, operator, value, logic)
            .await?)
    }

    pub async fn update_view_filter(
        &self,
        filter_id: ViewFilterId,
        column_id: ColumnId,
        operator: FilterOp,
        value: &str,
        logic: FilterLogic,
    ) -> GridResult<ViewFilterRecord> {
        let current = self
            .repository
            .get_view_filter(filter_id)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::ViewFilterDoesNotExist { id: filter_id }
                }
                e => e.into(),
            })?;
        self.check_view_column(current.view_id, column_id).await?;

        let filter = self
            .repository
            .update_view_filter(filter_id, column_id, operator, value, logic)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::ViewFilterDoesNotExist { id: filter_id }
                }
                e => e.into(),
            })?;
        Ok(filter)
    }

    pub async fn delete_view_filter(&self, filter_id: ViewFilterId) -> GridResult<()> {
        self.repository
            .delete_view_filter(filter_id)
            .await
            .map_err(|e| match e {
                RepositoryError::SqlxError(sqlx::Error::RowNotFound) => {
                    GridError::ViewFilterDoesNotExist { id: filter_id }
                }
                e => e.into(),
            })?;
        Ok(())
    }
}
