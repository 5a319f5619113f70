use crate::data_types::{BaseId, ColumnId, RowId, TableId, ViewFilterId, ViewId, ViewSortId};
use crate::repository::interface::Error as RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    // NotFound class
    #[error("Base with id {id} doesn't exist")]
    BaseDoesNotExist { id: BaseId },

    #[error("Table with id {id} doesn't exist")]
    TableDoesNotExist { id: TableId },

    #[error("Column with id {id} doesn't exist")]
    ColumnDoesNotExist { id: ColumnId },

    #[error("Row with id {id} doesn't exist")]
    RowDoesNotExist { id: RowId },

    #[error("View with id {id} doesn't exist")]
    ViewDoesNotExist { id: ViewId },

    #[error("View sort with id {id} doesn't exist")]
    ViewSortDoesNotExist { id: ViewSortId },

    #[error("View filter with id {id} doesn't exist")]
    ViewFilterDoesNotExist { id: ViewFilterId },

    // Validation
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    // Constraint violations
    #[error("Base {name:?} already exists")]
    BaseAlreadyExists { name: String },

    #[error("Row {row_id} and column {column_id} belong to different tables")]
    CellTableMismatch { row_id: RowId, column_id: ColumnId },

    // Transaction/storage failures. sqlx rolls the transaction back when it
    // is dropped without a commit, so a failed multi-step mutation surfaces
    // here as a single aggregate error with no partial state visible.
    #[error("Internal SQL error: {0:?}")]
    SqlxError(sqlx::Error),
}

/// Fallback conversion for repository errors that the call site doesn't
/// map to a more specific variant.
impl From<RepositoryError> for GridError {
    fn from(err: RepositoryError) -> GridError {
        GridError::SqlxError(match err {
            RepositoryError::UniqueConstraintViolation(e) => e,
            RepositoryError::FKConstraintViolation(e) => e,
            RepositoryError::SqlxError(e) => e,
        })
    }
}

pub type GridResult<T, E = GridError> = Result<T, E>;
