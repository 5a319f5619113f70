/// Insert chunk sizes, conservatively sized to stay under the lowest
/// default bind-parameter limit (999 for older SQLite builds).
pub const ROW_INSERT_CHUNK: usize = 400;
pub const CELL_INSERT_CHUNK: usize = 240;

/// Default implementation for a Repository that factors out the SQL shared
/// between Postgres and SQLite.
///
/// Usage:
///
/// The struct has to have certain fields, since this macro relies on them:
///
/// ```ignore
/// pub struct MyRepository {
///     pub executor: sqlx::Pool<sqlx::SqlxDatabaseType>
/// }
///
/// impl MyRepository {
///     pub const MIGRATOR: sqlx::Migrator = sqlx::migrate!("my/migrations");
///     pub fn interpret_error(error: sqlx::Error) -> Error {
///         // Interpret the database-specific error code and turn some sqlx errors
///         // into the Error enum values like UniqueConstraintViolation/FKConstraintViolation
///         // ...
///     }
/// }
///
/// implement_repository!(SqliteRepository)
/// ```
///
/// A generic implementation over any sqlx::Database hits borrow checker
/// errors with `QueryBuilder` (https://github.com/launchbadge/sqlx/issues/1978)
/// and needs a pile of `where` clauses on every query/result type, so the
/// whole implementation lives in a macro that both backends instantiate.
/// All SQL is written in the subset both engines accept ($N placeholders,
/// RETURNING, ON CONFLICT ... DO UPDATE, correlated EXISTS), so there are
/// no per-dialect queries.
#[macro_export]
macro_rules! implement_repository {
    ($repo: ident) => {
#[async_trait]
impl Repository for $repo {
    async fn setup(&self) {
        $repo::MIGRATOR
            .run(&self.executor)
            .await
            .expect("error running migrations");
    }

    // Bases

    async fn create_base(&self, name: &str) -> Result<BaseRecord, Error> {
        let base = sqlx::query_as(
            r#"INSERT INTO base (name) VALUES ($1) RETURNING id, name"#,
        )
        .bind(name)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(base)
    }

    async fn get_base(&self, base_id: BaseId) -> Result<BaseRecord, Error> {
        let base = sqlx::query_as(r#"SELECT id, name FROM base WHERE id = $1"#)
            .bind(base_id)
            .fetch_one(&self.executor)
            .await
            .map_err($repo::interpret_error)?;

        Ok(base)
    }

    async fn list_bases(&self) -> Result<Vec<BaseRecord>, Error> {
        let bases = sqlx::query_as(r#"SELECT id, name FROM base ORDER BY id ASC"#)
            .fetch(&self.executor)
            .try_collect()
            .await
            .map_err($repo::interpret_error)?;

        Ok(bases)
    }

    async fn delete_base(&self, base_id: BaseId) -> Result<(), Error> {
        let mut tx = self.executor.begin().await.map_err($repo::interpret_error)?;

        // Cell -> Row -> view config -> View -> Column -> Table -> Base,
        // so no statement ever orphans a child behind a deleted parent
        sqlx::query(
            r#"DELETE FROM cell WHERE row_id IN
               (SELECT "row".id FROM "row"
                JOIN "table" ON "row".table_id = "table".id
                WHERE "table".base_id = $1)"#,
        )
        .bind(base_id)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        sqlx::query(
            r#"DELETE FROM "row" WHERE table_id IN
               (SELECT id FROM "table" WHERE base_id = $1)"#,
        )
        .bind(base_id)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        sqlx::query(
            r#"DELETE FROM view_sort WHERE view_id IN
               (SELECT "view".id FROM "view"
                JOIN "table" ON "view".table_id = "table".id
                WHERE "table".base_id = $1)"#,
        )
        .bind(base_id)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        sqlx::query(
            r#"DELETE FROM view_filter WHERE view_id IN
               (SELECT "view".id FROM "view"
                JOIN "table" ON "view".table_id = "table".id
                WHERE "table".base_id = $1)"#,
        )
        .bind(base_id)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        sqlx::query(
            r#"DELETE FROM "view" WHERE table_id IN
               (SELECT id FROM "table" WHERE base_id = $1)"#,
        )
        .bind(base_id)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        sqlx::query(
            r#"DELETE FROM "column" WHERE table_id IN
               (SELECT id FROM "table" WHERE base_id = $1)"#,
        )
        .bind(base_id)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM "table" WHERE base_id = $1"#)
            .bind(base_id)
            .execute(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        // RETURNING id + fetch_one to force a row not found error if the
        // base doesn't exist
        sqlx::query(r#"DELETE FROM base WHERE id = $1 RETURNING id"#)
            .bind(base_id)
            .fetch_one(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        tx.commit().await.map_err($repo::interpret_error)?;
        Ok(())
    }

    // Tables

    async fn create_table(
        &self,
        base_id: BaseId,
        name: &str,
    ) -> Result<TableSeed, Error> {
        let mut tx = self.executor.begin().await.map_err($repo::interpret_error)?;

        // The seed columns consume ords 0..n, so the counter starts past them
        let table: TableRecord = sqlx::query_as(
            r#"INSERT INTO "table" (base_id, name, next_column_ord, next_row_ord)
               VALUES ($1, $2, $3, 0) RETURNING id, base_id, name"#,
        )
        .bind(base_id)
        .bind(name)
        .bind(SEED_COLUMNS.len() as i64)
        .fetch_one(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        let mut columns = Vec::with_capacity(SEED_COLUMNS.len());
        for (ord, (column_name, column_type)) in SEED_COLUMNS.iter().enumerate() {
            let column: ColumnRecord = sqlx::query_as(
                r#"INSERT INTO "column" (table_id, name, type, ord, default_value)
                   VALUES ($1, $2, $3, $4, '')
                   RETURNING id, table_id, name, type, ord, default_value"#,
            )
            .bind(table.id)
            .bind(*column_name)
            .bind(column_type.to_string())
            .bind(ord as i64)
            .fetch_one(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;
            columns.push(column);
        }

        let view: ViewRecord = sqlx::query_as(
            r#"INSERT INTO "view" (table_id, name) VALUES ($1, $2)
               RETURNING id, table_id, name"#,
        )
        .bind(table.id)
        .bind(SEED_VIEW_NAME)
        .fetch_one(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        tx.commit().await.map_err($repo::interpret_error)?;

        Ok(TableSeed {
            table,
            columns,
            view,
        })
    }

    async fn get_table(&self, table_id: TableId) -> Result<TableRecord, Error> {
        let table = sqlx::query_as(
            r#"SELECT id, base_id, name FROM "table" WHERE id = $1"#,
        )
        .bind(table_id)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(table)
    }

    async fn list_tables(&self, base_id: BaseId) -> Result<Vec<TableRecord>, Error> {
        let tables = sqlx::query_as(
            r#"SELECT id, base_id, name FROM "table" WHERE base_id = $1 ORDER BY id ASC"#,
        )
        .bind(base_id)
        .fetch(&self.executor)
        .try_collect()
        .await
        .map_err($repo::interpret_error)?;

        Ok(tables)
    }

    async fn rename_table(&self, table_id: TableId, name: &str) -> Result<(), Error> {
        sqlx::query(r#"UPDATE "table" SET name = $1 WHERE id = $2 RETURNING id"#)
            .bind(name)
            .bind(table_id)
            .fetch_one(&self.executor)
            .await
            .map_err($repo::interpret_error)?;
        Ok(())
    }

    async fn delete_table(&self, table_id: TableId) -> Result<(), Error> {
        let mut tx = self.executor.begin().await.map_err($repo::interpret_error)?;

        sqlx::query(
            r#"DELETE FROM cell WHERE row_id IN
               (SELECT id FROM "row" WHERE table_id = $1)"#,
        )
        .bind(table_id)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM "row" WHERE table_id = $1"#)
            .bind(table_id)
            .execute(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        sqlx::query(
            r#"DELETE FROM view_sort WHERE view_id IN
               (SELECT id FROM "view" WHERE table_id = $1)"#,
        )
        .bind(table_id)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        sqlx::query(
            r#"DELETE FROM view_filter WHERE view_id IN
               (SELECT id FROM "view" WHERE table_id = $1)"#,
        )
        .bind(table_id)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM "view" WHERE table_id = $1"#)
            .bind(table_id)
            .execute(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM "column" WHERE table_id = $1"#)
            .bind(table_id)
            .execute(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM "table" WHERE id = $1 RETURNING id"#)
            .bind(table_id)
            .fetch_one(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        tx.commit().await.map_err($repo::interpret_error)?;
        Ok(())
    }

    // Columns

    async fn list_columns(&self, table_id: TableId) -> Result<Vec<ColumnRecord>, Error> {
        let columns = sqlx::query_as(
            r#"SELECT id, table_id, name, type, ord, default_value
               FROM "column" WHERE table_id = $1 ORDER BY ord ASC"#,
        )
        .bind(table_id)
        .fetch(&self.executor)
        .try_collect()
        .await
        .map_err($repo::interpret_error)?;

        Ok(columns)
    }

    async fn get_column(&self, column_id: ColumnId) -> Result<ColumnRecord, Error> {
        let column = sqlx::query_as(
            r#"SELECT id, table_id, name, type, ord, default_value
               FROM "column" WHERE id = $1"#,
        )
        .bind(column_id)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(column)
    }

    async fn create_column(
        &self,
        table_id: TableId,
        name: &str,
        column_type: ColumnType,
        default_value: Option<&str>,
    ) -> Result<ColumnRecord, Error> {
        let mut tx = self.executor.begin().await.map_err($repo::interpret_error)?;

        // Atomically claim the next ord from the per-table counter; also
        // forces a row not found error if the table doesn't exist
        let ord: i64 = sqlx::query(
            r#"UPDATE "table" SET next_column_ord = next_column_ord + 1
               WHERE id = $1 RETURNING next_column_ord - 1 AS ord"#,
        )
        .bind(table_id)
        .fetch_one(&mut *tx)
        .await
        .map_err($repo::interpret_error)?
        .try_get("ord")
        .map_err($repo::interpret_error)?;

        let column: ColumnRecord = sqlx::query_as(
            r#"INSERT INTO "column" (table_id, name, type, ord, default_value)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, table_id, name, type, ord, default_value"#,
        )
        .bind(table_id)
        .bind(name)
        .bind(column_type.to_string())
        .bind(ord)
        .bind(default_value)
        .fetch_one(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        // Backfill one cell per existing row so every (row, column) pair
        // stays populated
        let backfill_value = default_value.unwrap_or("");
        let numeric_value =
            $crate::data_types::derive_numeric(backfill_value, column_type);
        sqlx::query(
            r#"INSERT INTO cell (row_id, column_id, value, numeric_value)
               SELECT id, $1, $2, $3 FROM "row" WHERE table_id = $4"#,
        )
        .bind(column.id)
        .bind(backfill_value)
        .bind(numeric_value)
        .bind(table_id)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        tx.commit().await.map_err($repo::interpret_error)?;
        Ok(column)
    }

    async fn rename_column(&self, column_id: ColumnId, name: &str) -> Result<(), Error> {
        sqlx::query(r#"UPDATE "column" SET name = $1 WHERE id = $2 RETURNING id"#)
            .bind(name)
            .bind(column_id)
            .fetch_one(&self.executor)
            .await
            .map_err($repo::interpret_error)?;
        Ok(())
    }

    async fn delete_column(&self, column_id: ColumnId) -> Result<(), Error> {
        let mut tx = self.executor.begin().await.map_err($repo::interpret_error)?;

        // Saved view configuration referencing the column goes with it
        sqlx::query(r#"DELETE FROM view_sort WHERE column_id = $1"#)
            .bind(column_id)
            .execute(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM view_filter WHERE column_id = $1"#)
            .bind(column_id)
            .execute(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM cell WHERE column_id = $1"#)
            .bind(column_id)
            .execute(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM "column" WHERE id = $1 RETURNING id"#)
            .bind(column_id)
            .fetch_one(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        tx.commit().await.map_err($repo::interpret_error)?;
        Ok(())
    }

    // Rows

    async fn create_rows(
        &self,
        table_id: TableId,
        count: i64,
        policy: RowValuePolicy,
    ) -> Result<Vec<RowRecord>, Error> {
        if count <= 0 {
            return Ok(vec![]);
        }

        let mut tx = self.executor.begin().await.map_err($repo::interpret_error)?;

        // Claim a contiguous ord range from the per-table counter. The
        // row-level lock on the counter serializes concurrent batches, so
        // two batches can never hand out overlapping ords.
        let ord_end: i64 = sqlx::query(
            r#"UPDATE "table" SET next_row_ord = next_row_ord + $1
               WHERE id = $2 RETURNING next_row_ord AS ord_end"#,
        )
        .bind(count)
        .bind(table_id)
        .fetch_one(&mut *tx)
        .await
        .map_err($repo::interpret_error)?
        .try_get("ord_end")
        .map_err($repo::interpret_error)?;
        let ord_start = ord_end - count;

        let ords = (ord_start..ord_end).collect::<Vec<i64>>();
        let mut rows: Vec<RowRecord> = Vec::with_capacity(count as usize);
        for chunk in ords.chunks($crate::repository::default::ROW_INSERT_CHUNK) {
            let mut builder: QueryBuilder<_> =
                QueryBuilder::new(r#"INSERT INTO "row" (table_id, ord) "#);
            builder.push_values(chunk, |mut b, ord| {
                b.push_bind(table_id).push_bind(*ord);
            });
            builder.push(" RETURNING id, table_id, ord");
            let mut inserted: Vec<RowRecord> = builder
                .build_query_as()
                .fetch_all(&mut *tx)
                .await
                .map_err($repo::interpret_error)?;
            rows.append(&mut inserted);
        }

        // Read the column set inside the transaction: a column committed
        // before this point gets cells for the new rows, one committed
        // after backfills them itself
        let columns: Vec<ColumnRecord> = sqlx::query_as(
            r#"SELECT id, table_id, name, type, ord, default_value
               FROM "column" WHERE table_id = $1 ORDER BY ord ASC"#,
        )
        .bind(table_id)
        .fetch_all(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        if !columns.is_empty() {
            // Values are synthesized up front: ThreadRng isn't Send, so it
            // must not live across the insert awaits below
            let cells: Vec<(RowId, ColumnId, String, Option<f64>)> = {
                let mut rng = rand::thread_rng();
                let mut cells = Vec::with_capacity(rows.len() * columns.len());
                for row in &rows {
                    for column in &columns {
                        let column_type = column.column_type();
                        let value = match &policy {
                            RowValuePolicy::Blank => {
                                column.default_value.clone().unwrap_or_default()
                            }
                            RowValuePolicy::Sample => {
                                $crate::sample::sample_value(column_type, &mut rng)
                            }
                            RowValuePolicy::Provided(values) => {
                                values.get(&column.id).cloned().unwrap_or_default()
                            }
                        };
                        let numeric_value =
                            $crate::data_types::derive_numeric(&value, column_type);
                        cells.push((row.id, column.id, value, numeric_value));
                    }
                }
                cells
            };

            for chunk in cells.chunks($crate::repository::default::CELL_INSERT_CHUNK) {
                let mut builder: QueryBuilder<_> = QueryBuilder::new(
                    "INSERT INTO cell (row_id, column_id, value, numeric_value) ",
                );
                builder.push_values(
                    chunk,
                    |mut b, (row_id, column_id, value, numeric_value)| {
                        b.push_bind(*row_id)
                            .push_bind(*column_id)
                            .push_bind(value.clone())
                            .push_bind(*numeric_value);
                    },
                );
                builder
                    .build()
                    .execute(&mut *tx)
                    .await
                    .map_err($repo::interpret_error)?;
            }
        }

        tx.commit().await.map_err($repo::interpret_error)?;
        Ok(rows)
    }

    async fn get_row(&self, row_id: RowId) -> Result<RowRecord, Error> {
        let row = sqlx::query_as(
            r#"SELECT id, table_id, ord FROM "row" WHERE id = $1"#,
        )
        .bind(row_id)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(row)
    }

    async fn list_rows(&self, table_id: TableId) -> Result<Vec<RowRecord>, Error> {
        let rows = sqlx::query_as(
            r#"SELECT id, table_id, ord FROM "row" WHERE table_id = $1 ORDER BY ord ASC"#,
        )
        .bind(table_id)
        .fetch(&self.executor)
        .try_collect()
        .await
        .map_err($repo::interpret_error)?;

        Ok(rows)
    }

    async fn delete_row(&self, row_id: RowId) -> Result<(), Error> {
        let mut tx = self.executor.begin().await.map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM cell WHERE row_id = $1"#)
            .bind(row_id)
            .execute(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM "row" WHERE id = $1 RETURNING id"#)
            .bind(row_id)
            .fetch_one(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        tx.commit().await.map_err($repo::interpret_error)?;
        Ok(())
    }

    async fn fetch_row_page(
        &self,
        table_id: TableId,
        filters: &[FilterCondition],
        search: Option<&str>,
        cursor: Option<RowId>,
        limit: i64,
    ) -> Result<Vec<RowRecord>, Error> {
        let mut builder: QueryBuilder<_> = QueryBuilder::new(
            r#"SELECT id, table_id, ord FROM "row" WHERE table_id = "#,
        );
        builder.push_bind(table_id);

        if let Some(cursor) = cursor {
            builder.push(" AND id > ");
            builder.push_bind(cursor);
        }

        for condition in filters {
            if condition.op.matches_everything(&condition.value) {
                continue;
            }
            builder.push(
                r#" AND EXISTS (SELECT 1 FROM cell WHERE cell.row_id = "row".id AND cell.column_id = "#,
            );
            builder.push_bind(condition.column_id);
            match condition.op {
                FilterOp::Empty => {
                    builder.push(" AND cell.numeric_value IS NULL");
                }
                FilterOp::NotEmpty => {
                    builder.push(" AND cell.numeric_value IS NOT NULL");
                }
                FilterOp::EmptyText => {
                    builder.push(" AND cell.value = ''");
                }
                FilterOp::NotEmptyText => {
                    builder.push(" AND cell.value <> ''");
                }
                FilterOp::IncludesString => {
                    builder.push(" AND LOWER(cell.value) LIKE ");
                    builder.push_bind($crate::filter::like_pattern(&condition.value));
                    builder.push(" ESCAPE '\\'");
                }
                FilterOp::Eq => {
                    builder.push(" AND cell.value = ");
                    builder.push_bind(condition.value.clone());
                }
                // An unparsable bound binds NULL, which compares to nothing
                FilterOp::Gt => {
                    builder.push(" AND cell.numeric_value > ");
                    builder.push_bind($crate::data_types::parse_number(&condition.value));
                }
                FilterOp::Lt => {
                    builder.push(" AND cell.numeric_value < ");
                    builder.push_bind($crate::data_types::parse_number(&condition.value));
                }
            }
            builder.push(")");
        }

        if let Some(term) = search {
            builder.push(
                r#" AND EXISTS (SELECT 1 FROM cell WHERE cell.row_id = "row".id AND LOWER(cell.value) LIKE "#,
            );
            builder.push_bind($crate::filter::like_pattern(term));
            builder.push(" ESCAPE '\\')");
        }

        builder.push(" ORDER BY id ASC LIMIT ");
        builder.push_bind(limit);

        let rows = builder
            .build_query_as()
            .fetch_all(&self.executor)
            .await
            .map_err($repo::interpret_error)?;

        Ok(rows)
    }

    async fn count_rows(
        &self,
        table_id: TableId,
        filters: &[FilterCondition],
    ) -> Result<i64, Error> {
        let mut builder: QueryBuilder<_> = QueryBuilder::new(
            r#"SELECT COUNT(*) AS count FROM "row" WHERE table_id = "#,
        );
        builder.push_bind(table_id);

        for condition in filters {
            if condition.op.matches_everything(&condition.value) {
                continue;
            }
            builder.push(
                r#" AND EXISTS (SELECT 1 FROM cell WHERE cell.row_id = "row".id AND cell.column_id = "#,
            );
            builder.push_bind(condition.column_id);
            match condition.op {
                FilterOp::Empty => {
                    builder.push(" AND cell.numeric_value IS NULL");
                }
                FilterOp::NotEmpty => {
                    builder.push(" AND cell.numeric_value IS NOT NULL");
                }
                FilterOp::EmptyText => {
                    builder.push(" AND cell.value = ''");
                }
                FilterOp::NotEmptyText => {
                    builder.push(" AND cell.value <> ''");
                }
                FilterOp::IncludesString => {
                    builder.push(" AND LOWER(cell.value) LIKE ");
                    builder.push_bind($crate::filter::like_pattern(&condition.value));
                    builder.push(" ESCAPE '\\'");
                }
                FilterOp::Eq => {
                    builder.push(" AND cell.value = ");
                    builder.push_bind(condition.value.clone());
                }
                FilterOp::Gt => {
                    builder.push(" AND cell.numeric_value > ");
                    builder.push_bind($crate::data_types::parse_number(&condition.value));
                }
                FilterOp::Lt => {
                    builder.push(" AND cell.numeric_value < ");
                    builder.push_bind($crate::data_types::parse_number(&condition.value));
                }
            }
            builder.push(")");
        }

        let count = builder
            .build()
            .fetch_one(&self.executor)
            .await
            .map_err($repo::interpret_error)?
            .try_get("count")
            .map_err($repo::interpret_error)?;

        Ok(count)
    }

    async fn count_matching_cells(
        &self,
        table_id: TableId,
        search: &str,
    ) -> Result<i64, Error> {
        let count = sqlx::query(
            r#"SELECT COUNT(*) AS count FROM cell
               JOIN "row" ON cell.row_id = "row".id
               WHERE "row".table_id = $1
               AND LOWER(cell.value) LIKE $2 ESCAPE '\'"#,
        )
        .bind(table_id)
        .bind($crate::filter::like_pattern(search))
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?
        .try_get("count")
        .map_err($repo::interpret_error)?;

        Ok(count)
    }

    // Cells

    async fn get_cell(
        &self,
        row_id: RowId,
        column_id: ColumnId,
    ) -> Result<Option<CellRecord>, Error> {
        let cell = sqlx::query_as(
            r#"SELECT id, row_id, column_id, value, numeric_value
               FROM cell WHERE row_id = $1 AND column_id = $2"#,
        )
        .bind(row_id)
        .bind(column_id)
        .fetch_optional(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(cell)
    }

    async fn upsert_cell(
        &self,
        row_id: RowId,
        column_id: ColumnId,
        value: &str,
        column_type: ColumnType,
    ) -> Result<CellRecord, Error> {
        // The projection is recomputed from the value on every write; the
        // two can never disagree
        let numeric_value = $crate::data_types::derive_numeric(value, column_type);

        // Run the DML to completion before reading the cell back: fetching
        // only the first RETURNING row can leave the conflict-update branch
        // unapplied on SQLite
        let mut tx = self.executor.begin().await.map_err($repo::interpret_error)?;

        sqlx::query(
            r#"INSERT INTO cell (row_id, column_id, value, numeric_value)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (row_id, column_id) DO UPDATE
               SET value = excluded.value, numeric_value = excluded.numeric_value"#,
        )
        .bind(row_id)
        .bind(column_id)
        .bind(value)
        .bind(numeric_value)
        .execute(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        let cell = sqlx::query_as(
            r#"SELECT id, row_id, column_id, value, numeric_value
               FROM cell WHERE row_id = $1 AND column_id = $2"#,
        )
        .bind(row_id)
        .bind(column_id)
        .fetch_one(&mut *tx)
        .await
        .map_err($repo::interpret_error)?;

        tx.commit().await.map_err($repo::interpret_error)?;

        Ok(cell)
    }

    async fn cells_for_rows(&self, row_ids: &[RowId]) -> Result<Vec<CellRecord>, Error> {
        if row_ids.is_empty() {
            return Ok(vec![]);
        }

        let mut builder: QueryBuilder<_> = QueryBuilder::new(
            "SELECT id, row_id, column_id, value, numeric_value FROM cell WHERE row_id IN (",
        );
        let mut separated = builder.separated(", ");
        for row_id in row_ids {
            separated.push_bind(*row_id);
        }
        separated.push_unseparated(")");

        let cells = builder
            .build_query_as()
            .fetch_all(&self.executor)
            .await
            .map_err($repo::interpret_error)?;

        Ok(cells)
    }

    // Views

    async fn create_view(
        &self,
        table_id: TableId,
        name: &str,
    ) -> Result<ViewRecord, Error> {
        let view = sqlx::query_as(
            r#"INSERT INTO "view" (table_id, name) VALUES ($1, $2)
               RETURNING id, table_id, name"#,
        )
        .bind(table_id)
        .bind(name)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(view)
    }

    async fn get_view(&self, view_id: ViewId) -> Result<ViewRecord, Error> {
        let view = sqlx::query_as(
            r#"SELECT id, table_id, name FROM "view" WHERE id = $1"#,
        )
        .bind(view_id)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(view)
    }

    async fn list_views(&self, table_id: TableId) -> Result<Vec<ViewRecord>, Error> {
        let views = sqlx::query_as(
            r#"SELECT id, table_id, name FROM "view" WHERE table_id = $1 ORDER BY id ASC"#,
        )
        .bind(table_id)
        .fetch(&self.executor)
        .try_collect()
        .await
        .map_err($repo::interpret_error)?;

        Ok(views)
    }

    async fn delete_view(&self, view_id: ViewId) -> Result<(), Error> {
        let mut tx = self.executor.begin().await.map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM view_sort WHERE view_id = $1"#)
            .bind(view_id)
            .execute(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM view_filter WHERE view_id = $1"#)
            .bind(view_id)
            .execute(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        sqlx::query(r#"DELETE FROM "view" WHERE id = $1 RETURNING id"#)
            .bind(view_id)
            .fetch_one(&mut *tx)
            .await
            .map_err($repo::interpret_error)?;

        tx.commit().await.map_err($repo::interpret_error)?;
        Ok(())
    }

    // View sorts

    async fn list_view_sorts(
        &self,
        view_id: ViewId,
    ) -> Result<Vec<ViewSortRecord>, Error> {
        let sorts = sqlx::query_as(
            r#"SELECT id, view_id, column_id, descending, position
               FROM view_sort WHERE view_id = $1 ORDER BY position ASC"#,
        )
        .bind(view_id)
        .fetch(&self.executor)
        .try_collect()
        .await
        .map_err($repo::interpret_error)?;

        Ok(sorts)
    }

    async fn get_view_sort(&self, sort_id: ViewSortId) -> Result<ViewSortRecord, Error> {
        let sort = sqlx::query_as(
            r#"SELECT id, view_id, column_id, descending, position
               FROM view_sort WHERE id = $1"#,
        )
        .bind(sort_id)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(sort)
    }

    async fn create_view_sort(
        &self,
        view_id: ViewId,
        column_id: ColumnId,
        descending: bool,
    ) -> Result<ViewSortRecord, Error> {
        // Aggregate subquery computes the next position in the same
        // statement as the insert
        let sort = sqlx::query_as(
            r#"INSERT INTO view_sort (view_id, column_id, descending, position)
               SELECT $1, $2, $3, COALESCE(MAX(position) + 1, 0)
               FROM view_sort WHERE view_id = $4
               RETURNING id, view_id, column_id, descending, position"#,
        )
        .bind(view_id)
        .bind(column_id)
        .bind(descending)
        .bind(view_id)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(sort)
    }

    async fn update_view_sort(
        &self,
        sort_id: ViewSortId,
        column_id: ColumnId,
        descending: bool,
    ) -> Result<ViewSortRecord, Error> {
        let sort = sqlx::query_as(
            r#"UPDATE view_sort SET column_id = $1, descending = $2 WHERE id = $3
               RETURNING id, view_id, column_id, descending, position"#,
        )
        .bind(column_id)
        .bind(descending)
        .bind(sort_id)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(sort)
    }

    async fn delete_view_sort(&self, sort_id: ViewSortId) -> Result<(), Error> {
        sqlx::query(r#"DELETE FROM view_sort WHERE id = $1 RETURNING id"#)
            .bind(sort_id)
            .fetch_one(&self.executor)
            .await
            .map_err($repo::interpret_error)?;
        Ok(())
    }

    // View filters

    async fn list_view_filters(
        &self,
        view_id: ViewId,
    ) -> Result<Vec<ViewFilterRecord>, Error> {
        let filters = sqlx::query_as(
            r#"SELECT id, view_id, column_id, operator, value, logic
               FROM view_filter WHERE view_id = $1 ORDER BY id ASC"#,
        )
        .bind(view_id)
        .fetch(&self.executor)
        .try_collect()
        .await
        .map_err($repo::interpret_error)?;

        Ok(filters)
    }

    async fn get_view_filter(
        &self,
        filter_id: ViewFilterId,
    ) -> Result<ViewFilterRecord, Error> {
        let filter = sqlx::query_as(
            r#"SELECT id, view_id, column_id, operator, value, logic
               FROM view_filter WHERE id = $1"#,
        )
        .bind(filter_id)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(filter)
    }

    async fn create_view_filter(
        &self,
        view_id: ViewId,
        column_id: ColumnId,
        operator: FilterOp,
        value: &str,
        logic: FilterLogic,
    ) -> Result<ViewFilterRecord, Error> {
        let filter = sqlx::query_as(
            r#"INSERT INTO view_filter (view_id, column_id, operator, value, logic)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING id, view_id, column_id, operator, value, logic"#,
        )
        .bind(view_id)
        .bind(column_id)
        .bind(operator.to_string())
        .bind(value)
        .bind(logic.to_string())
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(filter)
    }

    async fn update_view_filter(
        &self,
        filter_id: ViewFilterId,
        column_id: ColumnId,
        operator: FilterOp,
        value: &str,
        logic: FilterLogic,
    ) -> Result<ViewFilterRecord, Error> {
        let filter = sqlx::query_as(
            r#"UPDATE view_filter
               SET column_id = $1, operator = $2, value = $3, logic = $4
               WHERE id = $5
               RETURNING id, view_id, column_id, operator, value, logic"#,
        )
        .bind(column_id)
        .bind(operator.to_string())
        .bind(value)
        .bind(logic.to_string())
        .bind(filter_id)
        .fetch_one(&self.executor)
        .await
        .map_err($repo::interpret_error)?;

        Ok(filter)
    }

    async fn delete_view_filter(&self, filter_id: ViewFilterId) -> Result<(), Error> {
        sqlx::query(r#"DELETE FROM view_filter WHERE id = $1 RETURNING id"#)
            .bind(filter_id)
            .fetch_one(&self.executor)
            .await
            .map_err($repo::interpret_error)?;
        Ok(())
    }
}

};
}
