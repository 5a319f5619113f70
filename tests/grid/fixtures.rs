use std::collections::HashMap;

use gridbase::config::context::build_context;
use gridbase::config::schema::load_config_from_string;
use gridbase::context::GridContext;
use gridbase::repository::interface::{RowRecord, TableSeed};
use tempfile::NamedTempFile;

/// A context backed by a throwaway file-based SQLite store. The temp file
/// must outlive the context, so it rides along.
pub struct TestGrid {
    pub context: GridContext,
    _db_file: NamedTempFile,
}

pub async fn test_grid() -> TestGrid {
    let db_file = NamedTempFile::new().expect("create db file");
    let config = load_config_from_string(&format!(
        "[store]\ntype = \"sqlite\"\ndsn = \"{}\"",
        db_file.path().display()
    ))
    .expect("parse config");

    let context = build_context(&config).await.expect("build context");

    TestGrid {
        context,
        _db_file: db_file,
    }
}

/// Create a base and a table in it, returning the table's seed (the seed
/// columns are "Name" (text) and "Value" (number), plus a default view).
pub async fn make_table(context: &GridContext, base_name: &str) -> TableSeed {
    let base = context.create_base(base_name).await.expect("create base");
    context
        .add_table(base.id, "testtable")
        .await
        .expect("create table")
}

/// Insert one row with the given values in the two seed columns.
pub async fn insert_row(
    context: &GridContext,
    seed: &TableSeed,
    name: &str,
    value: &str,
) -> RowRecord {
    let values = HashMap::from([
        (seed.columns[0].id, name.to_string()),
        (seed.columns[1].id, value.to_string()),
    ]);

    context
        .add_single_row(seed.table.id, Some(values))
        .await
        .expect("insert row")
}
