use std::collections::HashMap;
use std::collections::HashSet;

use gridbase::context::query::GridQuery;
use gridbase::data_types::ColumnType;
use gridbase::error::GridError;

use super::fixtures::{insert_row, make_table, test_grid};

#[tokio::test]
async fn test_cell_value_round_trip() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "cells").await;
    let row = insert_row(&grid.context, &seed, "Ada", "1").await;
    let column_id = seed.columns[1].id;

    let cell = grid
        .context
        .update_cell(row.id, column_id, "42")
        .await
        .unwrap();
    assert_eq!(cell.value, "42");
    assert_eq!(cell.numeric_value, Some(42.0));

    // Overwriting the same cell must stick, not just echo the new value
    let cell = grid
        .context
        .update_cell(row.id, column_id, "abc")
        .await
        .unwrap();
    assert_eq!(cell.value, "abc");
    assert_eq!(cell.numeric_value, None);

    let query = GridQuery::new(seed.table.id);
    let page = grid.context.get_data(&query).await.unwrap();
    assert_eq!(page.data[0][&column_id.to_string()], serde_json::Value::Null);
}

#[tokio::test]
async fn test_new_column_backfills_existing_rows() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "backfill").await;
    for i in 0..3 {
        insert_row(&grid.context, &seed, &format!("row {i}"), "0").await;
    }

    let column = grid
        .context
        .add_field(seed.table.id, Some("Age"), ColumnType::Number, Some("7"))
        .await
        .unwrap();

    let query = GridQuery::new(seed.table.id);
    let page = grid.context.get_data(&query).await.unwrap();
    assert_eq!(page.data.len(), 3);
    for row in &page.data {
        assert_eq!(row[&column.id.to_string()], serde_json::Value::from(7.0));
    }
}

#[tokio::test]
async fn test_bulk_add_produces_complete_rows() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "bulk").await;

    let rows = grid.context.add_rows(seed.table.id, 50).await.unwrap();
    let ords = rows.iter().map(|r| r.ord).collect::<Vec<_>>();
    assert_eq!(ords, (0..50).collect::<Vec<_>>());

    let mut query = GridQuery::new(seed.table.id);
    query.page_size = 100;
    let page = grid.context.get_data(&query).await.unwrap();
    assert_eq!(page.data.len(), 50);

    for row in &page.data {
        let name = row[&seed.columns[0].id.to_string()].as_str().unwrap();
        assert!(!name.is_empty());
        assert!(row[&seed.columns[1].id.to_string()].as_f64().is_some());
    }
}

#[tokio::test]
async fn test_concurrent_bulk_adds_get_disjoint_orders() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "concurrent").await;

    let (a, b) = tokio::join!(
        grid.context.add_rows(seed.table.id, 100),
        grid.context.add_rows(seed.table.id, 100),
    );

    let ords = a
        .unwrap()
        .into_iter()
        .chain(b.unwrap())
        .map(|r| r.ord)
        .collect::<HashSet<_>>();

    assert_eq!(ords.len(), 200);
    assert_eq!(ords.iter().min(), Some(&0));
    assert_eq!(ords.iter().max(), Some(&199));
}

#[tokio::test]
async fn test_cell_write_across_tables_is_rejected() {
    let grid = test_grid().await;
    let base = grid.context.create_base("two-tables").await.unwrap();
    let first = grid.context.add_table(base.id, "first").await.unwrap();
    let second = grid.context.add_table(base.id, "second").await.unwrap();

    let row = grid
        .context
        .add_single_row(first.table.id, None)
        .await
        .unwrap();

    let err = grid
        .context
        .update_cell(row.id, second.columns[0].id, "x")
        .await
        .unwrap_err();
    assert!(matches!(err, GridError::CellTableMismatch { .. }));
}

#[tokio::test]
async fn test_input_validation() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "validation").await;

    assert!(matches!(
        grid.context.create_base("  ").await.unwrap_err(),
        GridError::InvalidInput { .. }
    ));
    assert!(matches!(
        grid.context.create_base("validation").await.unwrap_err(),
        GridError::BaseAlreadyExists { .. }
    ));
    assert!(matches!(
        grid.context
            .rename_column(seed.columns[0].id, "")
            .await
            .unwrap_err(),
        GridError::InvalidInput { .. }
    ));
    assert!(matches!(
        grid.context.add_rows(seed.table.id, 0).await.unwrap_err(),
        GridError::InvalidInput { .. }
    ));
    assert!(matches!(
        grid.context.delete_row(-1).await.unwrap_err(),
        GridError::RowDoesNotExist { id: -1 }
    ));
    assert!(matches!(
        grid.context.delete_table(-1).await.unwrap_err(),
        GridError::TableDoesNotExist { id: -1 }
    ));
}

#[tokio::test]
async fn test_unnamed_column_gets_default_name() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "untitled").await;

    let column = grid
        .context
        .add_field(seed.table.id, None, ColumnType::Text, None)
        .await
        .unwrap();
    assert_eq!(column.name, "Untitled Column");
    assert_eq!(column.ord, 2);
}

#[tokio::test]
async fn test_view_configuration_requires_matching_table() {
    let grid = test_grid().await;
    let base = grid.context.create_base("view-checks").await.unwrap();
    let first = grid.context.add_table(base.id, "first").await.unwrap();
    let second = grid.context.add_table(base.id, "second").await.unwrap();

    let err = grid
        .context
        .add_view_sort(first.view.id, second.columns[0].id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, GridError::InvalidInput { .. }));

    let sorts = grid.context.list_view_sorts(first.view.id).await.unwrap();
    assert!(sorts.is_empty());
}

#[tokio::test]
async fn test_single_row_with_partial_values() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "partial").await;

    let values = HashMap::from([(seed.columns[0].id, "only name".to_string())]);
    let row = grid
        .context
        .add_single_row(seed.table.id, Some(values))
        .await
        .unwrap();

    let query = GridQuery::new(seed.table.id);
    let page = grid.context.get_data(&query).await.unwrap();
    assert_eq!(page.data[0]["id"], serde_json::Value::from(row.id));
    assert_eq!(
        page.data[0][&seed.columns[0].id.to_string()],
        serde_json::Value::from("only name")
    );
}
