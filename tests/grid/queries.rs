use std::collections::HashSet;

use gridbase::context::query::GridQuery;
use gridbase::data_types::ColumnType;
use gridbase::error::GridError;
use gridbase::filter::{FilterCondition, FilterLogic, FilterOp};
use gridbase::sort::SortKey;
use serde_json::Value;

use super::fixtures::{insert_row, make_table, test_grid};

#[tokio::test]
async fn test_gt_filter_excludes_unparsable_values() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "filters").await;

    insert_row(&grid.context, &seed, "Alice", "30").await;
    insert_row(&grid.context, &seed, "Bob", "abc").await;
    insert_row(&grid.context, &seed, "carol", "25").await;

    let mut query = GridQuery::new(seed.table.id);
    query.filters = Some(vec![FilterCondition::new(
        seed.columns[1].id,
        FilterOp::Gt,
        "20",
    )]);

    let page = grid.context.get_data(&query).await.unwrap();
    let names = page
        .data
        .iter()
        .map(|row| row[&seed.columns[0].id.to_string()].as_str().unwrap())
        .collect::<Vec<_>>();

    // "abc" has no numeric projection, so Gt can't match it
    assert_eq!(names, vec!["Alice", "carol"]);
    assert_eq!(grid.context.total_rows(&query).await.unwrap(), 2);
}

#[tokio::test]
async fn test_descending_numeric_sort_puts_nulls_last() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "sorts").await;

    insert_row(&grid.context, &seed, "a", "25").await;
    insert_row(&grid.context, &seed, "b", "not a number").await;
    insert_row(&grid.context, &seed, "c", "30").await;

    let mut query = GridQuery::new(seed.table.id);
    query.sorts = Some(vec![SortKey::desc(seed.columns[1].id)]);

    let page = grid.context.get_data(&query).await.unwrap();
    let values = page
        .data
        .iter()
        .map(|row| row[&seed.columns[1].id.to_string()].clone())
        .collect::<Vec<_>>();

    assert_eq!(
        values,
        vec![Value::from(30.0), Value::from(25.0), Value::Null]
    );
}

#[tokio::test]
async fn test_pagination_walks_the_table_exactly_once() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "pages").await;
    grid.context.add_rows(seed.table.id, 25).await.unwrap();

    let mut seen = HashSet::new();
    let mut page_sizes = Vec::new();
    let mut cursor = None;

    loop {
        let mut query = GridQuery::new(seed.table.id);
        query.cursor = cursor;
        let page = grid.context.get_data(&query).await.unwrap();

        page_sizes.push(page.data.len());
        for row in &page.data {
            // Pages must be disjoint
            assert!(seen.insert(row["id"].as_i64().unwrap()));
        }

        if !page.has_next_page {
            assert_eq!(page.next_cursor, None);
            break;
        }
        assert!(page.next_cursor.is_some());
        cursor = page.next_cursor;
    }

    assert_eq!(page_sizes, vec![10, 10, 5]);
    assert_eq!(seen.len(), 25);
}

#[tokio::test]
async fn test_filtered_count_matches_paged_total() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "counts").await;

    for i in 0..23 {
        insert_row(&grid.context, &seed, &format!("row {i}"), &i.to_string()).await;
    }

    let mut query = GridQuery::new(seed.table.id);
    query.filters = Some(vec![FilterCondition::new(
        seed.columns[1].id,
        FilterOp::Lt,
        "17",
    )]);
    query.page_size = 5;

    assert_eq!(grid.context.total_rows(&query).await.unwrap(), 17);

    let mut fetched = 0;
    loop {
        let page = grid.context.get_data(&query).await.unwrap();
        fetched += page.data.len();
        if !page.has_next_page {
            break;
        }
        query.cursor = page.next_cursor;
    }
    assert_eq!(fetched, 17);
}

#[tokio::test]
async fn test_search_is_case_insensitive_and_counts_cells() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "search").await;

    insert_row(&grid.context, &seed, "Alice", "1").await;
    insert_row(&grid.context, &seed, "alicia", "2").await;
    insert_row(&grid.context, &seed, "Bob", "3").await;

    let mut query = GridQuery::new(seed.table.id);
    query.search = Some("ALI".to_string());

    let page = grid.context.get_data(&query).await.unwrap();
    assert_eq!(page.data.len(), 2);

    // "Alice" and "alicia" each contribute one matching cell
    assert_eq!(
        grid.context.total_matches(seed.table.id, "ALI").await.unwrap(),
        2
    );
}

#[tokio::test]
async fn test_view_saved_configuration_applies() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "views").await;

    insert_row(&grid.context, &seed, "a", "25").await;
    insert_row(&grid.context, &seed, "b", "5").await;
    insert_row(&grid.context, &seed, "c", "30").await;

    grid.context
        .add_view_filter(
            seed.view.id,
            seed.columns[1].id,
            FilterOp::Gt,
            "10",
            FilterLogic::And,
        )
        .await
        .unwrap();
    grid.context
        .add_view_sort(seed.view.id, seed.columns[1].id, true)
        .await
        .unwrap();

    let mut query = GridQuery::new(seed.table.id);
    query.view_id = Some(seed.view.id);

    let page = grid.context.get_data(&query).await.unwrap();
    let values = page
        .data
        .iter()
        .map(|row| row[&seed.columns[1].id.to_string()].as_f64().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(values, vec![30.0, 25.0]);

    // Inline overrides beat the saved configuration, even when empty
    query.filters = Some(vec![]);
    let page = grid.context.get_data(&query).await.unwrap();
    assert_eq!(page.data.len(), 3);
}

#[tokio::test]
async fn test_flattened_rows_track_column_changes() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "flatten").await;
    let row = insert_row(&grid.context, &seed, "Ada", "30").await;
    let number_key = seed.columns[1].id.to_string();

    let query = GridQuery::new(seed.table.id);

    let page = grid.context.get_data(&query).await.unwrap();
    assert_eq!(page.data[0]["id"], Value::from(row.id));
    assert_eq!(page.data[0]["order"], Value::from(row.ord));
    assert_eq!(page.data[0][&number_key], Value::from(30.0));

    grid.context
        .update_cell(row.id, seed.columns[1].id, "abc")
        .await
        .unwrap();
    let page = grid.context.get_data(&query).await.unwrap();
    assert_eq!(page.data[0][&number_key], Value::Null);

    grid.context.delete_column(seed.columns[1].id).await.unwrap();
    let page = grid.context.get_data(&query).await.unwrap();
    assert!(!page.data[0].contains_key(&number_key));
}

#[tokio::test]
async fn test_query_against_missing_table() {
    let grid = test_grid().await;

    let query = GridQuery::new(-1);
    assert!(matches!(
        grid.context.get_data(&query).await.unwrap_err(),
        GridError::TableDoesNotExist { id: -1 }
    ));
    assert!(matches!(
        grid.context.total_rows(&query).await.unwrap_err(),
        GridError::TableDoesNotExist { id: -1 }
    ));
    assert!(matches!(
        grid.context.total_matches(-1, "x").await.unwrap_err(),
        GridError::TableDoesNotExist { id: -1 }
    ));
}

#[tokio::test]
async fn test_zero_page_size_is_rejected() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "paging-limits").await;
    insert_row(&grid.context, &seed, "Ada", "1").await;

    let mut query = GridQuery::new(seed.table.id);
    query.page_size = 0;

    assert!(matches!(
        grid.context.get_data(&query).await.unwrap_err(),
        GridError::InvalidInput { .. }
    ));
}

#[tokio::test]
async fn test_seed_columns_have_expected_types() {
    let grid = test_grid().await;
    let seed = make_table(&grid.context, "seed-shape").await;
    assert_eq!(seed.columns[0].column_type(), ColumnType::Text);
    assert_eq!(seed.columns[1].column_type(), ColumnType::Number);
}
