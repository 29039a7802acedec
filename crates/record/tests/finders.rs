mod common;

use common::{seed_users, setup, user_row, User};
use elif_record::{attrs, Finders, Value};

#[tokio::test]
async fn test_find_or_fail_missing_row_is_not_found() {
    let (connection, db) = setup();
    seed_users(&connection);

    let err = User::find_or_fail(&db, 999).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(connection.statement_count(), 1);
    assert!(err.to_string().contains("id = 999"));
}

#[tokio::test]
async fn test_find_returns_persisted_record() {
    let (connection, db) = setup();
    seed_users(&connection);

    let user = User::find(&db, 2).await.unwrap().unwrap();

    assert!(!user.is_new());
    assert!(!user.is_dirty());
    assert_eq!(user.get("username"), Some(Value::from("romain")));
    assert_eq!(
        connection.statements(),
        vec!["SELECT * FROM users WHERE id = $1 LIMIT 1"]
    );
    assert!(User::find(&db, 42).await.unwrap().is_none());
}

#[tokio::test]
async fn test_find_by_field() {
    let (connection, db) = setup();
    seed_users(&connection);

    let user = User::find_by(&db, "username", "nikk").await.unwrap().unwrap();
    assert_eq!(user.primary_key_value(), Some(Value::Int(3)));

    let err = User::find_by_or_fail(&db, "username", "nobody").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_first_and_last_follow_primary_key() {
    let (connection, db) = setup();
    connection.seed(
        "users",
        vec![user_row(7, "late", "uk"), user_row(2, "early", "ind")],
    );

    let first = User::first(&db).await.unwrap().unwrap();
    let last = User::last(&db).await.unwrap().unwrap();

    assert_eq!(first.get("username"), Some(Value::from("early")));
    assert_eq!(last.get("username"), Some(Value::from("late")));
}

#[tokio::test]
async fn test_first_or_fail_on_empty_table() {
    let (_, db) = setup();
    assert!(User::first_or_fail(&db).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_all_returns_every_row() {
    let (connection, db) = setup();
    seed_users(&connection);

    let users = User::all(&db).await.unwrap();
    assert_eq!(users.len(), 3);
    assert!(users.iter().all(|u| !u.is_new()));
}

#[tokio::test]
async fn test_pick_and_pick_inverse() {
    let (connection, db) = setup();
    seed_users(&connection);

    let picked: Vec<_> = User::pick(&db, 2)
        .await
        .unwrap()
        .iter()
        .filter_map(|u| u.primary_key_value())
        .collect();
    assert_eq!(picked, vec![Value::Int(1), Value::Int(2)]);

    let inverse: Vec<_> = User::pick_inverse(&db, 2)
        .await
        .unwrap()
        .iter()
        .filter_map(|u| u.primary_key_value())
        .collect();
    assert_eq!(inverse, vec![Value::Int(3), Value::Int(2)]);
}

#[tokio::test]
async fn test_pick_zero_issues_no_query() {
    let (connection, db) = setup();
    seed_users(&connection);

    assert!(User::pick(&db, 0).await.unwrap().is_empty());
    assert!(User::pick_inverse(&db, 0).await.unwrap().is_empty());
    assert_eq!(connection.statement_count(), 0);
}

#[tokio::test]
async fn test_pick_with_huge_count_returns_every_row() {
    let (connection, db) = setup();
    seed_users(&connection);

    assert_eq!(User::pick(&db, usize::MAX).await.unwrap().len(), 3);
    assert_eq!(User::pick_inverse(&db, usize::MAX).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_pick_one_defaults_to_a_single_row() {
    let (connection, db) = setup();
    seed_users(&connection);

    let first = User::pick_one(&db).await.unwrap();
    let last = User::pick_inverse_one(&db).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].primary_key_value(), Some(Value::Int(1)));
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].primary_key_value(), Some(Value::Int(3)));
}

#[tokio::test]
async fn test_ids_are_ascending() {
    let (connection, db) = setup();
    connection.seed(
        "users",
        vec![user_row(3, "c", "uk"), user_row(1, "a", "uk"), user_row(2, "b", "uk")],
    );

    let ids = User::ids(&db).await.unwrap();
    assert_eq!(ids, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    assert_eq!(
        connection.statements(),
        vec!["SELECT id FROM users ORDER BY id ASC"]
    );
}

#[tokio::test]
async fn test_pair_maps_lhs_to_rhs() {
    let (connection, db) = setup();
    connection.seed(
        "users",
        vec![user_row(1, "virk", "ind"), user_row(2, "romain", "uk")],
    );

    let pairs = User::pair(&db, "id", "country").await.unwrap();

    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs["1"], Value::from("ind"));
    assert_eq!(pairs["2"], Value::from("uk"));
}

#[tokio::test]
async fn test_pair_last_row_wins_on_repeated_key() {
    let (connection, db) = setup();
    seed_users(&connection);

    let pairs = User::pair(&db, "country", "username").await.unwrap();

    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs["ind"], Value::from("nikk"));
    assert_eq!(pairs["uk"], Value::from("romain"));
}

#[tokio::test]
async fn test_create_many_inserts_in_order() {
    let (connection, db) = setup();

    let users = User::create_many(
        &db,
        vec![
            attrs! { "username" => "virk" },
            attrs! { "username" => "nikk" },
            attrs! { "username" => "romain" },
        ],
    )
    .await
    .unwrap();

    assert_eq!(users.len(), 3);
    assert_eq!(connection.statement_count(), 3);
    assert!(connection
        .statements()
        .iter()
        .all(|sql| sql.starts_with("INSERT INTO users")));
    let ids: Vec<_> = users.iter().filter_map(|u| u.primary_key_value()).collect();
    assert_eq!(ids, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[tokio::test]
async fn test_create_many_with_no_items() {
    let (connection, db) = setup();
    assert!(User::create_many(&db, Vec::new()).await.unwrap().is_empty());
    assert_eq!(connection.statement_count(), 0);
}

#[tokio::test]
async fn test_find_or_create_by_reuses_existing_row() {
    let (connection, db) = setup();
    seed_users(&connection);

    let user = User::find_or_create_by(
        &db,
        attrs! { "username" => "virk" },
        attrs! { "country" => "fr" },
    )
    .await
    .unwrap();

    assert_eq!(user.get("country"), Some(Value::from("ind")));
    assert_eq!(connection.rows("users").len(), 3);
}

#[tokio::test]
async fn test_find_or_create_by_creates_missing_row() {
    let (connection, db) = setup();
    seed_users(&connection);

    let user = User::find_or_create_by(
        &db,
        attrs! { "username" => "amrita" },
        attrs! { "country" => "ind" },
    )
    .await
    .unwrap();

    assert!(!user.is_new());
    assert_eq!(user.primary_key_value(), Some(Value::Int(4)));
    assert_eq!(connection.rows("users").len(), 4);
}

#[tokio::test]
async fn test_find_or_new_by_leaves_record_unsaved() {
    let (connection, db) = setup();

    let user = User::find_or_new_by(
        &db,
        attrs! { "username" => "amrita" },
        attrs! { "country" => "ind" },
    )
    .await
    .unwrap();

    assert!(user.is_new());
    assert_eq!(user.get("country"), Some(Value::from("ind")));
    assert!(connection.rows("users").is_empty());
}

#[tokio::test]
async fn test_query_adapter_filters_and_pages() {
    let (connection, db) = setup();
    seed_users(&connection);

    let indians = User::query(&db)
        .unwrap()
        .where_eq("country", "ind")
        .order_by_desc("id")
        .fetch()
        .await
        .unwrap();
    let names: Vec<_> = indians.iter().filter_map(|u| u.get("username")).collect();
    assert_eq!(names, vec![Value::from("nikk"), Value::from("virk")]);

    let page = User::query(&db)
        .unwrap()
        .order_by("id")
        .for_page(2, 2)
        .fetch()
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].primary_key_value(), Some(Value::Int(3)));
}

#[tokio::test]
async fn test_query_first_or_fail_describes_criteria() {
    let (connection, db) = setup();
    seed_users(&connection);

    let err = User::query(&db)
        .unwrap()
        .where_eq("country", "fr")
        .first_or_fail()
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("country = fr"));
}

#[tokio::test]
async fn test_bulk_update_and_delete() {
    let (connection, db) = setup();
    seed_users(&connection);

    let updated = User::query(&db)
        .unwrap()
        .where_eq("country", "ind")
        .update(attrs! { "country" => "india" })
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let deleted = User::query(&db)
        .unwrap()
        .where_eq("country", "india")
        .delete()
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(connection.rows("users").len(), 1);
}

#[tokio::test]
async fn test_truncate_removes_every_row() {
    let (connection, db) = setup();
    seed_users(&connection);

    assert_eq!(User::truncate(&db).await.unwrap(), 3);
    assert!(connection.rows("users").is_empty());
}
