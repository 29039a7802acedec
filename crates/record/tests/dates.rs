mod common;

use chrono::NaiveDate;
use common::setup;
use elif_record::{attrs, Finders, Model, ModelDescriptor, Record, Value};

struct Meetup;

impl Model for Meetup {
    const NAME: &'static str = "Meetup";

    fn descriptor() -> ModelDescriptor {
        ModelDescriptor::new()
            .date("starts_on")
            .date("cancelled_at")
            .format_date_for_storage("starts_on", |_: &str, value: Value| match value.as_date() {
                Some(date) => Value::String(date.format("%Y-%m-%d").to_string()),
                None => value,
            })
            .cast_date("starts_on", |_: &str, value: Value| {
                let text = value.to_string();
                match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                    Ok(date) => Value::String(date.format("%d/%m/%Y").to_string()),
                    Err(_) => value,
                }
            })
    }
}

#[tokio::test]
async fn test_date_fields_use_their_storage_formatter() {
    let (connection, db) = setup();
    let starts_on = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(18, 30, 0)
        .unwrap();

    Meetup::create(&db, attrs! { "name" => "rustaceans", "starts_on" => starts_on })
        .await
        .unwrap();

    let row = &connection.rows("meetups")[0];
    assert_eq!(row["starts_on"], Value::from("2024-03-09"));
    assert!(row["created_at"]
        .as_str()
        .and_then(elif_record::value::parse_date)
        .is_some());
}

#[tokio::test]
async fn test_date_display_cast_applies_to_json() {
    let (connection, db) = setup();
    connection.seed(
        "meetups",
        vec![attrs! {
            "id" => 1,
            "starts_on" => "2024-03-09",
            "created_at" => "2024-01-01 09:15:00",
            "cancelled_at" => Value::Null,
        }],
    );

    let meetup = Meetup::find_or_fail(&db, 1).await.unwrap();
    let json = meetup.to_json();

    assert_eq!(json["starts_on"], "09/03/2024");
    assert_eq!(json["created_at"], "2024-01-01 09:15:00");
    assert!(json["cancelled_at"].is_null());
}

#[tokio::test]
async fn test_null_dates_are_written_as_null() {
    let (connection, db) = setup();

    let mut meetup = Record::<Meetup>::from_attributes(attrs! {
        "name" => "tba",
        "starts_on" => Value::Null,
    });
    meetup.save(&db).await.unwrap();

    assert!(connection.rows("meetups")[0]["starts_on"].is_null());
}

#[tokio::test]
async fn test_saved_dates_do_not_look_dirty() {
    let (connection, db) = setup();
    let mut meetup = Meetup::create(&db, attrs! { "name" => "rustaceans" }).await.unwrap();
    connection.clear_log();

    assert!(!meetup.is_dirty());
    assert!(!meetup.save(&db).await.unwrap());
    assert_eq!(connection.statement_count(), 0);
}

#[tokio::test]
async fn test_same_day_in_field_format_is_not_a_change() {
    let (connection, db) = setup();
    connection.seed(
        "meetups",
        vec![attrs! { "id" => 1, "name" => "rustaceans", "starts_on" => "2024-03-09" }],
    );

    let mut meetup = Meetup::find_or_fail(&db, 1).await.unwrap();
    let midnight = NaiveDate::from_ymd_opt(2024, 3, 9)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    meetup.set("starts_on", midnight).unwrap();
    connection.clear_log();

    assert!(!meetup.is_dirty());
    assert!(!meetup.save(&db).await.unwrap());
    assert_eq!(connection.statement_count(), 0);
}

#[tokio::test]
async fn test_model_queries_declare_their_date_columns() {
    let (_, db) = setup();
    let query = Meetup::query(&db).unwrap();

    assert!(query.builder().is_date_column("starts_on"));
    assert!(query.builder().is_date_column("created_at"));
    assert!(!query.builder().is_date_column("name"));
}

struct Journal;

impl Model for Journal {
    const NAME: &'static str = "Journal";

    fn descriptor() -> ModelDescriptor {
        ModelDescriptor::new().date_format("%d.%m.%Y %H:%M:%S")
    }
}

#[tokio::test]
async fn test_same_instant_in_model_format_is_not_a_change() {
    let (connection, db) = setup();
    connection.seed(
        "journals",
        vec![attrs! {
            "id" => 1,
            "created_at" => "21.06.2017 14:05:09",
            "updated_at" => "21.06.2017 14:05:09",
        }],
    );
    let written = NaiveDate::from_ymd_opt(2017, 6, 21)
        .unwrap()
        .and_hms_opt(14, 5, 9)
        .unwrap();

    let mut journal = Journal::find_or_fail(&db, 1).await.unwrap();
    journal.set("created_at", written).unwrap();
    connection.clear_log();

    assert!(journal.dirty().is_empty());
    assert!(!journal.save(&db).await.unwrap());
    assert_eq!(connection.statement_count(), 0);

    journal.set("created_at", written + chrono::Duration::hours(1)).unwrap();
    assert!(journal.save(&db).await.unwrap());
    assert_eq!(
        connection.statements(),
        vec!["UPDATE journals SET created_at = $1, updated_at = $2 WHERE id = $3"]
    );
    assert_eq!(
        connection.rows("journals")[0]["created_at"],
        Value::from("21.06.2017 15:05:09")
    );
}

struct Ledger;

impl Model for Ledger {
    const NAME: &'static str = "Ledger";

    fn descriptor() -> ModelDescriptor {
        ModelDescriptor::new()
            .date_format("%d.%m.%Y %H:%M")
            .created_at_column(Some("opened_at"))
            .updated_at_column(None)
    }
}

#[tokio::test]
async fn test_custom_timestamp_column_and_format() {
    let (connection, db) = setup();

    let ledger = Ledger::create(&db, attrs! { "owner" => "virk" }).await.unwrap();

    assert!(ledger.raw("opened_at").is_some());
    assert!(ledger.raw("created_at").is_none());
    let stored = connection.rows("ledgers")[0]["opened_at"].to_string();
    assert!(chrono::NaiveDateTime::parse_from_str(&stored, "%d.%m.%Y %H:%M").is_ok());
}
