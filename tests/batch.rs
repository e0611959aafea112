use keel::{
    BatchInsertStatement, BatchLimitExceeded, ColumnDef, ColumnRef, Session, TableDef, TableRef,
    Value,
};
use keel_memory::{MemoryConnection, MemoryDriver, affected, labeled_rows};

fn customer_table() -> TableDef {
    TableDef::new(
        TableRef::unqualified("customer"),
        vec![
            ColumnDef {
                column_ref: ColumnRef::new("customer", "id"),
                value: Value::Int64(None),
                auto_increment: true,
                primary_key: keel::PrimaryKeyType::PrimaryKey,
                ..Default::default()
            },
            ColumnDef {
                column_ref: ColumnRef::new("customer", "name"),
                value: Value::Varchar(None),
                ..Default::default()
            },
            ColumnDef {
                column_ref: ColumnRef::new("customer", "active"),
                value: Value::Boolean(None),
                ..Default::default()
            },
        ],
    )
}

fn batch_of(names: &[&str]) -> BatchInsertStatement {
    let mut batch = BatchInsertStatement::new(customer_table());
    for name in names {
        batch
            .add_row([
                (ColumnRef::new("customer", "name"), Value::from(*name)),
                (ColumnRef::new("customer", "active"), Value::from(true)),
            ])
            .unwrap();
    }
    batch
}

#[test]
fn validate_respects_the_row_ceiling() {
    let mut batch = BatchInsertStatement::new(customer_table());
    for i in 0..1000 {
        batch
            .add_row([(
                ColumnRef::new("customer", "name"),
                Value::from(format!("c{}", i)),
            )])
            .unwrap();
    }
    assert!(batch.validate(Some(1000)).is_ok());
    assert!(batch.validate(None).is_ok());
    batch
        .add_row([(ColumnRef::new("customer", "name"), Value::from("extra"))])
        .unwrap();
    let error = batch.validate(Some(1000)).unwrap_err();
    assert_eq!(error, BatchLimitExceeded { rows: 1001, limit: 1000 });
}

#[tokio::test]
async fn oversized_batch_fails_before_any_round_trip() {
    let mut connection = MemoryConnection::with_driver(MemoryDriver {
        max_insert_rows: Some(2),
        ..Default::default()
    });
    connection.script(affected(3, None));
    let mut session = Session::new(connection);
    let error = batch_of(&["Ada", "Grace", "Radia"])
        .execute(&mut session)
        .await
        .unwrap_err();
    let limit = error.downcast_ref::<BatchLimitExceeded>().unwrap();
    assert_eq!(*limit, BatchLimitExceeded { rows: 3, limit: 2 });
    assert_eq!(session.channel().round_trips(), 0);
}

#[tokio::test]
async fn empty_batch_is_a_no_op() {
    let mut session = Session::new(MemoryConnection::new());
    let result = BatchInsertStatement::new(customer_table())
        .execute(&mut session)
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 0);
    assert!(result.generated_keys.is_empty());
    assert_eq!(session.channel().round_trips(), 0);
}

#[test]
fn rows_must_match_the_layout_of_the_first() {
    let mut batch = batch_of(&["Ada"]);
    // Swapped columns.
    assert!(
        batch
            .add_row([
                (ColumnRef::new("customer", "active"), Value::from(true)),
                (ColumnRef::new("customer", "name"), Value::from("Grace")),
            ])
            .is_err()
    );
    // Missing column.
    assert!(
        batch
            .add_row([(ColumnRef::new("customer", "name"), Value::from("Grace"))])
            .is_err()
    );
    assert_eq!(batch.len(), 1);
}

#[tokio::test]
async fn generated_keys_come_back_through_returning() {
    let mut connection = MemoryConnection::new();
    connection.script(labeled_rows(
        &["id"],
        vec![
            vec![Value::Int64(Some(11))],
            vec![Value::Int64(Some(12))],
            vec![Value::Int64(Some(13))],
        ],
    ));
    let mut session = Session::new(connection);
    let result = batch_of(&["Ada", "Grace", "Radia"])
        .execute(&mut session)
        .await
        .unwrap();
    assert_eq!(result.generated_keys, [11, 12, 13]);
    assert_eq!(result.rows_affected, 3);
    assert_eq!(
        session.channel().statement_log(),
        [indoc::indoc! {r#"
            INSERT INTO "customer" ("name", "active") VALUES
            ('Ada', true),
            ('Grace', true),
            ('Radia', true)
            RETURNING "id""#}]
    );
}

#[tokio::test]
async fn generated_keys_fall_back_to_the_last_inserted_id() {
    let mut connection = MemoryConnection::with_driver(MemoryDriver {
        supports_returning: false,
        ..Default::default()
    });
    connection.script(affected(3, Some(13)));
    let mut session = Session::new(connection);
    let result = batch_of(&["Ada", "Grace", "Radia"])
        .execute(&mut session)
        .await
        .unwrap();
    assert_eq!(result.generated_keys, [11, 12, 13]);
    assert_eq!(result.rows_affected, 3);
    assert!(!session.channel().statement_log()[0].contains("RETURNING"));
}

#[tokio::test]
async fn caller_populated_keys_are_not_read_back() {
    let mut connection = MemoryConnection::new();
    connection.script(affected(1, None));
    let mut session = Session::new(connection);
    let mut batch = BatchInsertStatement::new(customer_table());
    batch
        .add_row([
            (ColumnRef::new("customer", "id"), Value::Int64(Some(7))),
            (ColumnRef::new("customer", "name"), Value::from("Ada")),
        ])
        .unwrap();
    let result = batch.execute(&mut session).await.unwrap();
    assert!(result.generated_keys.is_empty());
    assert!(!session.channel().statement_log()[0].contains("RETURNING"));
}

#[test]
fn batch_runs_over_the_blocking_channel() {
    let mut connection = MemoryConnection::new();
    connection.script(labeled_rows(
        &["id"],
        vec![vec![Value::Int64(Some(21))], vec![Value::Int64(Some(22))]],
    ));
    let mut session = Session::new(connection);
    let result = batch_of(&["Ada", "Grace"])
        .execute_blocking(&mut session)
        .unwrap();
    assert_eq!(result.generated_keys, [21, 22]);
    assert_eq!(result.rows_affected, 2);
}
