use keel::{ColumnRef, DeleteStatement, InsertStatement, Session, TableRef, UpdateStatement};
use keel_memory::{MemoryConnection, affected};

fn customer() -> TableRef {
    TableRef::unqualified("customer")
}

#[tokio::test]
async fn update_executes_over_the_streaming_channel() {
    let mut connection = MemoryConnection::new();
    connection.script(affected(3, None));
    let mut session = Session::new(connection);
    let result = UpdateStatement::new(customer())
        .set(ColumnRef::new("customer", "active"), false)
        .filter(ColumnRef::new("customer", "city").eq("Milan"))
        .unwrap()
        .execute(&mut session)
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 3);
    assert_eq!(
        session.channel().statement_log(),
        [r#"UPDATE "customer" SET "active" = false WHERE "city" = 'Milan'"#]
    );
}

#[tokio::test]
async fn empty_update_is_a_no_op() {
    let mut session = Session::new(MemoryConnection::new());
    let result = UpdateStatement::new(customer())
        .execute(&mut session)
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 0);
    assert_eq!(session.channel().round_trips(), 0);
}

#[test]
fn empty_update_is_a_no_op_blocking() {
    let mut session = Session::new(MemoryConnection::new());
    let result = UpdateStatement::new(customer())
        .execute_blocking(&mut session)
        .unwrap();
    assert_eq!(result.rows_affected, 0);
    assert_eq!(session.channel().round_trips(), 0);
}

#[test]
fn second_filter_must_choose_a_combinator() {
    let first = UpdateStatement::new(customer())
        .set(ColumnRef::new("customer", "active"), false)
        .filter(ColumnRef::new("customer", "city").eq("Milan"))
        .unwrap();
    assert!(first.filter(ColumnRef::new("customer", "active").eq(true)).is_err());
}

#[tokio::test]
async fn filters_combine_with_and_or() {
    let mut connection = MemoryConnection::new();
    connection.script(affected(1, None));
    let mut session = Session::new(connection);
    DeleteStatement::new(customer())
        .filter(ColumnRef::new("customer", "city").eq("Milan"))
        .unwrap()
        .and_filter(ColumnRef::new("customer", "active").eq(false))
        .or_filter(ColumnRef::new("customer", "id").eq(0))
        .execute(&mut session)
        .await
        .unwrap();
    assert_eq!(
        session.channel().statement_log(),
        [r#"DELETE FROM "customer" WHERE "city" = 'Milan' AND "active" = false OR "id" = 0"#]
    );
}

#[tokio::test]
async fn single_row_insert() {
    let mut connection = MemoryConnection::new();
    connection.script(affected(1, Some(42)));
    let mut session = Session::new(connection);
    let result = InsertStatement::new(customer())
        .set(ColumnRef::new("customer", "name"), "Ada")
        .set(ColumnRef::new("customer", "active"), true)
        .execute(&mut session)
        .await
        .unwrap();
    assert_eq!(result.rows_affected, 1);
    assert_eq!(result.last_affected_id, Some(42));
    assert_eq!(
        session.channel().statement_log(),
        [indoc::indoc! {r#"
            INSERT INTO "customer" ("name", "active") VALUES
            ('Ada', true)"#}]
    );
}

#[test]
fn delete_executes_over_the_blocking_channel() {
    let mut connection = MemoryConnection::new();
    connection.script(affected(2, None));
    let mut session = Session::new(connection);
    let result = DeleteStatement::new(customer())
        .filter(ColumnRef::new("customer", "active").eq(false))
        .unwrap()
        .execute_blocking(&mut session)
        .unwrap();
    assert_eq!(result.rows_affected, 2);
    assert_eq!(
        session.channel().statement_log(),
        [r#"DELETE FROM "customer" WHERE "active" = false"#]
    );
}

#[tokio::test]
async fn same_statement_runs_on_both_channels() {
    let statement = UpdateStatement::new(customer())
        .set(ColumnRef::new("customer", "active"), true)
        .filter(ColumnRef::new("customer", "id").eq(7))
        .unwrap();

    let mut connection = MemoryConnection::new();
    connection.script(affected(1, None));
    let mut streaming = Session::new(connection);
    statement.execute(&mut streaming).await.unwrap();

    let mut connection = MemoryConnection::new();
    connection.script(affected(1, None));
    let mut blocking = Session::new(connection);
    statement.execute_blocking(&mut blocking).unwrap();

    assert_eq!(
        streaming.channel().statement_log(),
        blocking.channel().statement_log()
    );
}
