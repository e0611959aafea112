use futures::StreamExt;
use keel::{ColumnRef, Order, SelectQuery, Session, TableRef, Value};
use keel_memory::{MemoryConnection, labeled_rows};
use std::pin::pin;

fn customer() -> TableRef {
    TableRef::unqualified("customer")
}

fn count_row(count: i64) -> Vec<keel::QueryResult> {
    labeled_rows(&["count"], vec![vec![Value::Int64(Some(count))]])
}

#[tokio::test]
async fn plain_count_goes_direct() {
    let mut connection = MemoryConnection::new();
    connection.script(count_row(12));
    let mut session = Session::new(connection);
    let count = SelectQuery::new(customer())
        .field(ColumnRef::new("customer", "name"))
        .filter(ColumnRef::new("customer", "active").eq(true))
        .unwrap()
        .count(&mut session)
        .await
        .unwrap();
    assert_eq!(count, 12);
    assert_eq!(
        session.channel().statement_log(),
        [r#"SELECT COUNT(*) FROM "customer" WHERE "active" = true"#]
    );
}

#[tokio::test]
async fn distinct_count_wraps_the_selection() {
    let mut connection = MemoryConnection::new();
    connection.script(count_row(3));
    let mut session = Session::new(connection);
    let count = SelectQuery::new(customer())
        .field(ColumnRef::new("customer", "city"))
        .distinct()
        .unwrap()
        .count(&mut session)
        .await
        .unwrap();
    assert_eq!(count, 3);
    assert_eq!(
        session.channel().statement_log(),
        [
            r#"SELECT COUNT(*) FROM (SELECT DISTINCT "city" AS "customer_city" FROM "customer") AS "subquery""#
        ]
    );
}

#[tokio::test]
async fn limited_count_wraps_and_aliases_expressions() {
    let mut connection = MemoryConnection::new();
    connection.script(count_row(5));
    let mut session = Session::new(connection);
    let count = SelectQuery::new(customer())
        .field(ColumnRef::new("customer", "city"))
        .field(keel::Operand::Call("UPPER", vec![keel::Operand::Column(
            ColumnRef::new("customer", "name"),
        )]))
        .limit(5)
        .count(&mut session)
        .await
        .unwrap();
    assert_eq!(count, 5);
    assert_eq!(
        session.channel().statement_log(),
        [
            r#"SELECT COUNT(*) FROM (SELECT "city" AS "customer_city", UPPER("name") AS "exp1" FROM "customer" LIMIT 5) AS "subquery""#
        ]
    );
}

#[tokio::test]
async fn duplicate_count_fields_collapse() {
    let mut connection = MemoryConnection::new();
    connection.script(count_row(2));
    let mut session = Session::new(connection);
    let city = ColumnRef::new("customer", "city");
    SelectQuery::new(customer())
        .field(city.clone())
        .field(city)
        .distinct()
        .unwrap()
        .count(&mut session)
        .await
        .unwrap();
    assert_eq!(
        session.channel().statement_log(),
        [
            r#"SELECT COUNT(*) FROM (SELECT DISTINCT "city" AS "customer_city" FROM "customer") AS "subquery""#
        ]
    );
}

#[tokio::test]
async fn is_empty_probes_a_single_row() {
    let mut connection = MemoryConnection::new();
    connection.script(labeled_rows(&["name"], vec![vec![Value::from("Ada")]]));
    let mut session = Session::new(connection);
    let query = SelectQuery::new(customer())
        .field(ColumnRef::new("customer", "name"))
        .limit(50);
    let empty = query.is_empty(&mut session).await.unwrap();
    assert!(!empty);
    assert_eq!(
        session.channel().statement_log(),
        [r#"SELECT "name" FROM "customer" LIMIT 1"#]
    );
    // The probe does not disturb the query itself.
    let writer = keel::GenericSqlWriter::new();
    assert_eq!(
        query.render(&writer),
        r#"SELECT "name" FROM "customer" LIMIT 50"#
    );
}

#[tokio::test]
async fn is_empty_keeps_row_locks_intact() {
    let mut connection = MemoryConnection::new();
    connection.script(Vec::new());
    let mut session = Session::new(connection);
    let empty = SelectQuery::new(customer())
        .field(ColumnRef::new("customer", "name"))
        .for_update()
        .is_empty(&mut session)
        .await
        .unwrap();
    assert!(empty);
    assert_eq!(
        session.channel().statement_log(),
        [r#"SELECT "name" FROM "customer" FOR UPDATE"#]
    );
}

#[tokio::test]
async fn duplicate_projections_map_back_to_their_fields() {
    let mut connection = MemoryConnection::new();
    connection.script(labeled_rows(
        &["name", "city"],
        vec![vec![Value::from("Ada"), Value::from("London")]],
    ));
    let mut session = Session::new(connection);
    let name = ColumnRef::new("customer", "name");
    let rows = SelectQuery::new(customer())
        .field(name.clone())
        .field(ColumnRef::new("customer", "city"))
        .field(name)
        .fetch_all(&mut session)
        .await
        .unwrap();
    assert_eq!(
        session.channel().statement_log(),
        [r#"SELECT "name", "city" FROM "customer""#]
    );
    let row = &rows[0];
    assert_eq!(row.value(0), Some(&Value::from("Ada")));
    assert_eq!(row.value(1), Some(&Value::from("London")));
    assert_eq!(row.value(2), Some(&Value::from("Ada")));
    assert_eq!(row.get_column("city"), Some(&Value::from("London")));
}

#[tokio::test]
async fn stream_yields_rows_in_order() {
    let mut connection = MemoryConnection::new();
    connection.script(labeled_rows(
        &["name"],
        vec![
            vec![Value::from("Ada")],
            vec![Value::from("Grace")],
            vec![Value::from("Radia")],
        ],
    ));
    let mut session = Session::new(connection);
    let query = SelectQuery::new(customer())
        .field(ColumnRef::new("customer", "name"))
        .order_by(ColumnRef::new("customer", "name"), Order::ASC);
    let mut names = Vec::new();
    {
        let mut rows = pin!(query.stream(&mut session));
        while let Some(row) = rows.next().await {
            names.push(row.unwrap().get_column("name").cloned().unwrap());
        }
    }
    assert_eq!(
        names,
        [Value::from("Ada"), Value::from("Grace"), Value::from("Radia")]
    );
    assert_eq!(
        session.channel().statement_log(),
        [r#"SELECT "name" FROM "customer" ORDER BY "name" ASC"#]
    );
}

#[test]
fn fetch_all_blocking_matches_the_streaming_shape() {
    let mut connection = MemoryConnection::new();
    connection.script(labeled_rows(&["name"], vec![vec![Value::from("Ada")]]));
    let mut session = Session::new(connection);
    let rows = SelectQuery::new(customer())
        .field(ColumnRef::new("customer", "name"))
        .fetch_all_blocking(&mut session)
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].value(0), Some(&Value::from("Ada")));
    assert_eq!(
        session.channel().statement_log(),
        [r#"SELECT "name" FROM "customer""#]
    );
}

#[test]
fn count_blocking() {
    let mut connection = MemoryConnection::new();
    connection.script(count_row(9));
    let mut session = Session::new(connection);
    let count = SelectQuery::new(customer()).count_blocking(&mut session).unwrap();
    assert_eq!(count, 9);
    assert_eq!(
        session.channel().statement_log(),
        [r#"SELECT COUNT(*) FROM "customer""#]
    );
}
