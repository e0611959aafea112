use indoc::indoc;
use keel_core::{
    BinaryOp, BinaryOpType, ColumnRef, GenericSqlWriter, Operand, Order, SelectPlan, SelectQuery,
    SqlWriter, TableRef, UnaryOp, UnaryOpType, UpdateStatement, Value,
};
use std::sync::Arc;

const WRITER: GenericSqlWriter = GenericSqlWriter::new();

fn rendered(f: impl FnOnce(&mut String)) -> String {
    let mut out = String::new();
    f(&mut out);
    out
}

#[test]
fn identifiers_are_quoted_and_escaped() {
    assert_eq!(
        rendered(|out| WRITER.write_identifier_quoted(out, r#"we"ird"#)),
        r#""we""ird""#
    );
    assert_eq!(
        rendered(|out| WRITER.write_table_ref(out, &TableRef::new("warehouse", "stock"))),
        r#""warehouse"."stock""#
    );
    assert_eq!(
        rendered(|out| WRITER.write_table_ref(out, &TableRef::unqualified("stock"))),
        r#""stock""#
    );
    assert_eq!(
        rendered(|out| WRITER.write_column_ref(out, &ColumnRef::new("stock", "qty"), true)),
        r#""stock"."qty""#
    );
    assert_eq!(
        rendered(|out| WRITER.write_column_ref(out, &ColumnRef::new("stock", "qty"), false)),
        r#""qty""#
    );
}

#[test]
fn values_render_as_literals() {
    let check = |value: Value, expected: &str| {
        assert_eq!(rendered(|out| WRITER.write_value(out, &value)), expected);
    };
    check(Value::Null, "NULL");
    check(Value::Int64(None), "NULL");
    check(Value::Boolean(Some(true)), "true");
    check(Value::Int64(Some(-7)), "-7");
    check(Value::Float64(Some(2.5)), "2.5");
    check(Value::Float64(Some(f64::INFINITY)), "CAST('Infinity' AS DOUBLE)");
    check(
        Value::Float64(Some(f64::NEG_INFINITY)),
        "CAST('-Infinity' AS DOUBLE)",
    );
    check(Value::from("O'Brien"), "'O''Brien'");
    check(
        Value::Blob(Some(vec![0xDE, 0xAD].into_boxed_slice())),
        r"'\xDEAD'",
    );
    check(
        Value::Date(Some(time::macros::date!(2024 - 05 - 17))),
        "'2024-05-17'",
    );
    check(
        Value::Timestamp(Some(time::macros::datetime!(2024-05-17 12:30:45))),
        "'2024-05-17T12:30:45.0'",
    );
}

#[test]
fn expression_precedence_inserts_parentheses() {
    let a = ColumnRef::new("t", "a");
    let b = ColumnRef::new("t", "b");
    let c = ColumnRef::new("t", "c");
    let expression = BinaryOp {
        op: BinaryOpType::And,
        lhs: BinaryOp {
            op: BinaryOpType::Or,
            lhs: a.eq(1),
            rhs: b.eq(2),
        },
        rhs: c.eq(3),
    };
    let mut out = String::new();
    use keel_core::Expression;
    expression.write_query(&WRITER, &mut out, false);
    assert_eq!(out, r#"("a" = 1 OR "b" = 2) AND "c" = 3"#);

    let negated = UnaryOp {
        op: UnaryOpType::Not,
        v: ColumnRef::new("t", "active").eq(true),
    };
    let mut out = String::new();
    negated.write_query(&WRITER, &mut out, false);
    assert_eq!(out, r#"NOT "active" = true"#);
}

#[test]
fn function_operands() {
    use keel_core::Expression;
    let call = Operand::Call("COALESCE", vec![
        Operand::Column(ColumnRef::new("t", "nick")),
        Operand::LitStr("anonymous"),
    ]);
    let mut out = String::new();
    call.write_query(&WRITER, &mut out, false);
    assert_eq!(out, r#"COALESCE("nick", 'anonymous')"#);
}

#[test]
fn select_clause_ordering() {
    let name = ColumnRef::new("customer", "name");
    let city = ColumnRef::new("customer", "city");
    let query = SelectQuery::new(TableRef::unqualified("customer"))
        .field(name.clone())
        .field(city.clone())
        .filter(ColumnRef::new("customer", "active").eq(true))
        .unwrap()
        .group_by(city.clone())
        .order_by(name, Order::DESC)
        .limit(10)
        .offset(20);
    assert_eq!(
        query.render(&WRITER),
        r#"SELECT "name", "city" FROM "customer" WHERE "active" = true GROUP BY "city" ORDER BY "name" DESC LIMIT 10 OFFSET 20"#
    );
}

#[test]
fn select_without_fields_falls_back_to_asterisk() {
    let query = SelectQuery::new(TableRef::new("crm", "customer")).for_update();
    assert_eq!(
        query.render(&WRITER),
        r#"SELECT * FROM "crm"."customer" FOR UPDATE"#
    );
}

#[test]
fn select_distinct_variants() {
    let city = ColumnRef::new("customer", "city");
    let query = SelectQuery::new(TableRef::unqualified("customer"))
        .field(city.clone())
        .distinct()
        .unwrap();
    assert_eq!(
        query.render(&WRITER),
        r#"SELECT DISTINCT "city" FROM "customer""#
    );
    let query = SelectQuery::new(TableRef::unqualified("customer"))
        .field(city.clone())
        .distinct_on(city)
        .unwrap();
    assert_eq!(
        query.render(&WRITER),
        r#"SELECT DISTINCT ON ("city") "city" FROM "customer""#
    );
}

#[test]
fn distinct_and_distinct_on_are_exclusive() {
    let city = ColumnRef::new("customer", "city");
    assert!(
        SelectQuery::new(TableRef::unqualified("customer"))
            .distinct()
            .unwrap()
            .distinct_on(city.clone())
            .is_err()
    );
    assert!(
        SelectQuery::new(TableRef::unqualified("customer"))
            .distinct_on(city)
            .unwrap()
            .distinct()
            .is_err()
    );
}

#[test]
fn insert_renders_rows_and_returning() {
    let table = TableRef::unqualified("customer");
    let columns = [
        ColumnRef::new("customer", "name"),
        ColumnRef::new("customer", "active"),
    ];
    let rows = [
        vec![Value::from("Ada"), Value::from(true)].into_boxed_slice(),
        vec![Value::from("Grace"), Value::from(false)].into_boxed_slice(),
    ];
    let returning = ColumnRef::new("customer", "id");
    let mut out = String::new();
    WRITER.write_insert(&mut out, &table, &columns, &rows, Some(&returning));
    assert_eq!(
        out,
        indoc! {r#"
            INSERT INTO "customer" ("name", "active") VALUES
            ('Ada', true),
            ('Grace', false)
            RETURNING "id""#}
    );
}

#[test]
fn update_and_delete_shapes() {
    let table = TableRef::unqualified("customer");
    let statement = UpdateStatement::new(table.clone())
        .set(ColumnRef::new("customer", "active"), false)
        .filter(ColumnRef::new("customer", "id").eq(7))
        .unwrap();
    assert_eq!(
        statement.render(&WRITER).unwrap(),
        r#"UPDATE "customer" SET "active" = false WHERE "id" = 7"#
    );
    let mut out = String::new();
    WRITER.write_delete(&mut out, &table, None);
    assert_eq!(out, r#"DELETE FROM "customer""#);
}

#[test]
fn empty_update_renders_nothing() {
    let statement = UpdateStatement::new(TableRef::unqualified("customer"));
    assert_eq!(statement.render(&WRITER), None);
}

#[test]
fn count_shapes() {
    let table = TableRef::unqualified("customer");
    let condition = ColumnRef::new("customer", "active").eq(true);
    let mut out = String::new();
    WRITER.write_select_count(&mut out, &table, Some(&condition));
    assert_eq!(
        out,
        r#"SELECT COUNT(*) FROM "customer" WHERE "active" = true"#
    );

    let fields: [Arc<dyn keel_core::Expression>; 1] =
        [Arc::new(ColumnRef::new("customer", "city"))];
    let aliases = ["customer_city".to_string()];
    let plan = SelectPlan {
        fields: &fields,
        aliases: Some(&aliases),
        from: &table,
        condition: None,
        group_by: &[],
        order_by: &[],
        limit: None,
        offset: None,
        for_update: false,
        distinct: true,
        distinct_on: &[],
    };
    let mut out = String::new();
    WRITER.write_wrapped_count(&mut out, &plan);
    assert_eq!(
        out,
        r#"SELECT COUNT(*) FROM (SELECT DISTINCT "city" AS "customer_city" FROM "customer") AS "subquery""#
    );
}
