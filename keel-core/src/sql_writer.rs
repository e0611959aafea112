use crate::{
    BinaryOp, BinaryOpType, ColumnRef, Expression, Operand, Order, SelectPlan, TableRef, UnaryOp,
    UnaryOpType, Value, possibly_parenthesized, separated_by,
};
use std::fmt::Write;
use time::{Date, Time};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        if $value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        } else if $value.is_nan() {
            $out.push_str("CAST('NaN' AS DOUBLE)");
        } else if $value.is_sign_positive() {
            $out.push_str("CAST('Infinity' AS DOUBLE)");
        } else {
            $out.push_str("CAST('-Infinity' AS DOUBLE)");
        }
    }};
}

/// Renders statements and expressions to SQL text.
///
/// A pure function of statement + dialect: implementations override only the
/// pieces their dialect spells differently.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + 1;
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn write_table_ref(&self, out: &mut String, value: &TableRef) {
        if !value.schema.is_empty() {
            self.write_identifier_quoted(out, &value.schema);
            out.push('.');
        }
        self.write_identifier_quoted(out, &value.name);
    }

    fn write_column_ref(&self, out: &mut String, value: &ColumnRef, qualify: bool) {
        if qualify && !value.table.is_empty() {
            if !value.schema.is_empty() {
                self.write_identifier_quoted(out, &value.schema);
                out.push('.');
            }
            self.write_identifier_quoted(out, &value.table);
            out.push('.');
        }
        self.write_identifier_quoted(out, &value.name);
    }

    fn write_value(&self, out: &mut String, value: &Value) {
        if value.is_none() {
            self.write_value_none(out);
            return;
        }
        let _ = match value {
            Value::Boolean(Some(v)) => self.write_value_bool(out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::UInt64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) => write_float!(out, *v),
            Value::Float64(Some(v)) => write_float!(out, *v),
            Value::Decimal(Some(v), ..) => drop(write!(out, "{}", v)),
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v.as_ref()),
            Value::Date(Some(v)) => {
                out.push('\'');
                self.write_value_date(out, v);
                out.push('\'');
            }
            Value::Time(Some(v)) => {
                out.push('\'');
                self.write_value_time(out, v);
                out.push('\'');
            }
            Value::Timestamp(Some(v)) => {
                out.push('\'');
                self.write_value_date(out, &v.date());
                out.push('T');
                self.write_value_time(out, &v.time());
                out.push('\'');
            }
            Value::Uuid(Some(v)) => drop(write!(out, "'{}'", v)),
            _ => self.write_value_none(out),
        };
    }

    fn write_value_none(&self, out: &mut String) {
        out.push_str("NULL")
    }

    fn write_value_bool(&self, out: &mut String, value: bool) {
        out.push_str(["false", "true"][value as usize])
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("'\\x");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    fn write_value_date(&self, out: &mut String, value: &Date) {
        let _ = write!(
            out,
            "{:04}-{:02}-{:02}",
            value.year(),
            value.month() as u8,
            value.day()
        );
    }

    fn write_value_time(&self, out: &mut String, value: &Time) {
        let mut subsecond = value.nanosecond();
        let mut width = 9;
        while width > 1 && subsecond % 10 == 0 {
            subsecond /= 10;
            width -= 1;
        }
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}.{:0width$}",
            value.hour(),
            value.minute(),
            value.second(),
            subsecond
        );
    }

    fn expression_unary_op_precedence(&self, value: &UnaryOpType) -> i32 {
        match value {
            UnaryOpType::Negative => 1250,
            UnaryOpType::Not => 250,
        }
    }

    fn expression_binary_op_precedence(&self, value: &BinaryOpType) -> i32 {
        match value {
            BinaryOpType::Or => 100,
            BinaryOpType::And => 200,
            BinaryOpType::Equal => 300,
            BinaryOpType::NotEqual => 300,
            BinaryOpType::Less => 300,
            BinaryOpType::Greater => 300,
            BinaryOpType::LessEqual => 300,
            BinaryOpType::GreaterEqual => 300,
            BinaryOpType::Is => 400,
            BinaryOpType::IsNot => 400,
            BinaryOpType::Like => 400,
            BinaryOpType::NotLike => 400,
            BinaryOpType::Alias => 1200,
        }
    }

    fn write_expression_operand(&self, out: &mut String, value: &Operand, qualify_columns: bool) {
        let _ = match value {
            Operand::LitBool(v) => self.write_value_bool(out, *v),
            Operand::LitFloat(v) => write_float!(out, *v),
            Operand::LitIdent(v) => out.push_str(v),
            Operand::LitInt(v) => write_integer!(out, *v),
            Operand::LitStr(v) => self.write_value_string(out, v),
            Operand::Null => out.push_str("NULL"),
            Operand::Asterisk => out.push('*'),
            Operand::Column(v) => self.write_column_ref(out, v, qualify_columns),
            Operand::Variable(v) => self.write_value(out, v),
            Operand::Call(f, args) => {
                out.push_str(f);
                out.push('(');
                separated_by(
                    out,
                    args,
                    |out, v| {
                        v.write_query(self.as_dyn(), out, qualify_columns);
                    },
                    ", ",
                );
                out.push(')');
            }
        };
    }

    fn write_expression_unary_op(
        &self,
        out: &mut String,
        value: &UnaryOp<&dyn Expression>,
        qualify_columns: bool,
    ) {
        let _ = match value.op {
            UnaryOpType::Negative => out.push('-'),
            UnaryOpType::Not => out.push_str("NOT "),
        };
        possibly_parenthesized!(
            out,
            value.v.precedence(self.as_dyn()) <= self.expression_unary_op_precedence(&value.op),
            value.v.write_query(self.as_dyn(), out, qualify_columns)
        );
    }

    fn write_expression_binary_op(
        &self,
        out: &mut String,
        value: &BinaryOp<&dyn Expression, &dyn Expression>,
        qualify_columns: bool,
    ) {
        let infix = match value.op {
            BinaryOpType::Is => " IS ",
            BinaryOpType::IsNot => " IS NOT ",
            BinaryOpType::Like => " LIKE ",
            BinaryOpType::NotLike => " NOT LIKE ",
            BinaryOpType::Equal => " = ",
            BinaryOpType::NotEqual => " != ",
            BinaryOpType::Less => " < ",
            BinaryOpType::LessEqual => " <= ",
            BinaryOpType::Greater => " > ",
            BinaryOpType::GreaterEqual => " >= ",
            BinaryOpType::And => " AND ",
            BinaryOpType::Or => " OR ",
            BinaryOpType::Alias => " AS ",
        };
        let precedence = self.expression_binary_op_precedence(&value.op);
        possibly_parenthesized!(
            out,
            value.lhs.precedence(self.as_dyn()) < precedence,
            value.lhs.write_query(self.as_dyn(), out, qualify_columns)
        );
        out.push_str(infix);
        possibly_parenthesized!(
            out,
            value.rhs.precedence(self.as_dyn()) <= precedence,
            value.rhs.write_query(self.as_dyn(), out, qualify_columns)
        );
    }

    fn write_select(&self, out: &mut String, select: &SelectPlan) {
        out.push_str("SELECT ");
        if select.distinct {
            out.push_str("DISTINCT ");
        }
        if !select.distinct_on.is_empty() {
            out.push_str("DISTINCT ON (");
            separated_by(
                out,
                select.distinct_on,
                |out, v| v.write_query(self.as_dyn(), out, false),
                ", ",
            );
            out.push_str(") ");
        }
        let mut aliases = select.aliases.map(|v| v.iter());
        separated_by(
            out,
            select.fields,
            |out, field| {
                field.write_query(self.as_dyn(), out, false);
                if let Some(alias) = aliases.as_mut().and_then(|it| it.next()) {
                    out.push_str(" AS ");
                    self.write_identifier_quoted(out, alias);
                }
            },
            ", ",
        );
        out.push_str(" FROM ");
        self.write_table_ref(out, select.from);
        if let Some(condition) = select.condition {
            out.push_str(" WHERE ");
            condition.write_query(self.as_dyn(), out, false);
        }
        if !select.group_by.is_empty() {
            out.push_str(" GROUP BY ");
            separated_by(
                out,
                select.group_by,
                |out, v| v.write_query(self.as_dyn(), out, false),
                ", ",
            );
        }
        if !select.order_by.is_empty() {
            out.push_str(" ORDER BY ");
            separated_by(
                out,
                select.order_by,
                |out, ordered| {
                    ordered.expression.write_query(self.as_dyn(), out, false);
                    out.push_str(match ordered.order {
                        Order::ASC => " ASC",
                        Order::DESC => " DESC",
                    });
                },
                ", ",
            );
        }
        if let Some(limit) = select.limit {
            out.push_str(" LIMIT ");
            write_integer!(out, limit);
        }
        if let Some(offset) = select.offset {
            out.push_str(" OFFSET ");
            write_integer!(out, offset);
        }
        if select.for_update {
            out.push_str(" FOR UPDATE");
        }
    }

    /// Direct scalar count, usable when no modifier changes the row multiplicity.
    fn write_select_count(
        &self,
        out: &mut String,
        from: &TableRef,
        condition: Option<&dyn Expression>,
    ) {
        out.push_str("SELECT COUNT(*) FROM ");
        self.write_table_ref(out, from);
        if let Some(condition) = condition {
            out.push_str(" WHERE ");
            condition.write_query(self.as_dyn(), out, false);
        }
    }

    /// Counts the rows of the given selection through a derived sub-select.
    fn write_wrapped_count(&self, out: &mut String, select: &SelectPlan) {
        out.push_str("SELECT COUNT(*) FROM (");
        self.write_select(out, select);
        out.push_str(") AS ");
        self.write_identifier_quoted(out, "subquery");
    }

    fn write_insert(
        &self,
        out: &mut String,
        table: &TableRef,
        columns: &[ColumnRef],
        rows: &[Box<[Value]>],
        returning: Option<&ColumnRef>,
    ) {
        if rows.is_empty() {
            return;
        }
        out.push_str("INSERT INTO ");
        self.write_table_ref(out, table);
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, column| self.write_identifier_quoted(out, &column.name),
            ", ",
        );
        out.push_str(") VALUES\n");
        separated_by(
            out,
            rows,
            |out, row| {
                out.push('(');
                separated_by(out, row.iter(), |out, v| self.write_value(out, v), ", ");
                out.push(')');
            },
            ",\n",
        );
        if let Some(column) = returning {
            out.push_str("\nRETURNING ");
            self.write_identifier_quoted(out, &column.name);
        }
    }

    fn write_update(
        &self,
        out: &mut String,
        table: &TableRef,
        assignments: &[(ColumnRef, Value)],
        condition: Option<&dyn Expression>,
    ) {
        if assignments.is_empty() {
            return;
        }
        out.push_str("UPDATE ");
        self.write_table_ref(out, table);
        out.push_str(" SET ");
        separated_by(
            out,
            assignments,
            |out, (column, value)| {
                self.write_identifier_quoted(out, &column.name);
                out.push_str(" = ");
                self.write_value(out, value);
            },
            ", ",
        );
        if let Some(condition) = condition {
            out.push_str(" WHERE ");
            condition.write_query(self.as_dyn(), out, false);
        }
    }

    fn write_delete(&self, out: &mut String, table: &TableRef, condition: Option<&dyn Expression>) {
        out.push_str("DELETE FROM ");
        self.write_table_ref(out, table);
        if let Some(condition) = condition {
            out.push_str(" WHERE ");
            condition.write_query(self.as_dyn(), out, false);
        }
    }
}

/// Writer for the common SQL spelling, the default of drivers that do not
/// override any fragment.
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub const fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
