use crate::{ColumnRef, OpPrecedence, SqlWriter, Value};
use std::{fmt::Debug, sync::Arc};

/// A renderable SQL expression node.
pub trait Expression: OpPrecedence + Send + Sync + Debug {
    /// Serialize the expression into the output string using the sql writer.
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool);
    /// The plain column this expression stands for, when it is one.
    fn as_column(&self) -> Option<&ColumnRef> {
        None
    }
}

impl<T: Expression> Expression for &T {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        (*self).write_query(writer, out, qualify_columns);
    }
    fn as_column(&self) -> Option<&ColumnRef> {
        (*self).as_column()
    }
}

impl Expression for &dyn Expression {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        (*self).write_query(writer, out, qualify_columns);
    }
    fn as_column(&self) -> Option<&ColumnRef> {
        (*self).as_column()
    }
}

impl Expression for Arc<dyn Expression> {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        self.as_ref().write_query(writer, out, qualify_columns);
    }
    fn as_column(&self) -> Option<&ColumnRef> {
        self.as_ref().as_column()
    }
}

impl Expression for () {
    fn write_query(&self, _writer: &dyn SqlWriter, _out: &mut String, _qualify_columns: bool) {}
}

impl Expression for bool {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, _qualify_columns: bool) {
        writer.write_value_bool(out, *self);
    }
}

impl Expression for Value {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, _qualify_columns: bool) {
        writer.write_value(out, self);
    }
}

impl<'a, T: Expression> From<&'a T> for &'a dyn Expression {
    fn from(value: &'a T) -> Self {
        value as &'a dyn Expression
    }
}
