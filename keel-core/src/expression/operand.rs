use crate::{ColumnRef, Expression, OpPrecedence, SqlWriter, Value};

/// Leaf expression nodes.
#[derive(Debug, Clone)]
pub enum Operand {
    LitBool(bool),
    LitFloat(f64),
    LitIdent(&'static str),
    LitInt(i64),
    LitStr(&'static str),
    Null,
    Asterisk,
    Column(ColumnRef),
    Variable(Value),
    Call(&'static str, Vec<Operand>),
}

impl OpPrecedence for Operand {
    fn precedence(&self, _writer: &dyn SqlWriter) -> i32 {
        1_000_000_000
    }
}

impl Expression for Operand {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        writer.write_expression_operand(out, self, qualify_columns);
    }
    fn as_column(&self) -> Option<&ColumnRef> {
        match self {
            Operand::Column(column) => Some(column),
            _ => None,
        }
    }
}

impl PartialEq for Operand {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::LitBool(l), Self::LitBool(r)) => l == r,
            (Self::LitFloat(l), Self::LitFloat(r)) => l == r,
            (Self::LitIdent(l), Self::LitIdent(r)) => l == r,
            (Self::LitInt(l), Self::LitInt(r)) => l == r,
            (Self::LitStr(l), Self::LitStr(r)) => l == r,
            (Self::Null, Self::Null) => true,
            (Self::Asterisk, Self::Asterisk) => true,
            (Self::Column(l), Self::Column(r)) => l == r,
            (Self::Variable(l), Self::Variable(r)) => l == r,
            (Self::Call(l, l_args), Self::Call(r, r_args)) => l == r && l_args == r_args,
            _ => false,
        }
    }
}
