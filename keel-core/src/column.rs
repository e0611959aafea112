use crate::{
    BinaryOp, BinaryOpType, Expression, OpPrecedence, Operand, SqlWriter, TableRef, Value,
};
use std::borrow::Cow;

/// Fully-qualified reference to a table column.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Column name.
    pub name: Cow<'static, str>,
    /// Table name.
    pub table: Cow<'static, str>,
    /// Schema name (may be empty).
    pub schema: Cow<'static, str>,
}

impl ColumnRef {
    pub fn new(
        table: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            schema: Cow::Borrowed(""),
        }
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef {
            name: self.table.clone(),
            schema: self.schema.clone(),
        }
    }

    pub fn eq(&self, value: impl Into<Value>) -> BinaryOp<ColumnRef, Operand> {
        self.compare(BinaryOpType::Equal, value)
    }

    pub fn ne(&self, value: impl Into<Value>) -> BinaryOp<ColumnRef, Operand> {
        self.compare(BinaryOpType::NotEqual, value)
    }

    pub fn lt(&self, value: impl Into<Value>) -> BinaryOp<ColumnRef, Operand> {
        self.compare(BinaryOpType::Less, value)
    }

    pub fn gt(&self, value: impl Into<Value>) -> BinaryOp<ColumnRef, Operand> {
        self.compare(BinaryOpType::Greater, value)
    }

    pub fn like(&self, value: impl Into<Value>) -> BinaryOp<ColumnRef, Operand> {
        self.compare(BinaryOpType::Like, value)
    }

    fn compare(&self, op: BinaryOpType, value: impl Into<Value>) -> BinaryOp<ColumnRef, Operand> {
        BinaryOp {
            op,
            lhs: self.clone(),
            rhs: Operand::Variable(value.into()),
        }
    }
}

/// Indicates how (or if) a column participates in the primary key.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyType {
    /// Single-column primary key.
    PrimaryKey,
    /// Member of a composite primary key.
    PartOfPrimaryKey,
    /// Not part of the primary key.
    #[default]
    None,
}

/// Declarative specification of a table column.
#[derive(Default, Debug, Clone)]
pub struct ColumnDef {
    /// Column identity.
    pub column_ref: ColumnRef,
    /// `Value` describing the column type (decimal precision included).
    pub value: Value,
    /// Nullability flag.
    pub nullable: bool,
    /// The database assigns this column's value on insert.
    pub auto_increment: bool,
    /// Primary key participation.
    pub primary_key: PrimaryKeyType,
    /// Unique constraint (single column only).
    pub unique: bool,
    /// Default value rendered when the column is omitted.
    pub default: Option<Value>,
}

impl ColumnDef {
    pub fn name(&self) -> &str {
        &self.column_ref.name
    }
    pub fn table(&self) -> &str {
        &self.column_ref.table
    }
    pub fn schema(&self) -> &str {
        &self.column_ref.schema
    }
}

impl<'a> From<&'a ColumnDef> for &'a ColumnRef {
    fn from(value: &'a ColumnDef) -> Self {
        &value.column_ref
    }
}

impl OpPrecedence for ColumnRef {
    fn precedence(&self, _writer: &dyn SqlWriter) -> i32 {
        1_000_000
    }
}

impl Expression for ColumnRef {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        writer.write_column_ref(out, self, qualify_columns);
    }
    fn as_column(&self) -> Option<&ColumnRef> {
        Some(self)
    }
}

impl OpPrecedence for ColumnDef {
    fn precedence(&self, _writer: &dyn SqlWriter) -> i32 {
        1_000_000
    }
}

impl Expression for ColumnDef {
    fn write_query(&self, writer: &dyn SqlWriter, out: &mut String, qualify_columns: bool) {
        writer.write_column_ref(out, &self.column_ref, qualify_columns);
    }
    fn as_column(&self) -> Option<&ColumnRef> {
        Some(&self.column_ref)
    }
}
