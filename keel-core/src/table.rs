use crate::ColumnDef;
use std::borrow::Cow;

/// Qualified table identity (schema + name).
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub name: Cow<'static, str>,
    pub schema: Cow<'static, str>,
}

impl TableRef {
    pub fn new(
        schema: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
        }
    }

    /// Table without an explicit schema, resolved against the connection's
    /// current schema when metadata comparisons need one.
    pub fn unqualified(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            schema: Cow::Borrowed(""),
        }
    }

    pub fn full_name(&self) -> String {
        let mut result = String::new();
        if !self.schema.is_empty() {
            result.push_str(&self.schema);
            result.push('.');
        }
        result.push_str(&self.name);
        result
    }
}

/// A table definition: identity plus the ordered column sequence.
///
/// Treated as immutable once a statement has been built against it.
#[derive(Debug, Clone)]
pub struct TableDef {
    table_ref: TableRef,
    columns: Vec<ColumnDef>,
}

impl TableDef {
    pub fn new(table_ref: TableRef, columns: Vec<ColumnDef>) -> Self {
        Self { table_ref, columns }
    }

    pub fn table_ref(&self) -> &TableRef {
        &self.table_ref
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// The column whose value the database assigns on insert, when declared.
    pub fn auto_increment_column(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.auto_increment)
    }
}
