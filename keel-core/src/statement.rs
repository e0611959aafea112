use crate::{
    BinaryOp, BinaryOpType, BlockingExecutor, ColumnRef, Driver, Executor, Expression, Result,
    RowsAffected, Session, SqlWriter, TableRef, Value,
};
use anyhow::bail;
use std::sync::Arc;

pub(crate) fn combined_condition(
    existing: Option<Arc<dyn Expression>>,
    added: impl Expression + 'static,
    op: BinaryOpType,
) -> Arc<dyn Expression> {
    match existing {
        Some(lhs) => Arc::new(BinaryOp {
            op,
            lhs,
            rhs: Arc::new(added) as Arc<dyn Expression>,
        }),
        None => Arc::new(added),
    }
}

/// UPDATE over a single table.
///
/// With no assignments the statement is a no-op: `render` produces nothing
/// and `execute` reports zero affected rows without a round trip.
#[derive(Debug)]
pub struct UpdateStatement {
    table: TableRef,
    assignments: Vec<(ColumnRef, Value)>,
    condition: Option<Arc<dyn Expression>>,
}

impl UpdateStatement {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            assignments: Vec::new(),
            condition: None,
        }
    }

    pub fn set(mut self, column: ColumnRef, value: impl Into<Value>) -> Self {
        self.assignments.push((column, value.into()));
        self
    }

    pub fn filter(mut self, condition: impl Expression + 'static) -> Result<Self> {
        if self.condition.is_some() {
            bail!("Condition is already set, use and_filter or or_filter to combine");
        }
        self.condition = Some(Arc::new(condition));
        Ok(self)
    }

    pub fn and_filter(mut self, condition: impl Expression + 'static) -> Self {
        self.condition = Some(combined_condition(
            self.condition.take(),
            condition,
            BinaryOpType::And,
        ));
        self
    }

    pub fn or_filter(mut self, condition: impl Expression + 'static) -> Self {
        self.condition = Some(combined_condition(
            self.condition.take(),
            condition,
            BinaryOpType::Or,
        ));
        self
    }

    pub fn render(&self, writer: &dyn SqlWriter) -> Option<String> {
        if self.assignments.is_empty() {
            return None;
        }
        let mut out = String::with_capacity(256);
        writer.write_update(
            &mut out,
            &self.table,
            &self.assignments,
            self.condition.as_deref(),
        );
        Some(out)
    }

    pub async fn execute<E: Executor>(&self, session: &mut Session<E>) -> Result<RowsAffected> {
        let writer = session.channel().driver().sql_writer();
        match self.render(writer.as_dyn()) {
            Some(sql) => session.execute(sql).await,
            None => Ok(RowsAffected::default()),
        }
    }

    pub fn execute_blocking<E: BlockingExecutor>(
        &self,
        session: &mut Session<E>,
    ) -> Result<RowsAffected> {
        let writer = session.channel().driver().sql_writer();
        match self.render(writer.as_dyn()) {
            Some(sql) => session.execute_blocking(sql),
            None => Ok(RowsAffected::default()),
        }
    }
}

/// Single row INSERT. Multi row loads go through
/// [`BatchInsertStatement`](crate::BatchInsertStatement).
#[derive(Debug)]
pub struct InsertStatement {
    table: TableRef,
    columns: Vec<ColumnRef>,
    values: Vec<Value>,
}

impl InsertStatement {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn set(mut self, column: ColumnRef, value: impl Into<Value>) -> Self {
        self.columns.push(column);
        self.values.push(value.into());
        self
    }

    pub fn render(&self, writer: &dyn SqlWriter) -> Option<String> {
        if self.columns.is_empty() {
            return None;
        }
        let mut out = String::with_capacity(256);
        writer.write_insert(
            &mut out,
            &self.table,
            &self.columns,
            &[self.values.clone().into_boxed_slice()],
            None,
        );
        Some(out)
    }

    pub async fn execute<E: Executor>(&self, session: &mut Session<E>) -> Result<RowsAffected> {
        let writer = session.channel().driver().sql_writer();
        match self.render(writer.as_dyn()) {
            Some(sql) => session.execute(sql).await,
            None => Ok(RowsAffected::default()),
        }
    }

    pub fn execute_blocking<E: BlockingExecutor>(
        &self,
        session: &mut Session<E>,
    ) -> Result<RowsAffected> {
        let writer = session.channel().driver().sql_writer();
        match self.render(writer.as_dyn()) {
            Some(sql) => session.execute_blocking(sql),
            None => Ok(RowsAffected::default()),
        }
    }
}

/// DELETE over a single table, unconditional when no filter is set.
#[derive(Debug)]
pub struct DeleteStatement {
    table: TableRef,
    condition: Option<Arc<dyn Expression>>,
}

impl DeleteStatement {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            condition: None,
        }
    }

    pub fn filter(mut self, condition: impl Expression + 'static) -> Result<Self> {
        if self.condition.is_some() {
            bail!("Condition is already set, use and_filter or or_filter to combine");
        }
        self.condition = Some(Arc::new(condition));
        Ok(self)
    }

    pub fn and_filter(mut self, condition: impl Expression + 'static) -> Self {
        self.condition = Some(combined_condition(
            self.condition.take(),
            condition,
            BinaryOpType::And,
        ));
        self
    }

    pub fn or_filter(mut self, condition: impl Expression + 'static) -> Self {
        self.condition = Some(combined_condition(
            self.condition.take(),
            condition,
            BinaryOpType::Or,
        ));
        self
    }

    pub fn render(&self, writer: &dyn SqlWriter) -> String {
        let mut out = String::with_capacity(128);
        writer.write_delete(&mut out, &self.table, self.condition.as_deref());
        out
    }

    pub async fn execute<E: Executor>(&self, session: &mut Session<E>) -> Result<RowsAffected> {
        let writer = session.channel().driver().sql_writer();
        let sql = self.render(writer.as_dyn());
        session.execute(sql).await
    }

    pub fn execute_blocking<E: BlockingExecutor>(
        &self,
        session: &mut Session<E>,
    ) -> Result<RowsAffected> {
        let writer = session.channel().driver().sql_writer();
        let sql = self.render(writer.as_dyn());
        session.execute_blocking(sql)
    }
}
