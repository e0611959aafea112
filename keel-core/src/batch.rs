use crate::{
    BlockingExecutor, ColumnRef, Driver, Executor, QueryResult, Result, RowCursor, Session,
    SqlWriter, TableDef, Value,
};
use anyhow::bail;
use futures::StreamExt;
use std::{fmt, pin::pin};

/// The batch carries more rows than the dialect accepts in one INSERT.
///
/// Raised by [`BatchInsertStatement::validate`] before any round trip, typed
/// so callers can downcast and split the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchLimitExceeded {
    pub rows: usize,
    pub limit: usize,
}

impl fmt::Display for BatchLimitExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Batch of {} rows exceeds the maximum of {} rows per INSERT",
            self.rows, self.limit
        )
    }
}

impl std::error::Error for BatchLimitExceeded {}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchInsertResult {
    pub rows_affected: u64,
    pub generated_keys: Vec<i64>,
}

/// Multi row INSERT with a fixed column layout.
///
/// The first row added decides the columns, every following row must carry
/// the same ones in the same order. When the table has an auto increment
/// column the batch does not populate, generated keys are read back through
/// RETURNING, or reconstructed from the last inserted id on backends without
/// it.
#[derive(Debug)]
pub struct BatchInsertStatement {
    table: TableDef,
    columns: Vec<ColumnRef>,
    rows: Vec<Box<[Value]>>,
}

impl BatchInsertStatement {
    pub fn new(table: TableDef) -> Self {
        Self {
            table,
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn add_row(&mut self, row: impl IntoIterator<Item = (ColumnRef, Value)>) -> Result<()> {
        let mut values = Vec::with_capacity(self.columns.len());
        if self.rows.is_empty() && self.columns.is_empty() {
            for (column, value) in row {
                self.columns.push(column);
                values.push(value);
            }
        } else {
            for (i, (column, value)) in row.into_iter().enumerate() {
                match self.columns.get(i) {
                    Some(expected) if *expected == column => values.push(value),
                    Some(expected) => bail!(
                        "Row {} column {} is {} while the batch layout expects {}",
                        self.rows.len(),
                        i,
                        column.name,
                        expected.name,
                    ),
                    None => bail!(
                        "Row {} carries more than the {} columns of the batch layout",
                        self.rows.len(),
                        self.columns.len(),
                    ),
                }
            }
            if values.len() != self.columns.len() {
                bail!(
                    "Row {} carries {} values while the batch layout expects {}",
                    self.rows.len(),
                    values.len(),
                    self.columns.len(),
                );
            }
        }
        self.rows.push(values.into_boxed_slice());
        Ok(())
    }

    /// Checks the batch against the dialect row ceiling, before any round trip.
    pub fn validate(&self, limit: Option<usize>) -> std::result::Result<(), BatchLimitExceeded> {
        match limit {
            Some(limit) if self.rows.len() > limit => Err(BatchLimitExceeded {
                rows: self.rows.len(),
                limit,
            }),
            _ => Ok(()),
        }
    }

    /// The auto increment column the batch leaves for the backend to fill.
    fn generated_column(&self) -> Option<&crate::ColumnDef> {
        self.table
            .auto_increment_column()
            .filter(|column| !self.columns.iter().any(|c| c.name == column.name()))
    }

    pub fn render(&self, writer: &dyn SqlWriter, returning: Option<&ColumnRef>) -> Option<String> {
        if self.rows.is_empty() {
            return None;
        }
        let mut out = String::with_capacity(64 * (self.rows.len() + 1));
        writer.write_insert(&mut out, self.table.table_ref(), &self.columns, &self.rows, returning);
        Some(out)
    }

    pub async fn execute<E: Executor>(
        &self,
        session: &mut Session<E>,
    ) -> Result<BatchInsertResult> {
        let driver = session.channel().driver();
        self.validate(driver.max_insert_rows())?;
        let returning = if driver.supports_returning() {
            self.generated_column().map(|c| c.column_ref.clone())
        } else {
            None
        };
        let writer = driver.sql_writer();
        let Some(sql) = self.render(writer.as_dyn(), returning.as_ref()) else {
            return Ok(BatchInsertResult::default());
        };
        if returning.is_some() {
            let mut result = BatchInsertResult::default();
            {
                let mut stream = pin!(session.channel_mut().run(sql));
                while let Some(item) = stream.next().await {
                    match item? {
                        QueryResult::Row(row) => {
                            if let Some(key) = row.values.first().and_then(key_value) {
                                result.generated_keys.push(key);
                            }
                        }
                        QueryResult::Affected(affected) => {
                            result.rows_affected += affected.rows_affected;
                        }
                    }
                }
            }
            if result.rows_affected == 0 {
                result.rows_affected = result.generated_keys.len() as u64;
            }
            Ok(result)
        } else {
            let affected = session.execute(sql).await?;
            Ok(self.fallback_result(affected))
        }
    }

    pub fn execute_blocking<E: BlockingExecutor>(
        &self,
        session: &mut Session<E>,
    ) -> Result<BatchInsertResult> {
        let driver = session.channel().driver();
        self.validate(driver.max_insert_rows())?;
        let returning = if driver.supports_returning() {
            self.generated_column().map(|c| c.column_ref.clone())
        } else {
            None
        };
        let writer = driver.sql_writer();
        let Some(sql) = self.render(writer.as_dyn(), returning.as_ref()) else {
            return Ok(BatchInsertResult::default());
        };
        if returning.is_some() {
            let mut result = BatchInsertResult::default();
            let mut cursor = session.channel_mut().run_blocking(sql)?;
            let outcome = loop {
                match cursor.next_result() {
                    Ok(Some(QueryResult::Row(row))) => {
                        if let Some(key) = row.values.first().and_then(key_value) {
                            result.generated_keys.push(key);
                        }
                    }
                    Ok(Some(QueryResult::Affected(affected))) => {
                        result.rows_affected += affected.rows_affected;
                    }
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e),
                }
            };
            let closed = cursor.close();
            outcome?;
            closed?;
            if result.rows_affected == 0 {
                result.rows_affected = result.generated_keys.len() as u64;
            }
            Ok(result)
        } else {
            let affected = session.execute_blocking(sql)?;
            Ok(self.fallback_result(affected))
        }
    }

    /// Reconstructs contiguous generated keys from the last inserted id when
    /// the backend cannot report them directly.
    fn fallback_result(&self, affected: crate::RowsAffected) -> BatchInsertResult {
        let mut generated_keys = Vec::new();
        if self.generated_column().is_some() {
            if let Some(last) = affected.last_affected_id {
                let count = self.rows.len() as i64;
                generated_keys.extend((last - count + 1)..=last);
            }
        }
        BatchInsertResult {
            rows_affected: affected.rows_affected,
            generated_keys,
        }
    }
}

fn key_value(value: &Value) -> Option<i64> {
    match value {
        Value::Int16(Some(v)) => Some(*v as i64),
        Value::Int32(Some(v)) => Some(*v as i64),
        Value::Int64(Some(v)) => Some(*v),
        Value::UInt64(Some(v)) => i64::try_from(*v).ok(),
        _ => None,
    }
}
