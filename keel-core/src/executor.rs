use crate::{
    Driver, ForeignKeyDef, MetadataCache, QueryResult, Result, RowLabeled, RowsAffected,
    truncate_long,
};
use futures::{Future, Stream, StreamExt, TryStreamExt, future::ready};
use std::{collections::HashMap, sync::Arc};

/// Streaming side of a connection.
///
/// `run` is the single entry point every statement goes through, the other
/// methods shape its output. Catalog round trips live here as well so the
/// session can route them through the shared [`MetadataCache`].
pub trait Executor: Send {
    type Driver: Driver;

    fn driver(&self) -> &Self::Driver;

    /// Dialect metadata cache shared by every session on this connection.
    fn metadata(&self) -> &Arc<MetadataCache>;

    fn run(&mut self, sql: String) -> impl Stream<Item = Result<QueryResult>> + Send;

    /// Runs the statement keeping only the rows it produces.
    fn fetch(&mut self, sql: String) -> impl Stream<Item = Result<RowLabeled>> + Send {
        self.run(sql).filter_map(|v| {
            ready(match v {
                Ok(QueryResult::Row(row)) => Some(Ok(row)),
                Ok(..) => None,
                Err(e) => Some(Err(e)),
            })
        })
    }

    /// Runs the statement draining the stream into the cumulated counts.
    fn execute(&mut self, sql: String) -> impl Future<Output = Result<RowsAffected>> + Send {
        log::debug!("Executing: {}", truncate_long!(sql));
        self.run(sql)
            .try_fold(RowsAffected::default(), |mut acc, v| async move {
                if let QueryResult::Affected(affected) = v {
                    acc.extend([affected]);
                }
                Ok(acc)
            })
    }

    fn fetch_table_names(
        &mut self,
        schema: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn fetch_schema_names(&mut self) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn fetch_current_schema(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// One catalog round trip covering every requested table.
    fn fetch_foreign_keys(
        &mut self,
        tables: Vec<String>,
    ) -> impl Future<Output = Result<HashMap<String, Vec<ForeignKeyDef>>>> + Send;

    /// Drops whatever metadata the connection layer caches on its own.
    fn clear_cached_metadata(&mut self) {}
}

/// Incremental reader over the results of a blocking statement.
pub trait RowCursor {
    fn next_result(&mut self) -> Result<Option<QueryResult>>;

    /// Releases the server side resources of the cursor.
    fn close(&mut self) -> Result<()>;
}

/// Blocking side of a connection, for callers without an async runtime.
pub trait BlockingExecutor: Send {
    type Driver: Driver;
    type Cursor: RowCursor;

    fn driver(&self) -> &Self::Driver;

    fn metadata(&self) -> &Arc<MetadataCache>;

    fn run_blocking(&mut self, sql: String) -> Result<Self::Cursor>;

    fn execute_blocking(&mut self, sql: String) -> Result<RowsAffected> {
        log::debug!("Executing: {}", truncate_long!(sql));
        let mut cursor = self.run_blocking(sql)?;
        let mut acc = RowsAffected::default();
        // The cursor is closed even when a read fails mid walk.
        let outcome = loop {
            match cursor.next_result() {
                Ok(Some(QueryResult::Affected(affected))) => acc.extend([affected]),
                Ok(Some(..)) => {}
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        let closed = cursor.close();
        outcome?;
        closed?;
        Ok(acc)
    }

    fn fetch_table_names_blocking(&mut self, schema: &str) -> Result<Vec<String>>;

    fn fetch_schema_names_blocking(&mut self) -> Result<Vec<String>>;

    fn fetch_current_schema_blocking(&mut self) -> Result<String>;

    fn fetch_foreign_keys_blocking(
        &mut self,
        tables: Vec<String>,
    ) -> Result<HashMap<String, Vec<ForeignKeyDef>>>;

    fn clear_cached_metadata(&mut self) {}
}
