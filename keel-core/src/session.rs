use crate::{
    BlockingExecutor, Driver, Executor, ForeignKeyDef, QueryResult, Result, RowCursor, RowLabeled,
    RowsAffected, TableRef,
};
use futures::{StreamExt, TryStreamExt};
use std::{
    backtrace::Backtrace,
    pin::pin,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering::Relaxed},
    },
};

pub const DEFAULT_OPEN_ROWS_THRESHOLD: u64 = 64;

/// Gauge of row streams currently open on a session.
///
/// Crossing the threshold logs a single warning with a capture of the call
/// site, the flag rearms once the count falls back under it.
#[derive(Debug)]
pub struct RowTracker {
    threshold: u64,
    open: AtomicU64,
    warned: AtomicBool,
    warnings: AtomicU64,
}

impl RowTracker {
    pub fn new(threshold: u64) -> Arc<Self> {
        Arc::new(Self {
            threshold,
            open: AtomicU64::new(0),
            warned: AtomicBool::new(false),
            warnings: AtomicU64::new(0),
        })
    }

    pub fn track(self: &Arc<Self>) -> OpenRows {
        let count = self.open.fetch_add(1, Relaxed) + 1;
        if count > self.threshold && !self.warned.swap(true, Relaxed) {
            self.warnings.fetch_add(1, Relaxed);
            log::warn!(
                "{} row streams open on the same session, make sure results get drained or dropped, opened at:\n{}",
                count,
                Backtrace::capture(),
            );
        }
        OpenRows {
            tracker: self.clone(),
        }
    }

    pub fn open_count(&self) -> u64 {
        self.open.load(Relaxed)
    }

    pub fn warning_count(&self) -> u64 {
        self.warnings.load(Relaxed)
    }
}

/// Guard of one open row stream, releases its slot on drop.
#[derive(Debug)]
pub struct OpenRows {
    tracker: Arc<RowTracker>,
}

impl Drop for OpenRows {
    fn drop(&mut self) {
        let count = self.tracker.open.fetch_sub(1, Relaxed) - 1;
        if count <= self.tracker.threshold {
            self.tracker.warned.store(false, Relaxed);
        }
    }
}

/// Explicit execution context over one channel of a connection.
///
/// All statement state lives in the statements themselves, the session only
/// carries the channel, the shared metadata cache behind it and the open rows
/// gauge. Two sessions on the same connection share cached catalog entries
/// and nothing else.
pub struct Session<E> {
    channel: E,
    tracker: Arc<RowTracker>,
}

impl<E> Session<E> {
    pub fn new(channel: E) -> Self {
        Self {
            channel,
            tracker: RowTracker::new(DEFAULT_OPEN_ROWS_THRESHOLD),
        }
    }

    pub fn with_open_rows_threshold(channel: E, threshold: u64) -> Self {
        Self {
            channel,
            tracker: RowTracker::new(threshold),
        }
    }

    pub fn channel(&self) -> &E {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut E {
        &mut self.channel
    }

    pub fn row_tracker(&self) -> &Arc<RowTracker> {
        &self.tracker
    }

    pub async fn execute(&mut self, sql: String) -> Result<RowsAffected>
    where
        E: Executor,
    {
        self.channel.execute(sql).await
    }

    pub async fn fetch_one(&mut self, sql: String) -> Result<Option<RowLabeled>>
    where
        E: Executor,
    {
        let mut stream = pin!(self.channel.fetch(sql));
        stream.next().await.transpose()
    }

    pub async fn run_collect(&mut self, sql: String) -> Result<Vec<QueryResult>>
    where
        E: Executor,
    {
        self.channel.run(sql).try_collect().await
    }

    pub async fn current_schema(&mut self) -> Result<String>
    where
        E: Executor,
    {
        let cache = self.channel.metadata().clone();
        let channel = &mut self.channel;
        cache
            .current_schema_for(|| channel.fetch_current_schema())
            .await
    }

    pub async fn schema_names(&mut self) -> Result<Arc<[String]>>
    where
        E: Executor,
    {
        let cache = self.channel.metadata().clone();
        let channel = &mut self.channel;
        cache.schema_names_for(|| channel.fetch_schema_names()).await
    }

    /// Table names of the current schema.
    pub async fn all_table_names(&mut self) -> Result<Arc<[String]>>
    where
        E: Executor,
    {
        let schema = self.current_schema().await?;
        let cache = self.channel.metadata().clone();
        let channel = &mut self.channel;
        cache
            .table_names_for(&schema, || channel.fetch_table_names(&schema))
            .await
    }

    pub async fn all_table_names_in_all_schemas(&mut self) -> Result<Vec<String>>
    where
        E: Executor,
    {
        let schemas = self.schema_names().await?;
        let qualified = self.channel.driver().qualified_metadata_names();
        let mut result = Vec::new();
        for schema in schemas.iter() {
            let cache = self.channel.metadata().clone();
            let channel = &mut self.channel;
            let names = cache
                .table_names_for(schema, || channel.fetch_table_names(schema))
                .await?;
            if qualified {
                result.extend(names.iter().map(|name| format!("{}.{}", schema, name)));
            } else {
                result.extend(names.iter().cloned());
            }
        }
        Ok(result)
    }

    /// Whether the table is visible, in its declared schema or the current
    /// one when unqualified.
    pub async fn table_exists(&mut self, table: &TableRef) -> Result<bool>
    where
        E: Executor,
    {
        let normalized = self.channel.driver().normalize_identifier(&table.name);
        let schema = if table.schema.is_empty() {
            self.current_schema().await?
        } else {
            table.schema.to_string()
        };
        let cache = self.channel.metadata().clone();
        let channel = &mut self.channel;
        let names = cache
            .table_names_for(&schema, || channel.fetch_table_names(&schema))
            .await?;
        // Catalogs may report names in a different case than the probe.
        let driver = self.channel.driver();
        Ok(names
            .iter()
            .any(|name| driver.normalize_identifier(name) == normalized))
    }

    /// Foreign keys of the requested tables, in request order. Tables missing
    /// from the cache are fetched together in one round trip.
    pub async fn column_constraints(
        &mut self,
        tables: &[&str],
    ) -> Result<Vec<Arc<[ForeignKeyDef]>>>
    where
        E: Executor,
    {
        let (qualified, mut keys) = {
            let driver = self.channel.driver();
            (
                driver.qualified_metadata_names(),
                tables
                    .iter()
                    .map(|table| driver.normalize_identifier(table))
                    .collect::<Vec<_>>(),
            )
        };
        if qualified {
            let schema = self.current_schema().await?;
            for key in &mut keys {
                *key = format!("{}.{}", schema, key);
            }
        }
        let cache = self.channel.metadata().clone();
        let channel = &mut self.channel;
        cache
            .foreign_keys_for(&keys, |missing| channel.fetch_foreign_keys(missing))
            .await
    }

    pub async fn foreign_keys(&mut self, table: &str) -> Result<Arc<[ForeignKeyDef]>>
    where
        E: Executor,
    {
        let mut constraints = self.column_constraints(&[table]).await?;
        Ok(constraints.swap_remove(0))
    }

    /// Invalidates cached table level metadata, next lookups hit the backend.
    pub async fn reset_caches(&mut self)
    where
        E: Executor,
    {
        self.channel.metadata().reset_caches().await;
        self.channel.clear_cached_metadata();
    }

    pub async fn reset_schema_caches(&mut self)
    where
        E: Executor,
    {
        self.channel.metadata().reset_schema_caches().await;
        self.channel.clear_cached_metadata();
    }

    pub fn execute_blocking(&mut self, sql: String) -> Result<RowsAffected>
    where
        E: BlockingExecutor,
    {
        self.channel.execute_blocking(sql)
    }

    pub fn fetch_one_blocking(&mut self, sql: String) -> Result<Option<RowLabeled>>
    where
        E: BlockingExecutor,
    {
        let mut cursor = self.channel.run_blocking(sql)?;
        let mut found = None;
        let outcome = loop {
            match cursor.next_result() {
                Ok(Some(QueryResult::Row(row))) => {
                    found = Some(row);
                    break Ok(());
                }
                Ok(Some(..)) => {}
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        let closed = cursor.close();
        outcome?;
        closed?;
        Ok(found)
    }

    pub fn run_collect_blocking(&mut self, sql: String) -> Result<Vec<QueryResult>>
    where
        E: BlockingExecutor,
    {
        let mut cursor = self.channel.run_blocking(sql)?;
        let mut results = Vec::new();
        let outcome = loop {
            match cursor.next_result() {
                Ok(Some(result)) => results.push(result),
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        let closed = cursor.close();
        outcome?;
        closed?;
        Ok(results)
    }

    pub fn current_schema_blocking(&mut self) -> Result<String>
    where
        E: BlockingExecutor,
    {
        let cache = self.channel.metadata().clone();
        let channel = &mut self.channel;
        cache.current_schema_for_blocking(|| channel.fetch_current_schema_blocking())
    }

    pub fn all_table_names_blocking(&mut self) -> Result<Arc<[String]>>
    where
        E: BlockingExecutor,
    {
        let schema = self.current_schema_blocking()?;
        let cache = self.channel.metadata().clone();
        let channel = &mut self.channel;
        cache.table_names_for_blocking(&schema, || channel.fetch_table_names_blocking(&schema))
    }

    pub fn table_exists_blocking(&mut self, table: &TableRef) -> Result<bool>
    where
        E: BlockingExecutor,
    {
        let normalized = self.channel.driver().normalize_identifier(&table.name);
        let schema = if table.schema.is_empty() {
            self.current_schema_blocking()?
        } else {
            table.schema.to_string()
        };
        let cache = self.channel.metadata().clone();
        let channel = &mut self.channel;
        let names =
            cache.table_names_for_blocking(&schema, || channel.fetch_table_names_blocking(&schema))?;
        let driver = self.channel.driver();
        Ok(names
            .iter()
            .any(|name| driver.normalize_identifier(name) == normalized))
    }

    pub fn column_constraints_blocking(
        &mut self,
        tables: &[&str],
    ) -> Result<Vec<Arc<[ForeignKeyDef]>>>
    where
        E: BlockingExecutor,
    {
        let (qualified, mut keys) = {
            let driver = self.channel.driver();
            (
                driver.qualified_metadata_names(),
                tables
                    .iter()
                    .map(|table| driver.normalize_identifier(table))
                    .collect::<Vec<_>>(),
            )
        };
        if qualified {
            let schema = self.current_schema_blocking()?;
            for key in &mut keys {
                *key = format!("{}.{}", schema, key);
            }
        }
        let cache = self.channel.metadata().clone();
        let channel = &mut self.channel;
        cache.foreign_keys_for_blocking(&keys, |missing| {
            channel.fetch_foreign_keys_blocking(missing)
        })
    }

    pub fn foreign_keys_blocking(&mut self, table: &str) -> Result<Arc<[ForeignKeyDef]>>
    where
        E: BlockingExecutor,
    {
        let mut constraints = self.column_constraints_blocking(&[table])?;
        Ok(constraints.swap_remove(0))
    }

    pub fn reset_caches_blocking(&mut self)
    where
        E: BlockingExecutor,
    {
        self.channel.metadata().reset_caches_blocking();
        self.channel.clear_cached_metadata();
    }
}
