use crate::MemoryDriver;
use anyhow::bail;
use futures::{Stream, stream};
use keel_core::{
    BlockingExecutor, Executor, ForeignKeyDef, MetadataCache, QueryResult, Result, Row,
    RowCursor, RowLabeled, RowNames, RowsAffected, Value, truncate_long,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

/// Scripted connection, one popped result set per round trip.
pub struct MemoryConnection {
    driver: MemoryDriver,
    metadata: Arc<MetadataCache>,
    scripted: VecDeque<Vec<QueryResult>>,
    statement_log: Vec<String>,
    round_trips: usize,
    metadata_fetches: usize,
    metadata_clears: usize,
    current_schema: String,
    schemas: Vec<String>,
    tables: HashMap<String, Vec<String>>,
    foreign_keys: HashMap<String, Vec<ForeignKeyDef>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::with_driver(MemoryDriver::default())
    }

    pub fn with_driver(driver: MemoryDriver) -> Self {
        Self {
            driver,
            metadata: MetadataCache::new(),
            scripted: VecDeque::new(),
            statement_log: Vec::new(),
            round_trips: 0,
            metadata_fetches: 0,
            metadata_clears: 0,
            current_schema: "main".into(),
            schemas: vec!["main".into()],
            tables: HashMap::new(),
            foreign_keys: HashMap::new(),
        }
    }

    /// Connection sharing the metadata cache of another one, the way two
    /// sessions of the same backend connection would.
    pub fn sharing_metadata(&self) -> Self {
        let mut other = Self::with_driver(self.driver.clone());
        other.metadata = self.metadata.clone();
        other.current_schema = self.current_schema.clone();
        other.schemas = self.schemas.clone();
        other.tables = self.tables.clone();
        other.foreign_keys = self.foreign_keys.clone();
        other
    }

    /// Queues the result set the next round trip returns.
    pub fn script(&mut self, results: Vec<QueryResult>) {
        self.scripted.push_back(results);
    }

    pub fn statement_log(&self) -> &[String] {
        &self.statement_log
    }

    pub fn round_trips(&self) -> usize {
        self.round_trips
    }

    pub fn metadata_fetches(&self) -> usize {
        self.metadata_fetches
    }

    pub fn metadata_clears(&self) -> usize {
        self.metadata_clears
    }

    pub fn set_current_schema(&mut self, schema: impl Into<String>) {
        self.current_schema = schema.into();
    }

    pub fn add_schema(&mut self, schema: impl Into<String>) {
        self.schemas.push(schema.into());
    }

    pub fn add_table(&mut self, schema: impl Into<String>, table: impl Into<String>) {
        self.tables.entry(schema.into()).or_default().push(table.into());
    }

    pub fn add_foreign_key(&mut self, table: impl Into<String>, key: ForeignKeyDef) {
        self.foreign_keys.entry(table.into()).or_default().push(key);
    }

    fn foreign_keys_of(&self, tables: &[String]) -> HashMap<String, Vec<ForeignKeyDef>> {
        tables
            .iter()
            .map(|table| {
                (
                    table.clone(),
                    self.foreign_keys.get(table).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }

    fn take_scripted(&mut self, sql: String) -> Vec<QueryResult> {
        log::trace!("Running: {}", truncate_long!(sql));
        self.statement_log.push(sql);
        self.round_trips += 1;
        self.scripted.pop_front().unwrap_or_default()
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for MemoryConnection {
    type Driver = MemoryDriver;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    fn metadata(&self) -> &Arc<MetadataCache> {
        &self.metadata
    }

    fn run(&mut self, sql: String) -> impl Stream<Item = Result<QueryResult>> + Send {
        stream::iter(self.take_scripted(sql).into_iter().map(Ok))
    }

    async fn fetch_table_names(&mut self, schema: &str) -> Result<Vec<String>> {
        self.metadata_fetches += 1;
        Ok(self.tables.get(schema).cloned().unwrap_or_default())
    }

    async fn fetch_schema_names(&mut self) -> Result<Vec<String>> {
        self.metadata_fetches += 1;
        Ok(self.schemas.clone())
    }

    async fn fetch_current_schema(&mut self) -> Result<String> {
        self.metadata_fetches += 1;
        Ok(self.current_schema.clone())
    }

    async fn fetch_foreign_keys(
        &mut self,
        tables: Vec<String>,
    ) -> Result<HashMap<String, Vec<ForeignKeyDef>>> {
        self.metadata_fetches += 1;
        Ok(self.foreign_keys_of(&tables))
    }

    fn clear_cached_metadata(&mut self) {
        self.metadata_clears += 1;
    }
}

impl BlockingExecutor for MemoryConnection {
    type Driver = MemoryDriver;
    type Cursor = MemoryCursor;

    fn driver(&self) -> &Self::Driver {
        &self.driver
    }

    fn metadata(&self) -> &Arc<MetadataCache> {
        &self.metadata
    }

    fn run_blocking(&mut self, sql: String) -> Result<MemoryCursor> {
        Ok(MemoryCursor {
            results: self.take_scripted(sql).into_iter(),
            closed: false,
        })
    }

    fn fetch_table_names_blocking(&mut self, schema: &str) -> Result<Vec<String>> {
        self.metadata_fetches += 1;
        Ok(self.tables.get(schema).cloned().unwrap_or_default())
    }

    fn fetch_schema_names_blocking(&mut self) -> Result<Vec<String>> {
        self.metadata_fetches += 1;
        Ok(self.schemas.clone())
    }

    fn fetch_current_schema_blocking(&mut self) -> Result<String> {
        self.metadata_fetches += 1;
        Ok(self.current_schema.clone())
    }

    fn fetch_foreign_keys_blocking(
        &mut self,
        tables: Vec<String>,
    ) -> Result<HashMap<String, Vec<ForeignKeyDef>>> {
        self.metadata_fetches += 1;
        Ok(self.foreign_keys_of(&tables))
    }

    fn clear_cached_metadata(&mut self) {
        self.metadata_clears += 1;
    }
}

pub struct MemoryCursor {
    results: std::vec::IntoIter<QueryResult>,
    closed: bool,
}

impl RowCursor for MemoryCursor {
    fn next_result(&mut self) -> Result<Option<QueryResult>> {
        if self.closed {
            bail!("Cursor is closed");
        }
        Ok(self.results.next())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Scripted rows sharing one label set.
pub fn labeled_rows(labels: &[&str], rows: Vec<Vec<Value>>) -> Vec<QueryResult> {
    let labels: RowNames = labels.iter().map(|v| v.to_string()).collect::<Vec<_>>().into();
    rows.into_iter()
        .map(|values| {
            QueryResult::Row(RowLabeled::new(labels.clone(), Row::from(values)))
        })
        .collect()
}

/// Scripted execution outcome.
pub fn affected(rows_affected: u64, last_affected_id: Option<i64>) -> Vec<QueryResult> {
    vec![QueryResult::Affected(RowsAffected {
        rows_affected,
        last_affected_id,
    })]
}
