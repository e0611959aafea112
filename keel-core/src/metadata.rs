use crate::Result;
use std::{collections::HashMap, future::Future, sync::Arc};
use tokio::sync::Mutex;

/// One foreign key edge as reported by the backend catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Connection wide cache of catalog lookups.
///
/// Shared between every session of a connection through an `Arc`. Each entry
/// is filled at most once: the lock is held across the fetch so concurrent
/// readers of a missing entry line up behind the single round trip instead of
/// issuing their own.
#[derive(Debug, Default)]
pub struct MetadataCache {
    table_names: Mutex<HashMap<String, Arc<[String]>>>,
    schema_names: Mutex<Option<Arc<[String]>>>,
    current_schema: Mutex<Option<String>>,
    foreign_keys: Mutex<HashMap<String, Arc<[ForeignKeyDef]>>>,
}

impl MetadataCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn table_names_for<F, Fut>(&self, schema: &str, fetch: F) -> Result<Arc<[String]>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>>>,
    {
        let mut guard = self.table_names.lock().await;
        if let Some(cached) = guard.get(schema) {
            return Ok(cached.clone());
        }
        let fetched: Arc<[String]> = fetch().await?.into();
        guard.insert(schema.to_string(), fetched.clone());
        Ok(fetched)
    }

    pub async fn schema_names_for<F, Fut>(&self, fetch: F) -> Result<Arc<[String]>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<String>>>,
    {
        let mut guard = self.schema_names.lock().await;
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }
        let fetched: Arc<[String]> = fetch().await?.into();
        *guard = Some(fetched.clone());
        Ok(fetched)
    }

    pub async fn current_schema_for<F, Fut>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut guard = self.current_schema.lock().await;
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }
        let fetched = fetch().await?;
        *guard = Some(fetched.clone());
        Ok(fetched)
    }

    /// Foreign keys of the requested tables, in request order.
    ///
    /// Tables already cached are answered from the cache, the remainder goes
    /// through `fetch` as one batch. Tables without foreign keys get an empty
    /// entry so they are never fetched again.
    pub async fn foreign_keys_for<F, Fut>(
        &self,
        tables: &[String],
        fetch: F,
    ) -> Result<Vec<Arc<[ForeignKeyDef]>>>
    where
        F: FnOnce(Vec<String>) -> Fut,
        Fut: Future<Output = Result<HashMap<String, Vec<ForeignKeyDef>>>>,
    {
        let mut guard = self.foreign_keys.lock().await;
        let missing = tables
            .iter()
            .filter(|table| !guard.contains_key(*table))
            .cloned()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            let mut fetched = fetch(missing.clone()).await?;
            for table in missing {
                let keys = fetched.remove(&table).unwrap_or_default();
                guard.insert(table, keys.into());
            }
        }
        Ok(tables
            .iter()
            .map(|table| {
                guard
                    .get(table)
                    .cloned()
                    .unwrap_or_else(|| Vec::new().into())
            })
            .collect())
    }

    /// Drops the table level entries, keeping the schema list which only
    /// changes on CREATE/DROP SCHEMA.
    pub async fn reset_caches(&self) {
        self.table_names.lock().await.clear();
        self.current_schema.lock().await.take();
        self.foreign_keys.lock().await.clear();
    }

    pub async fn reset_schema_caches(&self) {
        self.schema_names.lock().await.take();
        self.reset_caches().await;
    }

    pub fn table_names_for_blocking<F>(&self, schema: &str, fetch: F) -> Result<Arc<[String]>>
    where
        F: FnOnce() -> Result<Vec<String>>,
    {
        let mut guard = self.table_names.blocking_lock();
        if let Some(cached) = guard.get(schema) {
            return Ok(cached.clone());
        }
        let fetched: Arc<[String]> = fetch()?.into();
        guard.insert(schema.to_string(), fetched.clone());
        Ok(fetched)
    }

    pub fn schema_names_for_blocking<F>(&self, fetch: F) -> Result<Arc<[String]>>
    where
        F: FnOnce() -> Result<Vec<String>>,
    {
        let mut guard = self.schema_names.blocking_lock();
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }
        let fetched: Arc<[String]> = fetch()?.into();
        *guard = Some(fetched.clone());
        Ok(fetched)
    }

    pub fn current_schema_for_blocking<F>(&self, fetch: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        let mut guard = self.current_schema.blocking_lock();
        if let Some(cached) = guard.as_ref() {
            return Ok(cached.clone());
        }
        let fetched = fetch()?;
        *guard = Some(fetched.clone());
        Ok(fetched)
    }

    pub fn foreign_keys_for_blocking<F>(
        &self,
        tables: &[String],
        fetch: F,
    ) -> Result<Vec<Arc<[ForeignKeyDef]>>>
    where
        F: FnOnce(Vec<String>) -> Result<HashMap<String, Vec<ForeignKeyDef>>>,
    {
        let mut guard = self.foreign_keys.blocking_lock();
        let missing = tables
            .iter()
            .filter(|table| !guard.contains_key(*table))
            .cloned()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            let mut fetched = fetch(missing.clone())?;
            for table in missing {
                let keys = fetched.remove(&table).unwrap_or_default();
                guard.insert(table, keys.into());
            }
        }
        Ok(tables
            .iter()
            .map(|table| {
                guard
                    .get(table)
                    .cloned()
                    .unwrap_or_else(|| Vec::new().into())
            })
            .collect())
    }

    pub fn reset_caches_blocking(&self) {
        self.table_names.blocking_lock().clear();
        self.current_schema.blocking_lock().take();
        self.foreign_keys.blocking_lock().clear();
    }

    pub fn reset_schema_caches_blocking(&self) {
        self.schema_names.blocking_lock().take();
        self.reset_caches_blocking();
    }
}
