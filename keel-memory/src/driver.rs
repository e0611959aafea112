use keel_core::{Driver, GenericSqlWriter};

/// Dialect of the in-memory backend, capabilities are plain fields so tests
/// can exercise both sides of every capability switch.
#[derive(Debug, Clone)]
pub struct MemoryDriver {
    pub max_insert_rows: Option<usize>,
    pub supports_returning: bool,
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self {
            max_insert_rows: None,
            supports_returning: true,
        }
    }
}

impl Driver for MemoryDriver {
    type SqlWriter = GenericSqlWriter;
    const NAME: &'static str = "memory";

    fn sql_writer(&self) -> Self::SqlWriter {
        GenericSqlWriter::new()
    }

    fn max_insert_rows(&self) -> Option<usize> {
        self.max_insert_rows
    }

    fn supports_returning(&self) -> bool {
        self.supports_returning
    }
}
