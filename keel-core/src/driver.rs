use crate::SqlWriter;

/// Dialect description of a database backend.
///
/// Besides naming the writer, a driver declares the capabilities the
/// statement layer adapts to: row ceilings for multi row inserts, RETURNING
/// support and the identifier folding the catalog applies.
pub trait Driver {
    type SqlWriter: SqlWriter;
    const NAME: &'static str;

    fn sql_writer(&self) -> Self::SqlWriter;

    /// Upper bound of rows a single INSERT statement may carry.
    fn max_insert_rows(&self) -> Option<usize> {
        None
    }

    /// Whether INSERT .. RETURNING is available to read back generated keys.
    fn supports_returning(&self) -> bool {
        true
    }

    /// Folds an identifier the way the backend catalog stores it.
    fn normalize_identifier(&self, identifier: &str) -> String {
        identifier.to_lowercase()
    }

    /// Whether catalog lookups expect schema qualified table names.
    fn qualified_metadata_names(&self) -> bool {
        false
    }
}
