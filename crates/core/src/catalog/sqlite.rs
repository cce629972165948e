//! SQLite-backed beatmap set catalog implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};
use tracing::debug;

use super::{CatalogError, CatalogRecord, CatalogSearchQuery, CatalogStore};

/// Records committed per transaction unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 500;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS beatmap_sets (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );
"#;

/// SQLite-backed beatmap set catalog.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
    batch_size: usize,
}

impl SqliteCatalog {
    /// Create a new SQLite catalog, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, CatalogError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Create an in-memory SQLite catalog (useful for testing).
    pub fn in_memory() -> Result<Self, CatalogError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, CatalogError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Set the number of records committed per transaction (at least 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Internal("catalog lock poisoned".to_string()))
    }
}

impl CatalogStore for SqliteCatalog {
    fn persist(&self, records: &[CatalogRecord]) -> Result<usize, CatalogError> {
        let mut conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;

        let mut written = 0;
        for (index, batch) in records.chunks(self.batch_size).enumerate() {
            // Dropping the transaction on error rolls back this batch only
            let tx = conn.transaction()?;
            {
                let mut stmt = tx
                    .prepare_cached("INSERT OR REPLACE INTO beatmap_sets (id, name) VALUES (?1, ?2)")?;
                for record in batch {
                    stmt.execute(params![record.id, &record.display_name])?;
                }
            }
            tx.commit()?;

            written += batch.len();
            debug!(
                "Committed catalog batch {} ({} records, {}/{} total)",
                index + 1,
                batch.len(),
                written,
                records.len()
            );
        }

        Ok(written)
    }

    fn get(&self, id: i64) -> Result<CatalogRecord, CatalogError> {
        let conn = self.lock()?;

        conn.query_row(
            "SELECT id, name FROM beatmap_sets WHERE id = ?",
            params![id],
            |row| {
                Ok(CatalogRecord {
                    id: row.get(0)?,
                    display_name: row.get(1)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => CatalogError::NotFound(id.to_string()),
            _ => CatalogError::Database(e.to_string()),
        })
    }

    fn search(&self, query: &CatalogSearchQuery) -> Result<Vec<CatalogRecord>, CatalogError> {
        let conn = self.lock()?;
        let search_pattern = format!("%{}%", escape_like(&query.query));

        let mut stmt = conn.prepare(
            "SELECT id, name FROM beatmap_sets
             WHERE name LIKE ?1 ESCAPE '\\'
             ORDER BY id
             LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![&search_pattern, query.limit as i64], |row| {
            Ok(CatalogRecord {
                id: row.get(0)?,
                display_name: row.get(1)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn count(&self) -> Result<u64, CatalogError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM beatmap_sets", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Makes `%`, `_` and `\` in user text match literally under `ESCAPE '\'`.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
