use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use gateway_core::GatewayError;

/// A handle to the embedded DuckDB database backing the gateway. DuckDB's
/// single-writer-friendly design and our own dynamic DDL (installing and
/// dropping reference tables and UDFs at runtime) both favor serializing
/// access through one connection rather than pooling several, so the
/// handle is just an `Arc<Mutex<Connection>>` cloned across the service.
#[derive(Clone)]
pub struct EngineHandle {
    conn: Arc<Mutex<duckdb::Connection>>,
}

impl EngineHandle {
    pub fn open(path: &Path) -> Result<Self, GatewayError> {
        let conn = duckdb::Connection::open(path)?;
        Ok(EngineHandle {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, GatewayError> {
        let conn = duckdb::Connection::open_in_memory()?;
        Ok(EngineHandle {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn lock(&self) -> MutexGuard<'_, duckdb::Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Drops an ephemeral single-row view on scope exit, regardless of whether
/// the evaluation that used it succeeded, failed, or panicked mid-way.
/// Every caller that creates a per-event view must hold one of these for
/// the view's whole lifetime.
pub struct EphemeralView<'a> {
    engine: &'a EngineHandle,
    name: String,
}

impl<'a> EphemeralView<'a> {
    /// Creates a single-row view named `name` over the literal SQL values
    /// in `select_sql` (typically `SELECT <json literal> AS payload`).
    pub fn create(engine: &'a EngineHandle, name: String, select_sql: &str) -> Result<Self, GatewayError> {
        let sql = format!("CREATE OR REPLACE TEMP VIEW {name} AS {select_sql}");
        engine.lock().execute_batch(&sql)?;
        Ok(EphemeralView { engine, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for EphemeralView<'_> {
    fn drop(&mut self) {
        let sql = format!("DROP VIEW IF EXISTS {}", self.name);
        if let Ok(conn) = self.engine.conn.lock() {
            if let Err(err) = conn.execute_batch(&sql) {
                tracing::warn!(view = %self.name, error = %err, "failed to drop ephemeral view");
            }
        }
    }
}
