//! The embedded engine handle, its metadata catalog, the installer that
//! turns catalog rows into physical DuckDB objects, and the append-only
//! audit log.

pub mod audit;
pub mod catalog;
pub mod engine;
pub mod installer;

pub use engine::{EngineHandle, EphemeralView};

use gateway_core::GatewayError;

/// Opens the database and creates every catalog/audit table that does not
/// already exist, then re-registers any UDFs persisted from a previous
/// run. Call once at service startup.
pub fn bootstrap(engine: &EngineHandle) -> Result<(), GatewayError> {
    catalog::bootstrap(engine)?;
    audit::bootstrap(engine)?;
    installer::reinstall_all_udfs(engine)?;
    Ok(())
}
