use std::sync::Arc;

use duckdb::functions::{Context, FunctionFlags};
use duckdb::types::Value as DuckValue;
use gateway_core::GatewayError;
use gateway_udf::{CompiledUdf, Value as UdfValue};
use uuid::Uuid;

use crate::catalog;
use crate::engine::EngineHandle;

/// Ingests a CSV file into a freshly created physical table, using
/// DuckDB's own schema inference rather than a separate CSV-parsing
/// dependency.
pub fn install_reference_table(
    engine: &EngineHandle,
    physical_name: &str,
    csv_path: &str,
) -> Result<(), GatewayError> {
    let conn = engine.lock();
    let sql = format!(
        "CREATE TABLE {physical_name} AS SELECT * FROM read_csv_auto('{}')",
        escape_literal(csv_path)
    );
    conn.execute_batch(&sql)?;
    Ok(())
}

pub fn drop_reference_table_physical(engine: &EngineHandle, physical_name: &str) -> Result<(), GatewayError> {
    let sql = format!("DROP TABLE IF EXISTS {physical_name}");
    engine.lock().execute_batch(&sql)?;
    Ok(())
}

/// Drops the physical table first, then the catalog row — physical
/// objects are owned by the installer, not by a foreign-key trigger, so
/// the order here is what keeps the two in sync if either step fails.
pub fn uninstall_reference_table(engine: &EngineHandle, id: Uuid, physical_name: &str) -> Result<(), GatewayError> {
    drop_reference_table_physical(engine, physical_name)?;
    catalog::delete_reference_table_row(engine, id)
}

fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Compiles UDF source and registers it as a DuckDB scalar function under
/// `physical_name`. The closure captures the compiled function directly,
/// so (unlike a static `VScalar` impl) each registration can carry its own
/// argument count and types without a process-wide side table.
pub fn install_udf(
    engine: &EngineHandle,
    physical_name: &str,
    logical_name: &str,
    source: &str,
) -> Result<CompiledUdf, GatewayError> {
    let compiled = CompiledUdf::compile(source, logical_name)
        .map_err(|e| GatewayError::Invalid(e.to_string()))?;

    register(engine, physical_name, &compiled)?;
    Ok(compiled)
}

fn register(engine: &EngineHandle, physical_name: &str, compiled: &CompiledUdf) -> Result<(), GatewayError> {
    let arg_count = compiled.args().len();
    let bound = Arc::new(compiled.clone());

    engine
        .lock()
        .create_scalar_function(
            physical_name,
            arg_count as i32,
            FunctionFlags::default(),
            move |ctx: &Context| -> duckdb::Result<DuckValue> {
                let mut args = Vec::with_capacity(arg_count);
                for i in 0..arg_count {
                    let raw: DuckValue = ctx.get(i)?;
                    args.push(duck_value_to_udf_value(raw));
                }
                let result = bound
                    .call(&args)
                    .map_err(|e| duckdb::Error::UserFunctionError(Box::new(UdfCallError(e.to_string()))))?;
                Ok(udf_value_to_duck_value(result))
            },
        )
        .map_err(|e| GatewayError::EngineError(e.to_string()))?;
    Ok(())
}

#[derive(Debug)]
struct UdfCallError(String);

impl std::fmt::Display for UdfCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UdfCallError {}

fn duck_value_to_udf_value(v: DuckValue) -> UdfValue {
    match v {
        DuckValue::Null => UdfValue::Null,
        DuckValue::Boolean(b) => UdfValue::Bool(b),
        DuckValue::BigInt(i) => UdfValue::Int(i),
        DuckValue::Int(i) => UdfValue::Int(i as i64),
        DuckValue::Double(f) => UdfValue::Float(f),
        DuckValue::Text(s) => UdfValue::Str(s),
        other => UdfValue::Str(format!("{other:?}")),
    }
}

fn udf_value_to_duck_value(v: UdfValue) -> DuckValue {
    match v {
        UdfValue::Str(s) => DuckValue::Text(s),
        UdfValue::Int(i) => DuckValue::BigInt(i),
        UdfValue::Float(f) => DuckValue::Double(f),
        UdfValue::Bool(b) => DuckValue::Boolean(b),
        UdfValue::Null => DuckValue::Null,
    }
}

pub fn uninstall_udf(engine: &EngineHandle, id: Uuid, physical_name: &str) -> Result<(), GatewayError> {
    let sql = format!("DROP FUNCTION IF EXISTS {physical_name}");
    engine.lock().execute_batch(&sql)?;
    catalog::delete_udf_row(engine, id)
}

/// Re-registers every persisted UDF's compiled form after the process
/// restarts, since scalar function registrations do not survive a
/// reopened connection.
pub fn reinstall_all_udfs(engine: &EngineHandle) -> Result<(), GatewayError> {
    for udf in catalog::list_udfs(engine)? {
        let compiled = CompiledUdf::compile(&udf.source, &udf.logical_name)
            .map_err(|e| GatewayError::EngineError(e.to_string()))?;
        register(engine, &udf.physical_name, &compiled)?;
    }
    Ok(())
}
