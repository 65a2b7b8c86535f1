use gateway_core::model::WebhookDefinition;
use gateway_core::GatewayError;
use gateway_store::{EngineHandle, EphemeralView};
use uuid::Uuid;

use crate::substitute::substitute_payload_placeholder;

/// The result of running a webhook's filter and (optional) transform
/// against one inbound event.
pub enum EvalOutcome {
    /// The filter rejected the event; it must not be dispatched.
    Filtered,
    /// The event passed the filter (or there was none) and should be
    /// dispatched with this payload.
    Pass(serde_json::Value),
}

/// Evaluates `webhook`'s filter and transform SQL against `payload` using
/// a throwaway per-event view, guaranteed to be dropped before this
/// function returns by any path.
pub fn evaluate(
    engine: &EngineHandle,
    webhook: &WebhookDefinition,
    payload: &serde_json::Value,
) -> Result<EvalOutcome, GatewayError> {
    let view_name = format!("gw_event_{}", Uuid::new_v4().as_simple());
    let escaped = payload.to_string().replace('\'', "''");
    let select_sql = format!("SELECT '{escaped}'::JSON AS payload");
    let view = EphemeralView::create(engine, view_name.clone(), &select_sql)?;

    if let Some(filter_sql) = &webhook.filter_sql {
        let sql = substitute_payload_placeholder(filter_sql, view.name());
        if !run_predicate(engine, &sql)? {
            return Ok(EvalOutcome::Filtered);
        }
    }

    match &webhook.transform_sql {
        Some(transform_sql) => {
            let sql = substitute_payload_placeholder(transform_sql, view.name());
            let transformed = run_transform(engine, &sql)?;
            Ok(EvalOutcome::Pass(transformed))
        }
        None => Ok(EvalOutcome::Pass(payload.clone())),
    }
}

/// Dry-runs `sql` against a synthetic empty-object view, without touching
/// the audit log or dispatcher, so registration can reject broken SQL
/// before it is ever persisted.
pub fn validate_sql(engine: &EngineHandle, sql: &str) -> Result<(), GatewayError> {
    let view_name = format!("gw_validate_{}", Uuid::new_v4().as_simple());
    let view = EphemeralView::create(engine, view_name, "SELECT '{}'::JSON AS payload")?;
    let substituted = substitute_payload_placeholder(sql, view.name());
    let conn = engine.lock();
    conn.prepare(&substituted)
        .map_err(|e| GatewayError::Invalid(format!("invalid SQL: {e}")))?;
    Ok(())
}

fn run_predicate(engine: &EngineHandle, sql: &str) -> Result<bool, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| GatewayError::EvaluationError(format!("invalid filter SQL: {e}")))?;
    let mut rows = stmt
        .query([])
        .map_err(|e| GatewayError::EvaluationError(format!("filter evaluation failed: {e}")))?;
    match rows
        .next()
        .map_err(|e| GatewayError::EvaluationError(e.to_string()))?
    {
        Some(row) => {
            let value: Option<bool> = row
                .get(0)
                .map_err(|e| GatewayError::EvaluationError(format!("filter did not return a boolean: {e}")))?;
            Ok(value.unwrap_or(false))
        }
        None => Ok(false),
    }
}

/// The result of an ad-hoc read query issued through the admin `/query`
/// endpoint: column names in select order, then each row as a JSON value
/// per column.
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Runs an arbitrary read-only SQL statement against the catalog/audit
/// engine and shapes the result for JSON serialization. Operators are
/// trusted with this endpoint the same way the admin API key trusts them
/// with webhook registration — there is no separate row-level permission
/// model.
pub fn run_query(engine: &EngineHandle, sql: &str) -> Result<QueryResult, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| GatewayError::Invalid(format!("invalid SQL: {e}")))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(|s| s.to_string()).collect();
    let column_count = columns.len();

    let mut rows_out = Vec::new();
    let mut rows = stmt
        .query([])
        .map_err(|e| GatewayError::Invalid(format!("query failed: {e}")))?;
    while let Some(row) = rows.next().map_err(|e| GatewayError::Invalid(e.to_string()))? {
        let mut out_row = Vec::with_capacity(column_count);
        for i in 0..column_count {
            let value: duckdb::types::Value = row
                .get(i)
                .map_err(|e| GatewayError::Invalid(format!("unreadable column {i}: {e}")))?;
            out_row.push(duck_value_to_json(value));
        }
        rows_out.push(out_row);
    }
    Ok(QueryResult { columns, rows: rows_out })
}

fn duck_value_to_json(value: duckdb::types::Value) -> serde_json::Value {
    use duckdb::types::Value as DuckValue;
    match value {
        DuckValue::Null => serde_json::Value::Null,
        DuckValue::Boolean(b) => serde_json::Value::Bool(b),
        DuckValue::TinyInt(i) => serde_json::Value::from(i),
        DuckValue::SmallInt(i) => serde_json::Value::from(i),
        DuckValue::Int(i) => serde_json::Value::from(i),
        DuckValue::BigInt(i) => serde_json::Value::from(i),
        DuckValue::Float(f) => serde_json::json!(f),
        DuckValue::Double(f) => serde_json::json!(f),
        DuckValue::Text(s) => serde_json::Value::String(s),
        other => serde_json::Value::String(format!("{other:?}")),
    }
}

/// Runs the transform SQL and shapes its result the way §4.4 mandates: the
/// result columns become the keys of the outgoing object, keyed by column
/// name rather than assuming a single pre-serialized JSON-text column. A
/// single result row becomes that one object; more than one row becomes a
/// JSON array of row-objects.
fn run_transform(engine: &EngineHandle, sql: &str) -> Result<serde_json::Value, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| GatewayError::EvaluationError(format!("invalid transform SQL: {e}")))?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(|s| s.to_string()).collect();
    let column_count = columns.len();

    let mut rows = stmt
        .query([])
        .map_err(|e| GatewayError::EvaluationError(format!("transform evaluation failed: {e}")))?;

    let mut objects = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| GatewayError::EvaluationError(e.to_string()))?
    {
        let mut object = serde_json::Map::with_capacity(column_count);
        for (i, column) in columns.iter().enumerate() {
            let value: duckdb::types::Value = row.get(i).map_err(|e| {
                GatewayError::EvaluationError(format!("unreadable transform column '{column}': {e}"))
            })?;
            object.insert(column.clone(), duck_value_to_json(value));
        }
        objects.push(serde_json::Value::Object(object));
    }

    match objects.len() {
        0 => Err(GatewayError::EvaluationError(
            "transform SQL returned no rows".to_string(),
        )),
        1 => Ok(objects.into_iter().next().unwrap()),
        _ => Ok(serde_json::Value::Array(objects)),
    }
}
