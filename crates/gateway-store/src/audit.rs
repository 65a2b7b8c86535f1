use duckdb::params;
use gateway_core::model::{DispatchStatus, RawEvent, TransformedEvent};
use gateway_core::GatewayError;
use uuid::Uuid;

use crate::engine::EngineHandle;

pub fn bootstrap(engine: &EngineHandle) -> Result<(), GatewayError> {
    engine.lock().execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS raw_events (
            id VARCHAR PRIMARY KEY,
            webhook_id VARCHAR NOT NULL,
            source_path VARCHAR NOT NULL,
            payload VARCHAR NOT NULL,
            received_at TIMESTAMP NOT NULL
        );
        CREATE TABLE IF NOT EXISTS transformed_events (
            id VARCHAR PRIMARY KEY,
            raw_event_id VARCHAR NOT NULL,
            webhook_id VARCHAR NOT NULL,
            destination_url VARCHAR NOT NULL,
            transformed_payload VARCHAR,
            status VARCHAR NOT NULL,
            status_code INTEGER,
            response_body VARCHAR,
            error VARCHAR,
            dispatched_at TIMESTAMP NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Records the event as received, before any filter or transform has run.
/// This row is never updated — a downstream failure shows up only as a
/// missing or failed `transformed_events` row, never as a mutation here.
pub fn record_raw_event(engine: &EngineHandle, event: &RawEvent) -> Result<(), GatewayError> {
    engine.lock().execute(
        "INSERT INTO raw_events (id, webhook_id, source_path, payload, received_at) VALUES (?, ?, ?, ?, ?)",
        params![
            event.id.to_string(),
            event.webhook_id.to_string(),
            event.source_path,
            event.payload.to_string(),
            event.received_at,
        ],
    )?;
    Ok(())
}

/// Records the outcome of evaluation and dispatch. Written once, after the
/// dispatch attempt (or filter skip) completes.
pub fn record_transformed_event(engine: &EngineHandle, event: &TransformedEvent) -> Result<(), GatewayError> {
    engine.lock().execute(
        "INSERT INTO transformed_events
         (id, raw_event_id, webhook_id, destination_url, transformed_payload, status, status_code, response_body, error, dispatched_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            event.id.to_string(),
            event.raw_event_id.to_string(),
            event.webhook_id.to_string(),
            event.destination_url,
            event.transformed_payload.as_ref().map(|v| v.to_string()),
            event.status.to_string(),
            event.status_code.map(|c| c as i64),
            event.response_body,
            event.error,
            event.dispatched_at,
        ],
    )?;
    Ok(())
}

pub fn list_raw_events_for_webhook(
    engine: &EngineHandle,
    webhook_id: Uuid,
    limit: i64,
) -> Result<Vec<RawEvent>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, webhook_id, source_path, payload, received_at
         FROM raw_events WHERE webhook_id = ? ORDER BY received_at DESC LIMIT ?",
    )?;
    let mut rows = stmt.query(params![webhook_id.to_string(), limit])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let webhook_id: String = row.get(1)?;
        let payload_raw: String = row.get(3)?;
        out.push(RawEvent {
            id: Uuid::parse_str(&id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
            webhook_id: Uuid::parse_str(&webhook_id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
            source_path: row.get(2)?,
            payload: serde_json::from_str(&payload_raw).map_err(|e| GatewayError::EngineError(e.to_string()))?,
            received_at: row.get(4)?,
        });
    }
    Ok(out)
}

pub fn list_transformed_events_for_webhook(
    engine: &EngineHandle,
    webhook_id: Uuid,
    limit: i64,
) -> Result<Vec<TransformedEvent>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, raw_event_id, webhook_id, destination_url, transformed_payload, status, status_code, response_body, error, dispatched_at
         FROM transformed_events WHERE webhook_id = ? ORDER BY dispatched_at DESC LIMIT ?",
    )?;
    let mut rows = stmt.query(params![webhook_id.to_string(), limit])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let raw_event_id: String = row.get(1)?;
        let webhook_id: String = row.get(2)?;
        let destination_url: String = row.get(3)?;
        let transformed_payload_raw: Option<String> = row.get(4)?;
        let status_str: String = row.get(5)?;
        let status_code: Option<i64> = row.get(6)?;
        out.push(TransformedEvent {
            id: Uuid::parse_str(&id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
            raw_event_id: Uuid::parse_str(&raw_event_id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
            webhook_id: Uuid::parse_str(&webhook_id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
            destination_url,
            transformed_payload: transformed_payload_raw
                .map(|s| serde_json::from_str(&s))
                .transpose()
                .map_err(|e| GatewayError::EngineError(e.to_string()))?,
            status: parse_dispatch_status(&status_str)?,
            status_code: status_code.map(|c| c as u16),
            response_body: row.get(7)?,
            error: row.get(8)?,
            dispatched_at: row.get(9)?,
        });
    }
    Ok(out)
}

/// Looks up a single transformed event by its own id, regardless of webhook.
pub fn find_transformed_event(
    engine: &EngineHandle,
    id: Uuid,
) -> Result<Option<TransformedEvent>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, raw_event_id, webhook_id, destination_url, transformed_payload, status, status_code, response_body, error, dispatched_at
         FROM transformed_events WHERE id = ?",
    )?;
    let mut rows = stmt.query(params![id.to_string()])?;
    if let Some(row) = rows.next()? {
        let id: String = row.get(0)?;
        let raw_event_id: String = row.get(1)?;
        let webhook_id: String = row.get(2)?;
        let destination_url: String = row.get(3)?;
        let transformed_payload_raw: Option<String> = row.get(4)?;
        let status_str: String = row.get(5)?;
        let status_code: Option<i64> = row.get(6)?;
        Ok(Some(TransformedEvent {
            id: Uuid::parse_str(&id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
            raw_event_id: Uuid::parse_str(&raw_event_id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
            webhook_id: Uuid::parse_str(&webhook_id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
            destination_url,
            transformed_payload: transformed_payload_raw
                .map(|s| serde_json::from_str(&s))
                .transpose()
                .map_err(|e| GatewayError::EngineError(e.to_string()))?,
            status: parse_dispatch_status(&status_str)?,
            status_code: status_code.map(|c| c as u16),
            response_body: row.get(7)?,
            error: row.get(8)?,
            dispatched_at: row.get(9)?,
        }))
    } else {
        Ok(None)
    }
}

fn parse_dispatch_status(s: &str) -> Result<DispatchStatus, GatewayError> {
    match s {
        "success" => Ok(DispatchStatus::Success),
        "failed" => Ok(DispatchStatus::Failed),
        "filtered" => Ok(DispatchStatus::Filtered),
        "timeout" => Ok(DispatchStatus::Timeout),
        other => Err(GatewayError::EngineError(format!("unknown dispatch status '{other}'"))),
    }
}
