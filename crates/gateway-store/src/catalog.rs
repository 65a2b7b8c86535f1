use chrono::Utc;
use duckdb::params;
use gateway_core::model::{
    CreateUdfRequest, CreateWebhookRequest, ReferenceTable, UdfArg, UdfDefinition, ValueType,
    WebhookDefinition,
};
use gateway_core::GatewayError;
use uuid::Uuid;

use crate::engine::EngineHandle;

/// Creates the catalog tables if they do not already exist. Safe to call
/// on every startup.
pub fn bootstrap(engine: &EngineHandle) -> Result<(), GatewayError> {
    let conn = engine.lock();
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS webhooks (
            id VARCHAR PRIMARY KEY,
            name VARCHAR NOT NULL,
            path VARCHAR NOT NULL UNIQUE,
            destination_url VARCHAR NOT NULL,
            filter_sql VARCHAR,
            transform_sql VARCHAR,
            enabled BOOLEAN NOT NULL,
            created_at TIMESTAMP NOT NULL
        );
        CREATE TABLE IF NOT EXISTS reference_tables (
            id VARCHAR PRIMARY KEY,
            webhook_id VARCHAR NOT NULL,
            logical_name VARCHAR NOT NULL,
            physical_name VARCHAR NOT NULL,
            created_at TIMESTAMP NOT NULL,
            UNIQUE (webhook_id, logical_name)
        );
        CREATE TABLE IF NOT EXISTS udfs (
            id VARCHAR PRIMARY KEY,
            webhook_id VARCHAR NOT NULL,
            logical_name VARCHAR NOT NULL,
            physical_name VARCHAR NOT NULL,
            args_json VARCHAR NOT NULL,
            return_type VARCHAR NOT NULL,
            source VARCHAR NOT NULL,
            created_at TIMESTAMP NOT NULL,
            UNIQUE (webhook_id, logical_name)
        );
        "#,
    )?;
    Ok(())
}

pub fn insert_webhook(
    engine: &EngineHandle,
    req: &CreateWebhookRequest,
) -> Result<WebhookDefinition, GatewayError> {
    let def = WebhookDefinition {
        id: Uuid::new_v4(),
        name: req.name.clone(),
        path: req.path.clone(),
        destination_url: req.destination_url.clone(),
        filter_sql: req.filter_sql.clone(),
        transform_sql: req.transform_sql.clone(),
        enabled: true,
        created_at: Utc::now(),
    };

    let existing = find_webhook_by_path(engine, &def.path)?;
    if existing.is_some() {
        return Err(GatewayError::Conflict(format!(
            "a webhook already exists for path '{}'",
            def.path
        )));
    }

    engine.lock().execute(
        "INSERT INTO webhooks (id, name, path, destination_url, filter_sql, transform_sql, enabled, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            def.id.to_string(),
            def.name,
            def.path,
            def.destination_url,
            def.filter_sql,
            def.transform_sql,
            def.enabled,
            def.created_at,
        ],
    )?;

    Ok(def)
}

pub fn find_webhook_by_path(
    engine: &EngineHandle,
    path: &str,
) -> Result<Option<WebhookDefinition>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, name, path, destination_url, filter_sql, transform_sql, enabled, created_at
         FROM webhooks WHERE path = ?",
    )?;
    let mut rows = stmt.query(params![path])?;
    if let Some(row) = rows.next()? {
        Ok(Some(webhook_from_row(row)?))
    } else {
        Ok(None)
    }
}

pub fn find_webhook_by_id(
    engine: &EngineHandle,
    id: Uuid,
) -> Result<Option<WebhookDefinition>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, name, path, destination_url, filter_sql, transform_sql, enabled, created_at
         FROM webhooks WHERE id = ?",
    )?;
    let mut rows = stmt.query(params![id.to_string()])?;
    if let Some(row) = rows.next()? {
        Ok(Some(webhook_from_row(row)?))
    } else {
        Ok(None)
    }
}

pub fn list_webhooks(engine: &EngineHandle) -> Result<Vec<WebhookDefinition>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, name, path, destination_url, filter_sql, transform_sql, enabled, created_at
         FROM webhooks ORDER BY created_at",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(webhook_from_row(row)?);
    }
    Ok(out)
}

pub fn delete_webhook(engine: &EngineHandle, id: Uuid) -> Result<(), GatewayError> {
    let changed = engine
        .lock()
        .execute("DELETE FROM webhooks WHERE id = ?", params![id.to_string()])?;
    if changed == 0 {
        return Err(GatewayError::NotFound(format!("webhook '{id}'")));
    }
    Ok(())
}

pub fn set_webhook_enabled(engine: &EngineHandle, id: Uuid, enabled: bool) -> Result<WebhookDefinition, GatewayError> {
    let changed = engine.lock().execute(
        "UPDATE webhooks SET enabled = ? WHERE id = ?",
        params![enabled, id.to_string()],
    )?;
    if changed == 0 {
        return Err(GatewayError::NotFound(format!("webhook '{id}'")));
    }
    find_webhook_by_id(engine, id)?.ok_or_else(|| GatewayError::NotFound(format!("webhook '{id}'")))
}

fn webhook_from_row(row: &duckdb::Row<'_>) -> Result<WebhookDefinition, GatewayError> {
    let id: String = row.get(0)?;
    Ok(WebhookDefinition {
        id: Uuid::parse_str(&id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
        name: row.get(1)?,
        path: row.get(2)?,
        destination_url: row.get(3)?,
        filter_sql: row.get(4)?,
        transform_sql: row.get(5)?,
        enabled: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn insert_reference_table(
    engine: &EngineHandle,
    webhook_id: Uuid,
    logical_name: &str,
    physical_name: &str,
) -> Result<ReferenceTable, GatewayError> {
    let table = ReferenceTable {
        id: Uuid::new_v4(),
        webhook_id,
        logical_name: logical_name.to_string(),
        physical_name: physical_name.to_string(),
        created_at: Utc::now(),
    };
    engine.lock().execute(
        "INSERT INTO reference_tables (id, webhook_id, logical_name, physical_name, created_at) VALUES (?, ?, ?, ?, ?)",
        params![
            table.id.to_string(),
            table.webhook_id.to_string(),
            table.logical_name,
            table.physical_name,
            table.created_at,
        ],
    )?;
    Ok(table)
}

pub fn find_reference_table(
    engine: &EngineHandle,
    webhook_id: Uuid,
    logical_name: &str,
) -> Result<Option<ReferenceTable>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, webhook_id, logical_name, physical_name, created_at
         FROM reference_tables WHERE webhook_id = ? AND logical_name = ?",
    )?;
    let mut rows = stmt.query(params![webhook_id.to_string(), logical_name])?;
    if let Some(row) = rows.next()? {
        Ok(Some(reference_table_from_row(row)?))
    } else {
        Ok(None)
    }
}

pub fn list_reference_tables(engine: &EngineHandle) -> Result<Vec<ReferenceTable>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, webhook_id, logical_name, physical_name, created_at
         FROM reference_tables ORDER BY created_at",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(reference_table_from_row(row)?);
    }
    Ok(out)
}

pub fn list_reference_tables_for_webhook(
    engine: &EngineHandle,
    webhook_id: Uuid,
) -> Result<Vec<ReferenceTable>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, webhook_id, logical_name, physical_name, created_at
         FROM reference_tables WHERE webhook_id = ? ORDER BY created_at",
    )?;
    let mut rows = stmt.query(params![webhook_id.to_string()])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(reference_table_from_row(row)?);
    }
    Ok(out)
}

fn reference_table_from_row(row: &duckdb::Row<'_>) -> Result<ReferenceTable, GatewayError> {
    let id: String = row.get(0)?;
    let webhook_id: String = row.get(1)?;
    Ok(ReferenceTable {
        id: Uuid::parse_str(&id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
        webhook_id: Uuid::parse_str(&webhook_id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
        logical_name: row.get(2)?,
        physical_name: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn delete_reference_table_row(engine: &EngineHandle, id: Uuid) -> Result<(), GatewayError> {
    let changed = engine.lock().execute(
        "DELETE FROM reference_tables WHERE id = ?",
        params![id.to_string()],
    )?;
    if changed == 0 {
        return Err(GatewayError::NotFound(format!("reference table '{id}'")));
    }
    Ok(())
}

pub fn insert_udf(
    engine: &EngineHandle,
    req: &CreateUdfRequest,
    physical_name: &str,
    args: &[UdfArg],
    return_type: ValueType,
) -> Result<UdfDefinition, GatewayError> {
    let def = UdfDefinition {
        id: Uuid::new_v4(),
        webhook_id: req.webhook_id,
        logical_name: req.logical_name.clone(),
        physical_name: physical_name.to_string(),
        args: args.to_vec(),
        return_type,
        source: req.source.clone(),
        created_at: Utc::now(),
    };
    let args_json = serde_json::to_string(&def.args).map_err(|e| GatewayError::Invalid(e.to_string()))?;
    engine.lock().execute(
        "INSERT INTO udfs (id, webhook_id, logical_name, physical_name, args_json, return_type, source, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            def.id.to_string(),
            def.webhook_id.to_string(),
            def.logical_name,
            def.physical_name,
            args_json,
            def.return_type.to_string(),
            def.source,
            def.created_at,
        ],
    )?;
    Ok(def)
}

pub fn find_udf(engine: &EngineHandle, webhook_id: Uuid, logical_name: &str) -> Result<Option<UdfDefinition>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, webhook_id, logical_name, physical_name, args_json, return_type, source, created_at
         FROM udfs WHERE webhook_id = ? AND logical_name = ?",
    )?;
    let mut rows = stmt.query(params![webhook_id.to_string(), logical_name])?;
    if let Some(row) = rows.next()? {
        Ok(Some(udf_from_row(row)?))
    } else {
        Ok(None)
    }
}

pub fn list_udfs(engine: &EngineHandle) -> Result<Vec<UdfDefinition>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, webhook_id, logical_name, physical_name, args_json, return_type, source, created_at
         FROM udfs ORDER BY created_at",
    )?;
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(udf_from_row(row)?);
    }
    Ok(out)
}

pub fn list_udfs_for_webhook(engine: &EngineHandle, webhook_id: Uuid) -> Result<Vec<UdfDefinition>, GatewayError> {
    let conn = engine.lock();
    let mut stmt = conn.prepare(
        "SELECT id, webhook_id, logical_name, physical_name, args_json, return_type, source, created_at
         FROM udfs WHERE webhook_id = ? ORDER BY created_at",
    )?;
    let mut rows = stmt.query(params![webhook_id.to_string()])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        out.push(udf_from_row(row)?);
    }
    Ok(out)
}

pub fn delete_udf_row(engine: &EngineHandle, id: Uuid) -> Result<(), GatewayError> {
    let changed = engine
        .lock()
        .execute("DELETE FROM udfs WHERE id = ?", params![id.to_string()])?;
    if changed == 0 {
        return Err(GatewayError::NotFound(format!("udf '{id}'")));
    }
    Ok(())
}

fn udf_from_row(row: &duckdb::Row<'_>) -> Result<UdfDefinition, GatewayError> {
    let id: String = row.get(0)?;
    let webhook_id: String = row.get(1)?;
    let args_json: String = row.get(4)?;
    let return_type_str: String = row.get(5)?;
    let args: Vec<UdfArg> =
        serde_json::from_str(&args_json).map_err(|e| GatewayError::EngineError(e.to_string()))?;
    let return_type: ValueType = return_type_str
        .parse()
        .map_err(GatewayError::EngineError)?;
    Ok(UdfDefinition {
        id: Uuid::parse_str(&id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
        webhook_id: Uuid::parse_str(&webhook_id).map_err(|e| GatewayError::EngineError(e.to_string()))?,
        logical_name: row.get(2)?,
        physical_name: row.get(3)?,
        args,
        return_type,
        source: row.get(6)?,
        created_at: row.get(7)?,
    })
}
