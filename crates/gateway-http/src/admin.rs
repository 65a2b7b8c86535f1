use axum::extract::{Multipart, Path, Query, State};
use axum::{Form, Json};
use gateway_core::model::{CreateUdfRequest, CreateWebhookRequest};
use gateway_core::GatewayError;
use gateway_store::{catalog, installer};
use gateway_udf::CompiledUdf;
use serde::Deserialize;
use uuid::Uuid;

use crate::state::AppState;

pub async fn create_webhook(
    State(state): State<AppState>,
    Json(req): Json<CreateWebhookRequest>,
) -> Result<Json<gateway_core::model::WebhookDefinition>, GatewayError> {
    if req.path.trim().is_empty() {
        return Err(GatewayError::Invalid("path must not be empty".to_string()));
    }
    if let Some(sql) = &req.filter_sql {
        gateway_eval::validate_sql(&state.engine, sql)?;
    }
    if let Some(sql) = &req.transform_sql {
        gateway_eval::validate_sql(&state.engine, sql)?;
    }
    let def = catalog::insert_webhook(&state.engine, &req)?;
    Ok(Json(def))
}

pub async fn list_webhooks(
    State(state): State<AppState>,
) -> Result<Json<Vec<gateway_core::model::WebhookDefinition>>, GatewayError> {
    Ok(Json(catalog::list_webhooks(&state.engine)?))
}

pub async fn get_webhook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<gateway_core::model::WebhookDefinition>, GatewayError> {
    catalog::find_webhook_by_id(&state.engine, id)?
        .map(Json)
        .ok_or_else(|| GatewayError::NotFound(format!("webhook '{id}'")))
}

pub async fn delete_webhook(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(), GatewayError> {
    catalog::delete_webhook(&state.engine, id)
}

#[derive(Debug, Deserialize)]
pub struct SetWebhookStatusRequest {
    pub active: bool,
}

pub async fn set_webhook_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SetWebhookStatusRequest>,
) -> Result<Json<gateway_core::model::WebhookDefinition>, GatewayError> {
    Ok(Json(catalog::set_webhook_enabled(&state.engine, id, req.active)?))
}

pub async fn webhook_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let raw = gateway_store::audit::list_raw_events_for_webhook(&state.engine, id, 100)?;
    let transformed = gateway_store::audit::list_transformed_events_for_webhook(&state.engine, id, 100)?;
    Ok(Json(serde_json::json!({
        "raw_events": raw,
        "transformed_events": transformed,
    })))
}

pub async fn create_reference_table(
    State(state): State<AppState>,
    Path(webhook_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<gateway_core::model::ReferenceTable>, GatewayError> {
    catalog::find_webhook_by_id(&state.engine, webhook_id)?
        .ok_or_else(|| GatewayError::NotFound(format!("webhook '{webhook_id}'")))?;

    let mut logical_name: Option<String> = None;
    let mut csv_path: Option<std::path::PathBuf> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::Invalid(e.to_string()))?
    {
        match field.name() {
            Some("logical_name") => {
                let text = field.text().await.map_err(|e| GatewayError::Invalid(e.to_string()))?;
                logical_name = Some(text);
            }
            Some("file") => {
                let bytes = field.bytes().await.map_err(|e| GatewayError::Invalid(e.to_string()))?;
                let path = std::env::temp_dir().join(format!("gateway-upload-{}.csv", Uuid::new_v4()));
                std::fs::write(&path, &bytes).map_err(|e| GatewayError::Invalid(e.to_string()))?;
                csv_path = Some(path);
            }
            _ => {}
        }
    }

    let logical_name = logical_name.ok_or_else(|| GatewayError::Invalid("missing 'logical_name' field".to_string()))?;
    let csv_path = csv_path.ok_or_else(|| GatewayError::Invalid("missing 'file' field".to_string()))?;

    if catalog::find_reference_table(&state.engine, webhook_id, &logical_name)?.is_some() {
        let _ = std::fs::remove_file(&csv_path);
        return Err(GatewayError::Conflict(format!(
            "webhook '{webhook_id}' already has a reference table named '{logical_name}'"
        )));
    }

    let physical_name = gateway_core::naming::reference_table_name(webhook_id, &logical_name);
    let result = installer::install_reference_table(&state.engine, &physical_name, &csv_path.to_string_lossy());
    let _ = std::fs::remove_file(&csv_path);
    result?;

    let table = catalog::insert_reference_table(&state.engine, webhook_id, &logical_name, &physical_name)?;
    Ok(Json(table))
}

pub async fn list_reference_tables(
    State(state): State<AppState>,
    Path(webhook_id): Path<Uuid>,
) -> Result<Json<Vec<gateway_core::model::ReferenceTable>>, GatewayError> {
    Ok(Json(catalog::list_reference_tables_for_webhook(&state.engine, webhook_id)?))
}

pub async fn delete_reference_table(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(), GatewayError> {
    let tables = catalog::list_reference_tables(&state.engine)?;
    let table = tables
        .into_iter()
        .find(|t| t.id == id)
        .ok_or_else(|| GatewayError::NotFound(format!("reference table '{id}'")))?;
    installer::uninstall_reference_table(&state.engine, id, &table.physical_name)
}

pub async fn create_udf(
    State(state): State<AppState>,
    Json(req): Json<CreateUdfRequest>,
) -> Result<Json<gateway_core::model::UdfDefinition>, GatewayError> {
    catalog::find_webhook_by_id(&state.engine, req.webhook_id)?
        .ok_or_else(|| GatewayError::NotFound(format!("webhook '{}'", req.webhook_id)))?;

    if catalog::find_udf(&state.engine, req.webhook_id, &req.logical_name)?.is_some() {
        return Err(GatewayError::Conflict(format!(
            "webhook '{}' already has a udf named '{}'",
            req.webhook_id, req.logical_name
        )));
    }

    let physical_name = gateway_core::naming::udf_function_name(req.webhook_id, &req.logical_name);

    let compiled: CompiledUdf =
        installer::install_udf(&state.engine, &physical_name, &req.logical_name, &req.source)?;

    let def = catalog::insert_udf(
        &state.engine,
        &req,
        &physical_name,
        &compiled.args(),
        compiled.return_type(),
    )?;
    Ok(Json(def))
}

pub async fn list_udfs(
    State(state): State<AppState>,
    Path(webhook_id): Path<Uuid>,
) -> Result<Json<Vec<gateway_core::model::UdfDefinition>>, GatewayError> {
    Ok(Json(catalog::list_udfs_for_webhook(&state.engine, webhook_id)?))
}

pub async fn delete_udf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(), GatewayError> {
    let udfs = catalog::list_udfs(&state.engine)?;
    let udf = udfs
        .into_iter()
        .find(|u| u.id == id)
        .ok_or_else(|| GatewayError::NotFound(format!("udf '{id}'")))?;
    installer::uninstall_udf(&state.engine, id, &udf.physical_name)
}

#[derive(Debug, Deserialize)]
pub struct QueryForm {
    pub query: String,
}

/// Runs an arbitrary operator-supplied SQL statement against the embedded
/// engine and returns it as `{columns, rows}`. Gated behind the same
/// `X-API-Key` middleware as the rest of the admin surface.
pub async fn run_query(
    State(state): State<AppState>,
    Form(form): Form<QueryForm>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let result = gateway_eval::run_query(&state.engine, &form.query)?;
    Ok(Json(serde_json::json!({
        "columns": result.columns,
        "rows": result.rows,
    })))
}

/// A snapshot of catalog and audit-log sizes, for a quick operator health
/// check without having to hand-write SQL against `/query`.
pub async fn stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, GatewayError> {
    let webhooks = catalog::list_webhooks(&state.engine)?;
    let reference_tables = catalog::list_reference_tables(&state.engine)?;
    let udfs = catalog::list_udfs(&state.engine)?;
    Ok(Json(serde_json::json!({
        "webhook_count": webhooks.len(),
        "reference_table_count": reference_tables.len(),
        "udf_count": udfs.len(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default = "default_events_limit")]
    pub limit: i64,
}

fn default_events_limit() -> i64 {
    100
}

/// Lists the most recent transformed events across every webhook, most
/// recent first.
pub async fn list_events(
    State(state): State<AppState>,
    Query(q): Query<EventsQuery>,
) -> Result<Json<Vec<gateway_core::model::TransformedEvent>>, GatewayError> {
    let mut events = Vec::new();
    for webhook in catalog::list_webhooks(&state.engine)? {
        events.extend(gateway_store::audit::list_transformed_events_for_webhook(
            &state.engine,
            webhook.id,
            q.limit,
        )?);
    }
    events.sort_by(|a, b| b.dispatched_at.cmp(&a.dispatched_at));
    events.truncate(q.limit.max(0) as usize);
    Ok(Json(events))
}

pub async fn get_transformed_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<gateway_core::model::TransformedEvent>, GatewayError> {
    gateway_store::audit::find_transformed_event(&state.engine, id)?
        .map(Json)
        .ok_or_else(|| GatewayError::NotFound(format!("transformed event '{id}'")))
}
