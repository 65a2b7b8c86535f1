use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use gateway_core::model::{DispatchStatus, RawEvent, TransformedEvent};
use gateway_core::GatewayError;
use gateway_eval::EvalOutcome;
use gateway_store::{audit, catalog};
use uuid::Uuid;

use crate::state::AppState;

/// Accepts an inbound event on a dynamically registered path, records it,
/// evaluates the bound webhook's filter/transform, dispatches it if it
/// passes, and records the outcome — in that order, so the audit log
/// reflects every event the gateway ever received, whether or not it was
/// ultimately delivered.
pub async fn receive(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, GatewayError> {
    let webhook = catalog::find_webhook_by_path(&state.engine, &path)?
        .ok_or_else(|| GatewayError::NotFound(format!("no webhook registered for path '{path}'")))?;

    if !webhook.enabled {
        return Err(GatewayError::NotFound(format!("webhook for path '{path}' is disabled")));
    }

    let raw_event = RawEvent {
        id: Uuid::new_v4(),
        webhook_id: webhook.id,
        source_path: path.clone(),
        payload: body.clone(),
        received_at: Utc::now(),
    };
    audit::record_raw_event(&state.engine, &raw_event)?;

    let outcome = gateway_eval::evaluate(&state.engine, &webhook, &body);

    // The ingress response never fails for evaluation or dispatch problems
    // (see the error-handling design note in the crate root) — both are
    // recorded in the audit log and reported back as a 200 with an outcome
    // body instead of surfaced as an HTTP error.
    let transformed_event = match outcome {
        Err(err) => TransformedEvent {
            id: Uuid::new_v4(),
            raw_event_id: raw_event.id,
            webhook_id: webhook.id,
            destination_url: webhook.destination_url.clone(),
            transformed_payload: None,
            status: DispatchStatus::Failed,
            status_code: Some(0),
            response_body: Some(err.to_string()),
            error: Some(err.to_string()),
            dispatched_at: Utc::now(),
        },
        Ok(EvalOutcome::Filtered) => TransformedEvent {
            id: Uuid::new_v4(),
            raw_event_id: raw_event.id,
            webhook_id: webhook.id,
            destination_url: webhook.destination_url.clone(),
            transformed_payload: None,
            status: DispatchStatus::Filtered,
            status_code: None,
            response_body: None,
            error: None,
            dispatched_at: Utc::now(),
        },
        Ok(EvalOutcome::Pass(transformed_payload)) => {
            let result = state
                .dispatcher
                .dispatch(
                    &webhook.destination_url,
                    raw_event.id,
                    webhook.id,
                    &path,
                    &transformed_payload,
                )
                .await;
            TransformedEvent {
                id: Uuid::new_v4(),
                raw_event_id: raw_event.id,
                webhook_id: webhook.id,
                destination_url: webhook.destination_url.clone(),
                transformed_payload: Some(transformed_payload),
                status: result.status,
                status_code: result.status_code,
                response_body: result.response_body,
                error: result.error,
                dispatched_at: Utc::now(),
            }
        }
    };

    audit::record_transformed_event(&state.engine, &transformed_event)?;
    Ok(Json(serde_json::json!({
        "raw_event_id": raw_event.id,
        "status": transformed_event.status,
    })))
}
