use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use gateway_core::GatewayError;

use crate::state::AppState;

/// Rejects any admin request whose `X-API-Key` header does not match the
/// configured shared secret. The webhook ingress and the ambient
/// `/healthz` and `/metrics` endpoints sit outside this layer.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, GatewayError> {
    let provided = request
        .headers()
        .get("X-API-Key")
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if key == state.config.api_key => Ok(next.run(request).await),
        _ => Err(GatewayError::Unauthorized),
    }
}
