use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// Liveness/readiness probe. Confirms the engine mutex can still be
/// acquired and a trivial query still runs, rather than just returning a
/// static 200.
pub async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let ok = state
        .engine
        .lock()
        .execute_batch("SELECT 1")
        .is_ok();
    Json(serde_json::json!({ "status": if ok { "ok" } else { "degraded" } }))
}
