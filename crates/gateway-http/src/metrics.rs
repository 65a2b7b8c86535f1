use axum::extract::State;
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

pub async fn render(State(state): State<MetricsState>) -> String {
    state.handle.render()
}
