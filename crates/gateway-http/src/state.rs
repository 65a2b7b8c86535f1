use std::sync::Arc;

use gateway_core::GatewayConfig;
use gateway_dispatch::Dispatcher;
use gateway_store::EngineHandle;

/// Shared state handed to every handler: the engine handle (itself cheaply
/// cloneable), the dispatcher client, and the resolved configuration.
#[derive(Clone)]
pub struct AppState {
    pub engine: EngineHandle,
    pub dispatcher: Dispatcher,
    pub config: Arc<GatewayConfig>,
}
