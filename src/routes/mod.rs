// HTTP routes: one authenticated GET returning the telemetry snapshot

mod http;

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{self, ApiKeyGate};
use crate::sysinfo_repo::Collector;

pub(crate) struct AppState<C> {
    pub(crate) collector: Arc<C>,
}

// Manual impl: derive would require `C: Clone`.
impl<C> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            collector: self.collector.clone(),
        }
    }
}

/// `path` must be a literal route (see `AppConfig::validate`); axum panics on capture syntax.
pub fn app<C: Collector>(collector: Arc<C>, gate: ApiKeyGate, path: &str, debug: bool) -> Router {
    let state = AppState { collector };
    let router = Router::new()
        .route(path, get(http::snapshot_handler::<C>)) // GET <path>
        .route_layer(middleware::from_fn_with_state(gate, auth::require_api_key))
        .with_state(state);
    if debug {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}
