// GET handler: snapshot

use axum::{Json, extract::State};

use super::AppState;
use crate::models::AggregateSnapshot;
use crate::sysinfo_repo::Collector;

/// Only reached once the gate has passed; always 200, whatever could not be collected is empty.
pub(super) async fn snapshot_handler<C: Collector>(
    State(state): State<AppState<C>>,
) -> Json<AggregateSnapshot> {
    Json(state.collector.collect().await)
}
