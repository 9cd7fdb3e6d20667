//! HTTP endpoint handlers for the one-shot routes.

use axum::{extract::State, Json};

use crate::status::StatusReport;
use crate::transport::{ContentPayload, DeliveryTag};

use super::state::SharedState;

/// GET /api/hello - current snapshot as a structured payload.
pub async fn get_content(State(state): State<SharedState>) -> Json<ContentPayload> {
    Json(ContentPayload::new(
        &state.store.read(),
        DeliveryTag::StandardRest,
    ))
}

/// GET /api/status - monitoring report.
pub async fn get_status(State(state): State<SharedState>) -> Json<StatusReport> {
    Json(state.reporter.report())
}
