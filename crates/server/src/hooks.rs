//! Write-trigger endpoint.
//!
//! The store calls `POST /hooks/requisitions/{id}` on every create, update,
//! or delete of a requisition, with the record's value before and after the
//! write (either may be absent: absent-before is a creation, absent-after a
//! deletion). The response is always 202: delivery failures surface only
//! in logs, never to the trigger.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use mifugo_core::domain::requisition::Requisition;
use mifugo_notify::TransitionReactor;

#[derive(Clone)]
pub struct HooksState {
    reactor: Arc<TransitionReactor>,
}

#[derive(Debug, Deserialize)]
pub struct WritePayload {
    #[serde(default)]
    pub before: Option<Requisition>,
    #[serde(default)]
    pub after: Option<Requisition>,
}

pub fn router(reactor: Arc<TransitionReactor>) -> Router {
    Router::new()
        .route("/hooks/requisitions/{id}", post(requisition_written))
        .with_state(HooksState { reactor })
}

pub async fn requisition_written(
    State(state): State<HooksState>,
    Path(id): Path<String>,
    Json(payload): Json<WritePayload>,
) -> StatusCode {
    info!(
        requisition_id = %id,
        created = payload.before.is_none(),
        deleted = payload.after.is_none(),
        "requisition write received"
    );

    state.reactor.handle_write(payload.before.as_ref(), payload.after.as_ref()).await;
    StatusCode::ACCEPTED
}
