//! Liveness endpoint.
//!
//! `GET /healthz` pings the database and reports which notification
//! channels came up configured. An unconfigured channel is expected in
//! some deployments (the engine soft-skips those sends), so only the
//! database check gates the overall status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use mifugo_db::DbPool;

/// Channel configuration snapshot taken at bootstrap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    pub email_configured: bool,
    pub sms_configured: bool,
}

#[derive(Clone)]
pub struct HealthState {
    db_pool: DbPool,
    channels: ChannelStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub database_detail: Option<String>,
    pub channels: ChannelStatus,
    pub checked_at: String,
}

pub fn router(db_pool: DbPool, channels: ChannelStatus) -> Router {
    Router::new().route("/healthz", get(health)).with_state(HealthState { db_pool, channels })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let database_error = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.db_pool)
        .await
        .err()
        .map(|error| error.to_string());

    let ready = database_error.is_none();
    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        database: if ready { "ready" } else { "degraded" },
        database_detail: database_error,
        channels: state.channels,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;

    use mifugo_db::connect_with_settings;

    use super::{health, ChannelStatus, HealthState};

    const NO_CHANNELS: ChannelStatus =
        ChannelStatus { email_configured: false, sms_configured: false };

    #[tokio::test]
    async fn ready_when_database_answers() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");

        let (status, Json(payload)) =
            health(State(HealthState { db_pool: pool.clone(), channels: NO_CHANNELS })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert!(payload.database_detail.is_none());

        pool.close().await;
    }

    #[tokio::test]
    async fn degraded_when_database_is_down() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");
        pool.close().await;

        let (status, Json(payload)) =
            health(State(HealthState { db_pool: pool, channels: NO_CHANNELS })).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert!(payload.database_detail.is_some());
    }

    #[tokio::test]
    async fn unconfigured_channels_do_not_degrade_readiness() {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");

        let channels = ChannelStatus { email_configured: true, sms_configured: false };
        let (status, Json(payload)) =
            health(State(HealthState { db_pool: pool.clone(), channels })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.channels, channels);

        pool.close().await;
    }
}
