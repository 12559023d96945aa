//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiQuery};
use crate::core_state::AccessEntry;

const DEFAULT_ACCESS_LIMIT: usize = 50;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub requests_served: u64,
    pub database: bool,
}

/// `GET /api/health`: liveness plus a database round trip.
pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let database = match ctx.core.open_db() {
        Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check cannot open database");
            false
        }
    };

    Ok(Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        version: crate::config::APP_VERSION,
        uptime_secs: ctx.core.uptime_secs(),
        requests_served: ctx.core.requests_served(),
        database,
    }))
}

#[derive(Deserialize)]
pub struct AccessQuery {
    pub limit: Option<usize>,
}

/// `GET /api/health/access?limit=`: most recent requests, newest first.
pub async fn access_log(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<AccessQuery>,
) -> Json<Vec<AccessEntry>> {
    Json(ctx.core.recent_access(query.limit.unwrap_or(DEFAULT_ACCESS_LIMIT)))
}
