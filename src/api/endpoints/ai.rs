//! Server-side proxy for OpenAI chat completions. The browser never sees
//! the API key; the body is forwarded as sent, key injected.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson};

/// `POST /api/ai/completions`
pub async fn completions(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let response = ctx.draft(move |client| client.proxy_chat(&body)).await?;
    Ok(Json(response))
}
