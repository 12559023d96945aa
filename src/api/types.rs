//! Shared types for the HTTP layer.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::{async_trait, Json};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::drafting::{DraftingError, HttpDraftingClient, LlmClient};

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub drafting: Arc<dyn LlmClient>,
}

impl ApiContext {
    /// Context with the HTTP drafting client built from the core config.
    pub fn new(core: Arc<CoreState>) -> Self {
        let drafting: Arc<dyn LlmClient> = Arc::new(HttpDraftingClient::from_config(&core.config));
        Self { core, drafting }
    }

    pub fn with_drafting(core: Arc<CoreState>, drafting: Arc<dyn LlmClient>) -> Self {
        Self { core, drafting }
    }

    /// Run a drafting call off the async runtime.
    pub async fn draft<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn LlmClient) -> Result<T, DraftingError> + Send + 'static,
    {
        let client = Arc::clone(&self.drafting);
        tokio::task::spawn_blocking(move || call(client.as_ref()))
            .await
            .map_err(|e| ApiError::Internal(format!("drafting task failed: {e}")))?
            .map_err(ApiError::from)
    }
}

/// JSON body extractor whose rejections use the API error body.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::debug!(detail = %rejection.body_text(), "Rejected request body");
    let message = match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "O corpo da requisição deve ser JSON (Content-Type: application/json)"
        }
        JsonRejection::JsonSyntaxError(_) => "JSON malformado no corpo da requisição",
        JsonRejection::JsonDataError(_) => {
            "Campos obrigatórios ausentes ou inválidos no corpo da requisição"
        }
        _ => "Não foi possível ler o corpo da requisição",
    };
    ApiError::BadRequest(message.to_string())
}

/// Query-string extractor whose rejections use the API error body.
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| Self(value))
            .map_err(|rejection: QueryRejection| {
                tracing::debug!(detail = %rejection.body_text(), "Rejected query string");
                ApiError::BadRequest("Parâmetros de consulta inválidos".into())
            })
    }
}

/// Parse a path id, naming the entity in the error.
pub fn parse_uuid(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("ID de {entity} inválido")))
}

/// Trimmed required text field.
pub fn required(value: &str, message: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest(message.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trimmed optional text field; blank becomes `None`.
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_uuid_rejects_garbage() {
        assert!(parse_uuid(&Uuid::new_v4().to_string(), "paciente").is_ok());
        match parse_uuid("abc", "paciente") {
            Err(ApiError::BadRequest(m)) => assert_eq!(m, "ID de paciente inválido"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn required_and_optional_trim() {
        assert_eq!(required("  Ana ", "x").unwrap(), "Ana");
        assert!(required("   ", "Nome obrigatório").is_err());
        assert_eq!(optional(Some("  ".into())), None);
        assert_eq!(optional(Some(" a ".into())), Some("a".into()));
        assert_eq!(optional(None), None);
    }
}
