//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::core_state::CoreError;
use crate::crypto::CryptoError;
use crate::db::DatabaseError;
use crate::drafting::DraftingError;
use crate::export::ExportError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Upstream AI error: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::Upstream(detail) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", detail),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "Erro interno do servidor".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

/// Map a repository error, turning unique-index violations into a 409 with
/// the given message.
pub fn conflict_as(message: &'static str) -> impl Fn(DatabaseError) -> ApiError {
    move |err| {
        if err.is_unique_violation() {
            ApiError::Conflict(message.to_string())
        } else {
            ApiError::from(err)
        }
    }
}

fn entity_label(entity_type: &str) -> &'static str {
    match entity_type {
        "clinic" => "Clínica não encontrada",
        "patient" => "Paciente não encontrado",
        "planning" => "Planejamento não encontrado",
        "contract" => "Contrato não encontrado",
        "treatment" => "Tratamento não encontrado",
        "user" => "Usuário não encontrado",
        "role" => "Função não encontrada",
        "permission" => "Permissão não encontrada",
        _ => "Registro não encontrado",
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, .. } => {
                ApiError::NotFound(entity_label(&entity_type).to_string())
            }
            e if e.is_unique_violation() => ApiError::Conflict("Registro duplicado".into()),
            e if e.is_foreign_key_violation() => {
                ApiError::BadRequest("Registro relacionado não existe".into())
            }
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => ApiError::from(e),
        }
    }
}

impl From<DraftingError> for ApiError {
    fn from(err: DraftingError) -> Self {
        match err {
            DraftingError::MissingApiKey(provider) => ApiError::BadRequest(format!(
                "Chave de API do {} não configurada no servidor",
                provider.display_name()
            )),
            DraftingError::InvalidInput(message) => ApiError::BadRequest(message),
            DraftingError::Upstream {
                provider,
                status,
                message,
            } => {
                tracing::warn!(%provider, status, %message, "AI provider rejected request");
                ApiError::Upstream(message)
            }
            DraftingError::HttpClient(detail) => {
                tracing::warn!(%detail, "AI provider unreachable");
                ApiError::Upstream("Falha na comunicação com o provedor de IA".into())
            }
            DraftingError::ResponseParsing(detail) => {
                tracing::warn!(%detail, "AI provider response unreadable");
                ApiError::Upstream("Resposta inválida do provedor de IA".into())
            }
            DraftingError::EmptyCompletion => {
                ApiError::Upstream("O provedor de IA retornou uma resposta vazia".into())
            }
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::EmptyContent => {
                ApiError::BadRequest("Não há conteúdo para exportar".into())
            }
            ExportError::Pdf(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::EmptyPassword => ApiError::BadRequest("A senha é obrigatória".into()),
            CryptoError::MalformedHash => ApiError::Internal(err.to_string()),
        }
    }
}
