//! User administration.
//!
//! - `GET /api/users?clinic_id=`: list
//! - `POST /api/users`: create (password required)
//! - `GET /api/users/:id`, `PUT /api/users/:id`, `DELETE /api/users/:id`

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::{conflict_as, ApiError};
use crate::api::types::{optional, parse_uuid, required, ApiContext, ApiJson, ApiQuery};
use crate::crypto::hash_password;
use crate::db;
use crate::models::User;

const EMAIL_TAKEN: &str = "Já existe um usuário com este e-mail";

#[derive(Deserialize)]
pub struct UserQuery {
    pub clinic_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub clinic_id: Option<Uuid>,
    pub role_id: Option<Uuid>,
    pub active: Option<bool>,
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = required(raw, "O e-mail é obrigatório")?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(ApiError::BadRequest("E-mail inválido".into())),
    }
}

/// `GET /api/users`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_users(&conn, query.clinic_id.as_ref())?))
}

/// `POST /api/users`
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let name = required(&payload.name, "O nome é obrigatório")?;
    let email = normalize_email(&payload.email)?;
    let password = payload.password.unwrap_or_default();
    let password_hash = hash_password(&password)?;

    let ts = db::now();
    let user = User {
        id: Uuid::new_v4(),
        clinic_id: payload.clinic_id,
        name,
        email,
        password_hash,
        role_id: payload.role_id,
        active: payload.active.unwrap_or(true),
        created_at: ts,
        updated_at: ts,
    };

    let conn = ctx.core.open_db()?;
    db::insert_user(&conn, &user).map_err(conflict_as(EMAIL_TAKEN))?;
    tracing::info!(user_id = %user.id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/users/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = parse_uuid(&id, "usuário")?;
    let conn = ctx.core.open_db()?;
    let user = db::get_user(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Usuário não encontrado".into()))?;
    Ok(Json(user))
}

/// `PUT /api/users/:id`: a blank or missing password keeps the current one.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<Json<User>, ApiError> {
    let id = parse_uuid(&id, "usuário")?;
    let conn = ctx.core.open_db()?;
    let mut user = db::get_user(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Usuário não encontrado".into()))?;

    user.name = required(&payload.name, "O nome é obrigatório")?;
    user.email = normalize_email(&payload.email)?;
    user.clinic_id = payload.clinic_id;
    user.role_id = payload.role_id;
    if let Some(active) = payload.active {
        user.active = active;
    }
    if let Some(password) = optional(payload.password) {
        user.password_hash = hash_password(&password)?;
    }
    user.updated_at = db::now();

    db::update_user(&conn, &user).map_err(conflict_as(EMAIL_TAKEN))?;
    Ok(Json(user))
}

/// `DELETE /api/users/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "usuário")?;
    let conn = ctx.core.open_db()?;
    db::delete_user(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized_and_checked() {
        assert_eq!(normalize_email(" Ana@Clinica.com.br ").unwrap(), "ana@clinica.com.br");
        assert!(normalize_email("sem-arroba").is_err());
        assert!(normalize_email("@dominio.com").is_err());
        assert!(normalize_email("ana@localhost").is_err());
        assert!(normalize_email("  ").is_err());
    }
}
