//! Role administration. A role carries its full permission set; updates
//! replace the set.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::{conflict_as, ApiError};
use crate::api::types::{optional, parse_uuid, required, ApiContext, ApiJson};
use crate::db;
use crate::models::Role;

const NAME_TAKEN: &str = "Já existe uma função com este nome";

#[derive(Deserialize)]
pub struct RolePayload {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort();
    ids.dedup();
    ids
}

/// `GET /api/roles`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Role>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_roles(&conn)?))
}

/// `POST /api/roles`
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(payload): ApiJson<RolePayload>,
) -> Result<(StatusCode, Json<Role>), ApiError> {
    let ts = db::now();
    let role = Role {
        id: Uuid::new_v4(),
        name: required(&payload.name, "O nome da função é obrigatório")?,
        description: optional(payload.description),
        permission_ids: dedup(payload.permission_ids),
        created_at: ts,
        updated_at: ts,
    };

    let conn = ctx.core.open_db()?;
    db::insert_role(&conn, &role).map_err(conflict_as(NAME_TAKEN))?;
    tracing::info!(role_id = %role.id, permissions = role.permission_ids.len(), "Role created");
    Ok((StatusCode::CREATED, Json(role)))
}

/// `GET /api/roles/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Role>, ApiError> {
    let id = parse_uuid(&id, "função")?;
    let conn = ctx.core.open_db()?;
    let role = db::get_role(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Função não encontrada".into()))?;
    Ok(Json(role))
}

/// `PUT /api/roles/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<RolePayload>,
) -> Result<Json<Role>, ApiError> {
    let id = parse_uuid(&id, "função")?;
    let conn = ctx.core.open_db()?;
    let mut role = db::get_role(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Função não encontrada".into()))?;

    role.name = required(&payload.name, "O nome da função é obrigatório")?;
    role.description = optional(payload.description);
    role.permission_ids = dedup(payload.permission_ids);
    role.updated_at = db::now();

    db::update_role(&conn, &role).map_err(conflict_as(NAME_TAKEN))?;
    Ok(Json(role))
}

/// `DELETE /api/roles/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "função")?;
    let conn = ctx.core.open_db()?;
    db::delete_role(&conn, &id)?;
    tracing::info!(role_id = %id, "Role deleted");
    Ok(StatusCode::NO_CONTENT)
}
