use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::{conflict_as, ApiError};
use crate::api::types::{optional, parse_uuid, required, ApiContext, ApiJson};
use crate::db;
use crate::models::Permission;

const NAME_TAKEN: &str = "Já existe uma permissão com este nome";

#[derive(Deserialize)]
pub struct PermissionPayload {
    pub name: String,
    pub description: Option<String>,
}

/// `GET /api/permissions`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Permission>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_permissions(&conn)?))
}

/// `POST /api/permissions`
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(payload): ApiJson<PermissionPayload>,
) -> Result<(StatusCode, Json<Permission>), ApiError> {
    let permission = Permission {
        id: Uuid::new_v4(),
        name: required(&payload.name, "O nome da permissão é obrigatório")?,
        description: optional(payload.description),
        created_at: db::now(),
    };
    let conn = ctx.core.open_db()?;
    db::insert_permission(&conn, &permission).map_err(conflict_as(NAME_TAKEN))?;
    Ok((StatusCode::CREATED, Json(permission)))
}

/// `PUT /api/permissions/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<PermissionPayload>,
) -> Result<Json<Permission>, ApiError> {
    let id = parse_uuid(&id, "permissão")?;
    let conn = ctx.core.open_db()?;
    let mut permission = db::get_permission(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Permissão não encontrada".into()))?;

    permission.name = required(&payload.name, "O nome da permissão é obrigatório")?;
    permission.description = optional(payload.description);
    db::update_permission(&conn, &permission).map_err(conflict_as(NAME_TAKEN))?;
    Ok(Json(permission))
}

/// `DELETE /api/permissions/:id`: also drops the permission from every role.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "permissão")?;
    let conn = ctx.core.open_db()?;
    db::delete_permission(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
