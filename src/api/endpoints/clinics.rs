//! Clinic registry. The clinic carries the legal data and the contract
//! template used by contract generation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{optional, parse_uuid, required, ApiContext, ApiJson};
use crate::db;
use crate::models::Clinic;

#[derive(Deserialize)]
pub struct ClinicPayload {
    pub name: String,
    pub legal_name: Option<String>,
    pub document_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub responsible_professional: Option<String>,
    pub professional_registration: Option<String>,
    pub contract_template: Option<String>,
}

impl ClinicPayload {
    fn apply(self, clinic: &mut Clinic) -> Result<(), ApiError> {
        clinic.name = required(&self.name, "O nome da clínica é obrigatório")?;
        clinic.legal_name = optional(self.legal_name);
        clinic.document_number = optional(self.document_number);
        clinic.address = optional(self.address);
        clinic.phone = optional(self.phone);
        clinic.email = optional(self.email).map(|e| e.to_lowercase());
        clinic.responsible_professional = optional(self.responsible_professional);
        clinic.professional_registration = optional(self.professional_registration);
        // template keeps its own whitespace
        clinic.contract_template = self.contract_template.filter(|t| !t.trim().is_empty());
        Ok(())
    }
}

/// `GET /api/clinics`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<Vec<Clinic>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_clinics(&conn)?))
}

/// `POST /api/clinics`
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(payload): ApiJson<ClinicPayload>,
) -> Result<(StatusCode, Json<Clinic>), ApiError> {
    let ts = db::now();
    let mut clinic = Clinic {
        id: Uuid::new_v4(),
        name: String::new(),
        legal_name: None,
        document_number: None,
        address: None,
        phone: None,
        email: None,
        responsible_professional: None,
        professional_registration: None,
        contract_template: None,
        created_at: ts,
        updated_at: ts,
    };
    payload.apply(&mut clinic)?;

    let conn = ctx.core.open_db()?;
    db::insert_clinic(&conn, &clinic)?;
    tracing::info!(clinic_id = %clinic.id, "Clinic created");
    Ok((StatusCode::CREATED, Json(clinic)))
}

/// `GET /api/clinics/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Clinic>, ApiError> {
    let id = parse_uuid(&id, "clínica")?;
    let conn = ctx.core.open_db()?;
    let clinic = db::get_clinic(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Clínica não encontrada".into()))?;
    Ok(Json(clinic))
}

/// `PUT /api/clinics/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<ClinicPayload>,
) -> Result<Json<Clinic>, ApiError> {
    let id = parse_uuid(&id, "clínica")?;
    let conn = ctx.core.open_db()?;
    let mut clinic = db::get_clinic(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Clínica não encontrada".into()))?;
    payload.apply(&mut clinic)?;
    clinic.updated_at = db::now();

    db::update_clinic(&conn, &clinic)?;
    Ok(Json(clinic))
}

/// `DELETE /api/clinics/:id`: cascades to the clinic's patients.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "clínica")?;
    let conn = ctx.core.open_db()?;
    db::delete_clinic(&conn, &id)?;
    tracing::info!(clinic_id = %id, "Clinic deleted");
    Ok(StatusCode::NO_CONTENT)
}
