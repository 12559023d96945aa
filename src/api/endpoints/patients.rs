//! Patient registry, scoped to a clinic.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{optional, parse_uuid, required, ApiContext, ApiJson, ApiQuery};
use crate::db;
use crate::models::Patient;

#[derive(Deserialize)]
pub struct PatientQuery {
    pub clinic_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct PatientPayload {
    /// Ignored on update: a patient never changes clinic.
    pub clinic_id: Option<Uuid>,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub document_number: Option<String>,
    pub guardian_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

impl PatientPayload {
    fn apply(self, patient: &mut Patient) -> Result<(), ApiError> {
        patient.name = required(&self.name, "O nome do paciente é obrigatório")?;
        patient.birth_date = self.birth_date;
        patient.document_number = optional(self.document_number);
        patient.guardian_name = optional(self.guardian_name);
        patient.phone = optional(self.phone);
        patient.email = optional(self.email).map(|e| e.to_lowercase());
        patient.notes = optional(self.notes);
        Ok(())
    }
}

/// `GET /api/patients?clinic_id=`
pub async fn list(
    State(ctx): State<ApiContext>,
    ApiQuery(query): ApiQuery<PatientQuery>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.core.open_db()?;
    Ok(Json(db::list_patients(&conn, query.clinic_id.as_ref())?))
}

/// `POST /api/patients`
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(payload): ApiJson<PatientPayload>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    let clinic_id = payload
        .clinic_id
        .ok_or_else(|| ApiError::BadRequest("A clínica do paciente é obrigatória".into()))?;

    let ts = db::now();
    let mut patient = Patient {
        id: Uuid::new_v4(),
        clinic_id,
        name: String::new(),
        birth_date: None,
        document_number: None,
        guardian_name: None,
        phone: None,
        email: None,
        notes: None,
        created_at: ts,
        updated_at: ts,
    };
    payload.apply(&mut patient)?;

    let conn = ctx.core.open_db()?;
    if db::get_clinic(&conn, &clinic_id)?.is_none() {
        return Err(ApiError::BadRequest("Clínica informada não existe".into()));
    }
    db::insert_patient(&conn, &patient)?;
    tracing::info!(patient_id = %patient.id, clinic_id = %clinic_id, "Patient created");
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `GET /api/patients/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_uuid(&id, "paciente")?;
    let conn = ctx.core.open_db()?;
    let patient = db::get_patient(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Paciente não encontrado".into()))?;
    Ok(Json(patient))
}

/// `PUT /api/patients/:id`
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<PatientPayload>,
) -> Result<Json<Patient>, ApiError> {
    let id = parse_uuid(&id, "paciente")?;
    let conn = ctx.core.open_db()?;
    let mut patient = db::get_patient(&conn, &id)?
        .ok_or_else(|| ApiError::NotFound("Paciente não encontrado".into()))?;
    payload.apply(&mut patient)?;
    patient.updated_at = db::now();

    db::update_patient(&conn, &patient)?;
    Ok(Json(patient))
}

/// `DELETE /api/patients/:id`: cascades to plannings, contracts and treatments.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "paciente")?;
    let conn = ctx.core.open_db()?;
    db::delete_patient(&conn, &id)?;
    tracing::info!(patient_id = %id, "Patient deleted");
    Ok(StatusCode::NO_CONTENT)
}
