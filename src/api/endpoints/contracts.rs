//! Contracts of a planning: generation from the clinic template plus an
//! AI-drafted summary, manual edits, signing and PDF export.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::endpoints::exports::pdf_response;
use crate::api::endpoints::plannings::load_planning;
use crate::api::error::ApiError;
use crate::api::types::{parse_uuid, required, ApiContext, ApiJson};
use crate::db;
use crate::drafting::{generate_contract_summary, DraftingModel};
use crate::export::{
    build_contract_text, contract_header, export_filename, layout_document, signature_blocks,
    DocumentKind,
};
use crate::models::{Clinic, Contract, Patient};

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct GenerateContractRequest {
    pub model: DraftingModel,
}

#[derive(Deserialize)]
pub struct ContractContentRequest {
    pub content: String,
}

fn load_contract(conn: &Connection, id: &Uuid) -> Result<Contract, ApiError> {
    db::get_contract(conn, id)?.ok_or_else(|| ApiError::NotFound("Contrato não encontrado".into()))
}

/// Patient and clinic behind a planning.
fn parties(conn: &Connection, patient_id: &Uuid) -> Result<(Patient, Option<Clinic>), ApiError> {
    let patient = db::get_patient(conn, patient_id)?
        .ok_or_else(|| ApiError::NotFound("Paciente não encontrado".into()))?;
    let clinic = db::get_clinic(conn, &patient.clinic_id)?;
    Ok((patient, clinic))
}

/// `GET /api/plannings/:id/contracts`
pub async fn list_for_planning(
    State(ctx): State<ApiContext>,
    Path(planning_id): Path<String>,
) -> Result<Json<Vec<Contract>>, ApiError> {
    let planning_id = parse_uuid(&planning_id, "planejamento")?;
    let conn = ctx.core.open_db()?;
    load_planning(&conn, &planning_id)?;
    Ok(Json(db::list_contracts_for_planning(&conn, &planning_id)?))
}

/// `POST /api/plannings/:id/contracts`: needs a stored plan.
pub async fn generate(
    State(ctx): State<ApiContext>,
    Path(planning_id): Path<String>,
    request: Option<ApiJson<GenerateContractRequest>>,
) -> Result<(StatusCode, Json<Contract>), ApiError> {
    let planning_id = parse_uuid(&planning_id, "planejamento")?;
    let model = request.map(|ApiJson(r)| r.model).unwrap_or_default();

    let (plan, patient, clinic) = {
        let conn = ctx.core.open_db()?;
        let planning = load_planning(&conn, &planning_id)?;
        let plan = planning
            .ai_response
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                ApiError::BadRequest("Gere o plano de tratamento antes do contrato".into())
            })?;
        let (patient, clinic) = parties(&conn, &planning.patient_id)?;
        let clinic =
            clinic.ok_or_else(|| ApiError::NotFound("Clínica não encontrada".into()))?;
        (plan, patient, clinic)
    };

    let patient_name = patient.name.clone();
    let summary = ctx
        .draft(move |client| generate_contract_summary(client, &model, &patient_name, &plan))
        .await?;

    let ts = db::now();
    let contract = Contract {
        id: Uuid::new_v4(),
        planning_id,
        content: build_contract_text(&clinic, &patient, &summary, ts.date()),
        is_signed: false,
        signed_at: None,
        created_at: ts,
        updated_at: ts,
    };
    let conn = ctx.core.open_db()?;
    db::insert_contract(&conn, &contract)?;
    tracing::info!(contract_id = %contract.id, planning_id = %planning_id, "Contract generated");
    Ok((StatusCode::CREATED, Json(contract)))
}

/// `GET /api/contracts/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    let id = parse_uuid(&id, "contrato")?;
    let conn = ctx.core.open_db()?;
    Ok(Json(load_contract(&conn, &id)?))
}

/// `PUT /api/contracts/:id`: manual edit of the contract body.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ContractContentRequest>,
) -> Result<Json<Contract>, ApiError> {
    let id = parse_uuid(&id, "contrato")?;
    let content = required(&request.content, "O conteúdo do contrato é obrigatório")?;
    let conn = ctx.core.open_db()?;
    db::update_contract_content(&conn, &id, &content)?;
    Ok(Json(load_contract(&conn, &id)?))
}

/// `POST /api/contracts/:id/sign`: idempotent; the first signature time sticks.
pub async fn sign(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Contract>, ApiError> {
    let id = parse_uuid(&id, "contrato")?;
    let conn = ctx.core.open_db()?;
    db::mark_contract_signed(&conn, &id)?;
    let contract = load_contract(&conn, &id)?;
    tracing::info!(contract_id = %id, planning_id = %contract.planning_id, "Contract signed");
    Ok(Json(contract))
}

/// `DELETE /api/contracts/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "contrato")?;
    let conn = ctx.core.open_db()?;
    db::delete_contract(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/contracts/:id/pdf`
pub async fn contract_pdf(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_uuid(&id, "contrato")?;
    let conn = ctx.core.open_db()?;
    let contract = load_contract(&conn, &id)?;
    let planning = load_planning(&conn, &contract.planning_id)?;
    let (patient, clinic) = parties(&conn, &planning.patient_id)?;

    let header = contract_header(clinic.as_ref(), &patient, &contract);
    let signatures = signature_blocks(clinic.as_ref(), &patient);
    let layout = layout_document(&header, &contract.content, &signatures)?;
    pdf_response(&layout, &export_filename(&patient.name, DocumentKind::Contract))
}
