//! Planning records and their derived stage.
//!
//! The stage is computed on every read from the planning and its
//! contracts; nothing here writes it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{parse_uuid, ApiContext, ApiJson};
use crate::db;
use crate::drafting::{parse_treatment_options, TreatmentOption};
use crate::models::{Contract, PatientPlanning, PlanningStatus, Treatment};
use crate::stage::{planning_stage, stage_progress, Stage, StageStep};

/// Planning row plus its derived stage, as listed under a patient.
#[derive(Serialize)]
pub struct PlanningSummary {
    #[serde(flatten)]
    pub planning: PatientPlanning,
    pub stage: Stage,
}

#[derive(Serialize)]
pub struct PlanningDetail {
    pub planning: PatientPlanning,
    pub stage: Stage,
    pub stage_progress: Vec<StageStep>,
    pub options: Vec<TreatmentOption>,
    pub contracts: Vec<Contract>,
    pub treatment: Option<Treatment>,
}

#[derive(Deserialize)]
pub struct CreatePlanningRequest {
    pub patient_id: Uuid,
    pub intake: Option<serde_json::Value>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: PlanningStatus,
}

#[derive(Deserialize)]
pub struct PlanContentRequest {
    pub content: Option<String>,
}

/// Load a planning or fail with 404.
pub(crate) fn load_planning(conn: &Connection, id: &Uuid) -> Result<PatientPlanning, ApiError> {
    db::get_planning(conn, id)?
        .ok_or_else(|| ApiError::NotFound("Planejamento não encontrado".into()))
}

pub(crate) fn detail_for(
    conn: &Connection,
    planning: PatientPlanning,
) -> Result<PlanningDetail, ApiError> {
    let contracts = db::list_contracts_for_planning(conn, &planning.id)?;
    let treatment = db::get_treatment_for_planning(conn, &planning.id)?;
    let stage = planning_stage(&planning, &contracts);
    let options = planning
        .diagnosis
        .as_deref()
        .map(parse_treatment_options)
        .unwrap_or_default();
    Ok(PlanningDetail {
        stage,
        stage_progress: stage_progress(stage),
        options,
        contracts,
        treatment,
        planning,
    })
}

/// `GET /api/patients/:id/plannings`: newest first.
pub async fn list_for_patient(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Vec<PlanningSummary>>, ApiError> {
    let patient_id = parse_uuid(&patient_id, "paciente")?;
    let conn = ctx.core.open_db()?;
    if db::get_patient(&conn, &patient_id)?.is_none() {
        return Err(ApiError::NotFound("Paciente não encontrado".into()));
    }

    let plannings = db::list_plannings_for_patient(&conn, &patient_id)?;
    let mut summaries = Vec::with_capacity(plannings.len());
    for planning in plannings {
        let contracts = db::list_contracts_for_planning(&conn, &planning.id)?;
        let stage = planning_stage(&planning, &contracts);
        summaries.push(PlanningSummary { planning, stage });
    }
    Ok(Json(summaries))
}

/// `POST /api/plannings`: new plannings start as `DRAFT`.
pub async fn create(
    State(ctx): State<ApiContext>,
    ApiJson(request): ApiJson<CreatePlanningRequest>,
) -> Result<(StatusCode, Json<PlanningDetail>), ApiError> {
    let conn = ctx.core.open_db()?;
    if db::get_patient(&conn, &request.patient_id)?.is_none() {
        return Err(ApiError::BadRequest("Paciente informado não existe".into()));
    }

    let ts = db::now();
    let planning = PatientPlanning {
        id: Uuid::new_v4(),
        patient_id: request.patient_id,
        status: PlanningStatus::Draft,
        intake: request.intake.filter(|v| !v.is_null()),
        diagnosis: None,
        selected_option: None,
        ai_response: None,
        created_at: ts,
        updated_at: ts,
    };
    db::insert_planning(&conn, &planning)?;
    tracing::info!(planning_id = %planning.id, patient_id = %planning.patient_id, "Planning created");

    Ok((StatusCode::CREATED, Json(detail_for(&conn, planning)?)))
}

/// `GET /api/plannings/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<PlanningDetail>, ApiError> {
    let id = parse_uuid(&id, "planejamento")?;
    let conn = ctx.core.open_db()?;
    let planning = load_planning(&conn, &id)?;
    Ok(Json(detail_for(&conn, planning)?))
}

/// `PUT /api/plannings/:id/status`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<Json<PlanningDetail>, ApiError> {
    let id = parse_uuid(&id, "planejamento")?;
    let conn = ctx.core.open_db()?;
    db::update_planning_status(&conn, &id, request.status)?;
    let planning = load_planning(&conn, &id)?;
    Ok(Json(detail_for(&conn, planning)?))
}

/// `PUT /api/plannings/:id/plan`: save an edited plan; blank clears it.
pub async fn update_plan(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<PlanContentRequest>,
) -> Result<Json<PlanningDetail>, ApiError> {
    let id = parse_uuid(&id, "planejamento")?;
    let conn = ctx.core.open_db()?;
    let content = request.content.filter(|c| !c.trim().is_empty());
    db::update_plan_content(&conn, &id, content.as_deref())?;
    tracing::info!(planning_id = %id, cleared = content.is_none(), "Plan content saved");
    let planning = load_planning(&conn, &id)?;
    Ok(Json(detail_for(&conn, planning)?))
}

/// `DELETE /api/plannings/:id`
pub async fn remove(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "planejamento")?;
    let conn = ctx.core.open_db()?;
    db::delete_planning(&conn, &id)?;
    Ok(StatusCode::NO_CONTENT)
}
