//! AI drafting steps of a planning: diagnosis, then phased plan.
//!
//! The planning is looked up before any provider call so a bad id never
//! costs a request. Provider calls run on the blocking pool.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::plannings::{detail_for, load_planning, PlanningDetail};
use crate::api::error::ApiError;
use crate::api::types::{parse_uuid, ApiContext, ApiJson};
use crate::db;
use crate::drafting::{
    generate_diagnosis, generate_phased_plan, parse_treatment_options, DraftingModel, IntakeForm,
    TreatmentOption,
};
use crate::models::PlanningStatus;
use crate::stage::{planning_stage, Stage};

#[derive(Deserialize)]
pub struct DiagnosisRequest {
    #[serde(default)]
    pub model: DraftingModel,
    pub intake: IntakeForm,
}

#[derive(Serialize)]
pub struct DiagnosisResponse {
    pub diagnosis: String,
    pub options: Vec<TreatmentOption>,
    pub stage: Stage,
}

#[derive(Deserialize)]
pub struct PhasedPlanRequest {
    #[serde(default)]
    pub model: DraftingModel,
    /// Free-text option; wins over `option_number` when both are sent.
    pub selected_option: Option<String>,
    /// Number of one of the options parsed from the stored diagnosis.
    pub option_number: Option<u32>,
}

/// `POST /api/plannings/:id/diagnosis`
pub async fn diagnosis(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<DiagnosisRequest>,
) -> Result<Json<DiagnosisResponse>, ApiError> {
    let id = parse_uuid(&id, "planejamento")?;
    load_planning(&ctx.core.open_db()?, &id)?;

    let model = request.model;
    let intake = request.intake;
    let prompt_intake = intake.clone();
    let draft = ctx
        .draft(move |client| generate_diagnosis(client, &model, &prompt_intake))
        .await?;

    let intake_json = serde_json::to_value(&intake)
        .map_err(|e| ApiError::Internal(format!("intake serialization: {e}")))?;
    let conn = ctx.core.open_db()?;
    db::save_diagnosis(&conn, &id, &intake_json, &draft.diagnosis)?;

    let planning = load_planning(&conn, &id)?;
    let contracts = db::list_contracts_for_planning(&conn, &id)?;
    tracing::info!(planning_id = %id, options = draft.options.len(), "Diagnosis saved");

    Ok(Json(DiagnosisResponse {
        diagnosis: draft.diagnosis,
        options: draft.options,
        stage: planning_stage(&planning, &contracts),
    }))
}

/// Resolve the option the clinician picked against the stored diagnosis.
fn resolve_option(
    diagnosis: &str,
    selected_option: Option<String>,
    option_number: Option<u32>,
) -> Result<String, ApiError> {
    if let Some(text) = selected_option.filter(|t| !t.trim().is_empty()) {
        return Ok(text.trim().to_string());
    }
    let number = option_number
        .ok_or_else(|| ApiError::BadRequest("Selecione uma opção de tratamento".into()))?;
    parse_treatment_options(diagnosis)
        .into_iter()
        .find(|o| o.number == number)
        .map(|o| format!("Opção {}: {}", o.number, o.text))
        .ok_or_else(|| ApiError::BadRequest(format!("Opção {number} não encontrada no diagnóstico")))
}

/// `POST /api/plannings/:id/phased-plan`: stores the plan and marks the
/// planning `COMPLETED`.
pub async fn phased_plan(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<PhasedPlanRequest>,
) -> Result<Json<PlanningDetail>, ApiError> {
    let id = parse_uuid(&id, "planejamento")?;
    let planning = load_planning(&ctx.core.open_db()?, &id)?;

    let diagnosis = planning
        .diagnosis
        .clone()
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| {
            ApiError::BadRequest("Gere o diagnóstico antes do plano de tratamento".into())
        })?;
    let option = resolve_option(&diagnosis, request.selected_option, request.option_number)?;
    let intake: IntakeForm = planning
        .intake
        .clone()
        .and_then(|raw| serde_json::from_value(raw).ok())
        .unwrap_or_default();

    let model = request.model;
    let chosen = option.clone();
    let plan = ctx
        .draft(move |client| generate_phased_plan(client, &model, &intake, &diagnosis, &chosen))
        .await?;

    let conn = ctx.core.open_db()?;
    db::save_generated_plan(&conn, &id, &option, &plan, PlanningStatus::Completed)?;
    tracing::info!(planning_id = %id, "Phased plan saved");

    let planning = load_planning(&conn, &id)?;
    detail_for(&conn, planning).map(Json)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIAGNOSIS: &str = "# Diagnóstico\nClasse II\n\n# Opções de tratamento\n\
        Opção 1: Aparelho fixo - corrige apinhamento\n\
        Opção 2: Alinhadores - estética";

    #[test]
    fn free_text_option_wins() {
        let option = resolve_option(DIAGNOSIS, Some(" Extrações ".into()), Some(1)).unwrap();
        assert_eq!(option, "Extrações");
    }

    #[test]
    fn option_number_is_looked_up() {
        let option = resolve_option(DIAGNOSIS, None, Some(2)).unwrap();
        assert_eq!(option, "Opção 2: Alinhadores - estética");
    }

    #[test]
    fn unknown_or_missing_option_is_bad_request() {
        assert!(matches!(
            resolve_option(DIAGNOSIS, None, Some(7)),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            resolve_option(DIAGNOSIS, Some("  ".into()), None),
            Err(ApiError::BadRequest(_))
        ));
    }
}
