//! Treatment tracking, one record per planning.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::api::endpoints::plannings::load_planning;
use crate::api::error::ApiError;
use crate::api::types::{optional, parse_uuid, ApiContext, ApiJson};
use crate::db::{self, TreatmentFields};
use crate::models::{Treatment, TreatmentStatus};

#[derive(Deserialize)]
pub struct TreatmentPayload {
    pub start_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub last_appointment: Option<NaiveDate>,
    #[serde(default)]
    pub status: TreatmentStatus,
    pub notes: Option<String>,
}

impl TreatmentPayload {
    /// Dates after the start must not precede it.
    fn validate(self) -> Result<TreatmentFields, ApiError> {
        let start_date = self
            .start_date
            .ok_or_else(|| ApiError::BadRequest("A data de início é obrigatória".into()))?;
        for (date, label) in [
            (self.deadline, "O prazo"),
            (self.end_date, "A data de término"),
            (self.last_appointment, "A última consulta"),
        ] {
            if date.is_some_and(|d| d < start_date) {
                return Err(ApiError::BadRequest(format!(
                    "{label} não pode ser anterior à data de início"
                )));
            }
        }
        Ok(TreatmentFields {
            start_date,
            deadline: self.deadline,
            end_date: self.end_date,
            last_appointment: self.last_appointment,
            status: self.status,
            notes: optional(self.notes),
        })
    }
}

/// `GET /api/plannings/:id/treatment`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(planning_id): Path<String>,
) -> Result<Json<Treatment>, ApiError> {
    let planning_id = parse_uuid(&planning_id, "planejamento")?;
    let conn = ctx.core.open_db()?;
    load_planning(&conn, &planning_id)?;
    let treatment = db::get_treatment_for_planning(&conn, &planning_id)?
        .ok_or_else(|| ApiError::NotFound("Tratamento não encontrado".into()))?;
    Ok(Json(treatment))
}

/// `PUT /api/plannings/:id/treatment`: 201 on first save, 200 afterwards.
pub async fn save(
    State(ctx): State<ApiContext>,
    Path(planning_id): Path<String>,
    ApiJson(payload): ApiJson<TreatmentPayload>,
) -> Result<(StatusCode, Json<Treatment>), ApiError> {
    let planning_id = parse_uuid(&planning_id, "planejamento")?;
    let fields = payload.validate()?;
    let conn = ctx.core.open_db()?;
    load_planning(&conn, &planning_id)?;

    let (treatment, created) = db::save_treatment(&conn, &planning_id, &fields)?;
    tracing::info!(planning_id = %planning_id, status = %treatment.status, created, "Treatment saved");
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(treatment)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(start: Option<&str>, end: Option<&str>) -> TreatmentPayload {
        TreatmentPayload {
            start_date: start.map(|d| d.parse().unwrap()),
            deadline: None,
            end_date: end.map(|d| d.parse().unwrap()),
            last_appointment: None,
            status: TreatmentStatus::default(),
            notes: Some("  ".into()),
        }
    }

    #[test]
    fn start_date_is_required() {
        assert!(matches!(payload(None, None).validate(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let err = payload(Some("2025-05-01"), Some("2025-04-30")).validate().unwrap_err();
        match err {
            ApiError::BadRequest(m) => assert!(m.starts_with("A data de término")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn valid_payload_trims_blank_notes() {
        let fields = payload(Some("2025-05-01"), Some("2026-05-01")).validate().unwrap();
        assert_eq!(fields.status, TreatmentStatus::EmAndamento);
        assert!(fields.notes.is_none());
    }
}
