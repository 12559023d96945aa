//! PDF exports.
//!
//! Text path: the stored plan is split into sections and laid out with a
//! header. Markup path: client-rendered HTML is flattened and sliced into
//! pages. Both reject empty content with 400.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::api::endpoints::plannings::load_planning;
use crate::api::error::ApiError;
use crate::api::types::{optional, parse_uuid, ApiContext, ApiJson};
use crate::db;
use crate::export::{
    export_filename, layout_document, layout_markup, plan_header, render_pdf, DocumentKind,
    DocumentLayout, PLAN_TITLE,
};

#[derive(Deserialize)]
pub struct MarkupExportRequest {
    pub title: Option<String>,
    pub patient_name: Option<String>,
    pub markup: String,
}

/// Render a layout and wrap it as a PDF download.
pub(crate) fn pdf_response(layout: &DocumentLayout, filename: &str) -> Result<Response, ApiError> {
    let bytes = render_pdf(layout)?;
    tracing::info!(filename, pages = layout.page_count(), bytes = bytes.len(), "PDF exported");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// `GET /api/plannings/:id/pdf`
pub async fn planning_pdf(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_uuid(&id, "planejamento")?;
    let conn = ctx.core.open_db()?;
    let planning = load_planning(&conn, &id)?;
    let patient = db::get_patient(&conn, &planning.patient_id)?
        .ok_or_else(|| ApiError::NotFound("Paciente não encontrado".into()))?;
    let clinic = db::get_clinic(&conn, &patient.clinic_id)?;

    let header = plan_header(clinic.as_ref(), &patient, chrono::Utc::now().date_naive());
    let content = planning.ai_response.as_deref().unwrap_or_default();
    let layout = layout_document(&header, content, &[])?;
    pdf_response(&layout, &export_filename(&patient.name, DocumentKind::Plan))
}

/// `POST /api/exports/markup`
pub async fn markup_pdf(
    ApiJson(request): ApiJson<MarkupExportRequest>,
) -> Result<Response, ApiError> {
    let title = optional(request.title).unwrap_or_else(|| PLAN_TITLE.to_string());
    let layout = layout_markup(&title, &request.markup)?;
    let patient_name = request.patient_name.unwrap_or_default();
    pdf_response(&layout, &export_filename(&patient_name, DocumentKind::Plan))
}
