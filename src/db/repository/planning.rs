use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{expect_changed, fmt_ts, now, parse_id, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const PLANNING_COLUMNS: &str = "id, patient_id, status, intake, diagnosis, selected_option,
     ai_response, created_at, updated_at";

pub fn insert_planning(conn: &Connection, planning: &PatientPlanning) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO plannings (id, patient_id, status, intake, diagnosis, selected_option,
         ai_response, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            planning.id.to_string(),
            planning.patient_id.to_string(),
            planning.status.as_str(),
            planning.intake.as_ref().map(|v| v.to_string()),
            planning.diagnosis,
            planning.selected_option,
            planning.ai_response,
            fmt_ts(&planning.created_at),
            fmt_ts(&planning.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_planning(conn: &Connection, id: &Uuid) -> Result<Option<PatientPlanning>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PLANNING_COLUMNS} FROM plannings WHERE id = ?1"),
        params![id.to_string()],
        planning_from_row,
    )
    .optional()?
    .transpose()
}

pub fn list_plannings_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<PatientPlanning>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PLANNING_COLUMNS} FROM plannings WHERE patient_id = ?1
         ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], planning_from_row)?;

    let mut plannings = Vec::new();
    for row in rows {
        plannings.push(row??);
    }
    Ok(plannings)
}

pub fn update_planning_status(
    conn: &Connection,
    id: &Uuid,
    status: PlanningStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE plannings SET status = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), status.as_str(), fmt_ts(&now())],
    )?;
    expect_changed(changed, "planning", id)
}

/// Store the intake form and the diagnosis drafted from it.
/// A new diagnosis invalidates any previously selected option.
pub fn save_diagnosis(
    conn: &Connection,
    id: &Uuid,
    intake: &serde_json::Value,
    diagnosis: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE plannings SET intake = ?2, diagnosis = ?3, selected_option = NULL, updated_at = ?4
         WHERE id = ?1",
        params![id.to_string(), intake.to_string(), diagnosis, fmt_ts(&now())],
    )?;
    expect_changed(changed, "planning", id)
}

/// Store a generated phased plan together with the option it was drafted for.
pub fn save_generated_plan(
    conn: &Connection,
    id: &Uuid,
    selected_option: &str,
    plan: &str,
    status: PlanningStatus,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE plannings SET selected_option = ?2, ai_response = ?3, status = ?4, updated_at = ?5
         WHERE id = ?1",
        params![id.to_string(), selected_option, plan, status.as_str(), fmt_ts(&now())],
    )?;
    expect_changed(changed, "planning", id)
}

/// Plan edit/save round trip. `None` clears the stored plan.
pub fn update_plan_content(
    conn: &Connection,
    id: &Uuid,
    content: Option<&str>,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE plannings SET ai_response = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), content, fmt_ts(&now())],
    )?;
    expect_changed(changed, "planning", id)
}

pub fn delete_planning(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM plannings WHERE id = ?1", params![id.to_string()])?;
    expect_changed(changed, "planning", id)
}

fn planning_from_row(row: &Row<'_>) -> rusqlite::Result<Result<PatientPlanning, DatabaseError>> {
    let status: String = row.get(2)?;
    let intake: Option<String> = row.get(3)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    let parsed = (|| -> Result<PatientPlanning, DatabaseError> {
        Ok(PatientPlanning {
            id: parse_id(&row.get::<_, String>(0)?)?,
            patient_id: parse_id(&row.get::<_, String>(1)?)?,
            status: PlanningStatus::from_str(&status)?,
            intake: intake.and_then(|raw| serde_json::from_str(&raw).ok()),
            diagnosis: row.get(4)?,
            selected_option: row.get(5)?,
            ai_response: row.get(6)?,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    })();
    Ok(parsed)
}
