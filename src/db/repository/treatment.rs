use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{fmt_ts, now, parse_date, parse_id, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const TREATMENT_COLUMNS: &str = "id, planning_id, start_date, deadline, end_date,
     last_appointment, status, notes, created_at, updated_at";

/// Editable treatment fields, as submitted by the treatment form.
#[derive(Debug, Clone)]
pub struct TreatmentFields {
    pub start_date: NaiveDate,
    pub deadline: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub last_appointment: Option<NaiveDate>,
    pub status: TreatmentStatus,
    pub notes: Option<String>,
}

pub fn get_treatment_for_planning(
    conn: &Connection,
    planning_id: &Uuid,
) -> Result<Option<Treatment>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {TREATMENT_COLUMNS} FROM treatments WHERE planning_id = ?1"),
        params![planning_id.to_string()],
        treatment_from_row,
    )
    .optional()?
    .transpose()
}

/// Create the planning's treatment on first save, update it afterwards.
/// Returns the stored row and whether this call created it.
pub fn save_treatment(
    conn: &Connection,
    planning_id: &Uuid,
    fields: &TreatmentFields,
) -> Result<(Treatment, bool), DatabaseError> {
    let ts = fmt_ts(&now());
    let candidate_id = Uuid::new_v4();

    // RETURNING yields the row as stored, even when another save created it.
    let stored = conn
        .query_row(
            &format!(
                "INSERT INTO treatments (id, planning_id, start_date, deadline, end_date,
                 last_appointment, status, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
                 ON CONFLICT(planning_id) DO UPDATE SET
                    start_date = excluded.start_date,
                    deadline = excluded.deadline,
                    end_date = excluded.end_date,
                    last_appointment = excluded.last_appointment,
                    status = excluded.status,
                    notes = excluded.notes,
                    updated_at = excluded.updated_at
                 RETURNING {TREATMENT_COLUMNS}"
            ),
            params![
                candidate_id.to_string(),
                planning_id.to_string(),
                fields.start_date.to_string(),
                fields.deadline.map(|d| d.to_string()),
                fields.end_date.map(|d| d.to_string()),
                fields.last_appointment.map(|d| d.to_string()),
                fields.status.as_str(),
                fields.notes,
                ts,
            ],
            treatment_from_row,
        )??;

    let created = stored.id == candidate_id;
    Ok((stored, created))
}

fn treatment_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Treatment, DatabaseError>> {
    let id: String = row.get(0)?;
    let planning_id: String = row.get(1)?;
    let start_date: String = row.get(2)?;
    let deadline: Option<String> = row.get(3)?;
    let end_date: Option<String> = row.get(4)?;
    let last_appointment: Option<String> = row.get(5)?;
    let status: String = row.get(6)?;
    let notes: Option<String> = row.get(7)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;

    let build = || -> Result<Treatment, DatabaseError> {
        Ok(Treatment {
            id: parse_id(&id)?,
            planning_id: parse_id(&planning_id)?,
            start_date: parse_date(Some(start_date.clone())).ok_or_else(|| {
                DatabaseError::ConstraintViolation(format!("invalid start_date: {start_date}"))
            })?,
            deadline: parse_date(deadline),
            end_date: parse_date(end_date),
            last_appointment: parse_date(last_appointment),
            status: TreatmentStatus::from_str(&status)?,
            notes,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    };
    Ok(build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;

    fn fields(status: TreatmentStatus) -> TreatmentFields {
        TreatmentFields {
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            deadline: NaiveDate::from_ymd_opt(2026, 9, 1),
            end_date: None,
            last_appointment: None,
            status,
            notes: None,
        }
    }

    #[test]
    fn first_save_creates_then_updates() {
        let conn = open_memory_database().unwrap();
        let clinic = fixtures::clinic(&conn);
        let patient = fixtures::patient(&conn, clinic.id);
        let planning = fixtures::planning(&conn, patient.id);

        let (first, created) =
            save_treatment(&conn, &planning.id, &fields(TreatmentStatus::EmAndamento)).unwrap();
        assert!(created);

        let mut done = fields(TreatmentStatus::Concluido);
        done.end_date = NaiveDate::from_ymd_opt(2026, 8, 15);
        let (second, created) = save_treatment(&conn, &planning.id, &done).unwrap();
        assert!(!created);
        assert_eq!(second.id, first.id);

        let stored = get_treatment_for_planning(&conn, &planning.id).unwrap().unwrap();
        assert_eq!(stored.status, TreatmentStatus::Concluido);
        assert_eq!(stored.end_date, NaiveDate::from_ymd_opt(2026, 8, 15));
        assert_eq!(stored.id, first.id);
    }

    #[test]
    fn concurrent_first_saves_agree_on_the_stored_row() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("ortoplan.db");
        let conn = crate::db::sqlite::open_database(&path).unwrap();
        let clinic = fixtures::clinic(&conn);
        let patient = fixtures::patient(&conn, clinic.id);
        let planning_id = fixtures::planning(&conn, patient.id).id;

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let conn = crate::db::sqlite::open_database(&path).unwrap();
                    save_treatment(&conn, &planning_id, &fields(TreatmentStatus::EmAndamento))
                        .unwrap()
                })
            })
            .collect();
        let results: Vec<(Treatment, bool)> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let stored = get_treatment_for_planning(&conn, &planning_id).unwrap().unwrap();
        assert_eq!(results.iter().filter(|(_, created)| *created).count(), 1);
        for (treatment, _) in &results {
            assert_eq!(treatment.id, stored.id);
            assert_eq!(treatment.created_at, stored.created_at);
        }
    }

    #[test]
    fn update_keeps_creation_time() {
        let conn = open_memory_database().unwrap();
        let clinic = fixtures::clinic(&conn);
        let patient = fixtures::patient(&conn, clinic.id);
        let planning = fixtures::planning(&conn, patient.id);

        let (first, _) =
            save_treatment(&conn, &planning.id, &fields(TreatmentStatus::EmAndamento)).unwrap();
        let (second, _) =
            save_treatment(&conn, &planning.id, &fields(TreatmentStatus::Cancelado)).unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.status, TreatmentStatus::Cancelado);
    }

    #[test]
    fn no_treatment_before_first_save() {
        let conn = open_memory_database().unwrap();
        let clinic = fixtures::clinic(&conn);
        let patient = fixtures::patient(&conn, clinic.id);
        let planning = fixtures::planning(&conn, patient.id);
        assert!(get_treatment_for_planning(&conn, &planning.id).unwrap().is_none());
    }
}
