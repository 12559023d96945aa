use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{expect_changed, fmt_ts, parse_date, parse_id, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, clinic_id, name, birth_date, document_number, guardian_name,
     phone, email, notes, created_at, updated_at";

pub fn insert_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO patients (id, clinic_id, name, birth_date, document_number, guardian_name,
         phone, email, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            patient.id.to_string(),
            patient.clinic_id.to_string(),
            patient.name,
            patient.birth_date.map(|d| d.to_string()),
            patient.document_number,
            patient.guardian_name,
            patient.phone,
            patient.email,
            patient.notes,
            fmt_ts(&patient.created_at),
            fmt_ts(&patient.updated_at),
        ],
    )?;
    Ok(())
}

/// Overwrites every mutable column. The clinic a patient belongs to never changes.
pub fn update_patient(conn: &Connection, patient: &Patient) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET name = ?2, birth_date = ?3, document_number = ?4,
         guardian_name = ?5, phone = ?6, email = ?7, notes = ?8, updated_at = ?9
         WHERE id = ?1",
        params![
            patient.id.to_string(),
            patient.name,
            patient.birth_date.map(|d| d.to_string()),
            patient.document_number,
            patient.guardian_name,
            patient.phone,
            patient.email,
            patient.notes,
            fmt_ts(&patient.updated_at),
        ],
    )?;
    expect_changed(changed, "patient", &patient.id)
}

pub fn get_patient(conn: &Connection, id: &Uuid) -> Result<Option<Patient>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"),
        params![id.to_string()],
        patient_from_row,
    )
    .optional()?
    .transpose()
}

/// Patients of one clinic, or of every clinic when `clinic_id` is `None`.
pub fn list_patients(
    conn: &Connection,
    clinic_id: Option<&Uuid>,
) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients
         WHERE (?1 IS NULL OR clinic_id = ?1)
         ORDER BY name COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map(params![clinic_id.map(|id| id.to_string())], patient_from_row)?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(row??);
    }
    Ok(patients)
}

pub fn delete_patient(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM patients WHERE id = ?1", params![id.to_string()])?;
    expect_changed(changed, "patient", id)
}

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Patient, DatabaseError>> {
    let (id, clinic_id) = match (
        parse_id(&row.get::<_, String>(0)?),
        parse_id(&row.get::<_, String>(1)?),
    ) {
        (Ok(id), Ok(clinic_id)) => (id, clinic_id),
        (Err(e), _) | (_, Err(e)) => return Ok(Err(e)),
    };
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;
    Ok(Ok(Patient {
        id,
        clinic_id,
        name: row.get(2)?,
        birth_date: parse_date(row.get(3)?),
        document_number: row.get(4)?,
        guardian_name: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        notes: row.get(8)?,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;

    #[test]
    fn patient_insert_and_retrieve() {
        let conn = open_memory_database().unwrap();
        let clinic = fixtures::clinic(&conn);
        let patient = fixtures::patient(&conn, clinic.id);

        let stored = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(stored.name, "João da Silva");
        assert_eq!(stored.clinic_id, clinic.id);
        assert_eq!(stored.birth_date, patient.birth_date);
    }

    #[test]
    fn list_filters_by_clinic() {
        let conn = open_memory_database().unwrap();
        let a = fixtures::clinic(&conn);
        let b = fixtures::clinic(&conn);
        fixtures::patient(&conn, a.id);
        fixtures::patient(&conn, a.id);
        fixtures::patient(&conn, b.id);

        assert_eq!(list_patients(&conn, Some(&a.id)).unwrap().len(), 2);
        assert_eq!(list_patients(&conn, Some(&b.id)).unwrap().len(), 1);
        assert_eq!(list_patients(&conn, None).unwrap().len(), 3);
    }

    #[test]
    fn patient_requires_existing_clinic() {
        let conn = open_memory_database().unwrap();
        let mut orphan = {
            let clinic = fixtures::clinic(&conn);
            fixtures::patient(&conn, clinic.id)
        };
        orphan.id = Uuid::new_v4();
        orphan.clinic_id = Uuid::new_v4();
        assert!(insert_patient(&conn, &orphan).is_err());
    }

    #[test]
    fn update_patient_overwrites_fields() {
        let conn = open_memory_database().unwrap();
        let clinic = fixtures::clinic(&conn);
        let mut patient = fixtures::patient(&conn, clinic.id);
        patient.notes = Some("Respirador bucal".into());
        update_patient(&conn, &patient).unwrap();

        let stored = get_patient(&conn, &patient.id).unwrap().unwrap();
        assert_eq!(stored.notes.as_deref(), Some("Respirador bucal"));
    }
}
