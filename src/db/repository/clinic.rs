use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{expect_changed, fmt_ts, parse_id, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const CLINIC_COLUMNS: &str = "id, name, legal_name, document_number, address, phone, email,
     responsible_professional, professional_registration, contract_template,
     created_at, updated_at";

pub fn insert_clinic(conn: &Connection, clinic: &Clinic) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO clinics (id, name, legal_name, document_number, address, phone, email,
         responsible_professional, professional_registration, contract_template,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            clinic.id.to_string(),
            clinic.name,
            clinic.legal_name,
            clinic.document_number,
            clinic.address,
            clinic.phone,
            clinic.email,
            clinic.responsible_professional,
            clinic.professional_registration,
            clinic.contract_template,
            fmt_ts(&clinic.created_at),
            fmt_ts(&clinic.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_clinic(conn: &Connection, clinic: &Clinic) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE clinics SET name = ?2, legal_name = ?3, document_number = ?4, address = ?5,
         phone = ?6, email = ?7, responsible_professional = ?8, professional_registration = ?9,
         contract_template = ?10, updated_at = ?11
         WHERE id = ?1",
        params![
            clinic.id.to_string(),
            clinic.name,
            clinic.legal_name,
            clinic.document_number,
            clinic.address,
            clinic.phone,
            clinic.email,
            clinic.responsible_professional,
            clinic.professional_registration,
            clinic.contract_template,
            fmt_ts(&clinic.updated_at),
        ],
    )?;
    expect_changed(changed, "clinic", &clinic.id)
}

pub fn get_clinic(conn: &Connection, id: &Uuid) -> Result<Option<Clinic>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {CLINIC_COLUMNS} FROM clinics WHERE id = ?1"),
        params![id.to_string()],
        clinic_from_row,
    )
    .optional()?
    .transpose()
}

pub fn list_clinics(conn: &Connection) -> Result<Vec<Clinic>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CLINIC_COLUMNS} FROM clinics ORDER BY name COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map([], clinic_from_row)?;

    let mut clinics = Vec::new();
    for row in rows {
        clinics.push(row??);
    }
    Ok(clinics)
}

pub fn delete_clinic(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM clinics WHERE id = ?1", params![id.to_string()])?;
    expect_changed(changed, "clinic", id)
}

fn clinic_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Clinic, DatabaseError>> {
    let id = match parse_id(&row.get::<_, String>(0)?) {
        Ok(id) => id,
        Err(e) => return Ok(Err(e)),
    };
    let created_at: String = row.get(10)?;
    let updated_at: String = row.get(11)?;
    Ok(Ok(Clinic {
        id,
        name: row.get(1)?,
        legal_name: row.get(2)?,
        document_number: row.get(3)?,
        address: row.get(4)?,
        phone: row.get(5)?,
        email: row.get(6)?,
        responsible_professional: row.get(7)?,
        professional_registration: row.get(8)?,
        contract_template: row.get(9)?,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    }))
}
