//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table group. Every write is a single statement except
//! where noted (role permission sets). Callers own the connection.

mod clinic;
mod contract;
mod patient;
mod permission;
mod planning;
mod role;
mod treatment;
mod user;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::DatabaseError;

pub use clinic::*;
pub use contract::*;
pub use patient::*;
pub use permission::*;
pub use planning::*;
pub use role::*;
pub use treatment::*;
pub use user::*;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time truncated to whole seconds, as stored.
pub fn now() -> NaiveDateTime {
    let now = chrono::Utc::now().naive_utc();
    NaiveDateTime::parse_from_str(&now.format(TIMESTAMP_FORMAT).to_string(), TIMESTAMP_FORMAT)
        .unwrap_or(now)
}

pub(crate) fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap_or_default()
}

pub(crate) fn parse_date(raw: Option<String>) -> Option<NaiveDate> {
    raw.and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok())
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))
}

/// Fail with `NotFound` when a write touched no row.
pub(crate) fn expect_changed(
    changed: usize,
    entity_type: &str,
    id: &Uuid,
) -> Result<(), DatabaseError> {
    if changed == 0 {
        return Err(DatabaseError::not_found(entity_type, id));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rusqlite::Connection;
    use uuid::Uuid;

    use super::*;
    use crate::models::*;

    pub fn clinic(conn: &Connection) -> Clinic {
        let clinic = Clinic {
            id: Uuid::new_v4(),
            name: "Clínica Sorriso".into(),
            legal_name: Some("Sorriso Odontologia LTDA".into()),
            document_number: Some("12.345.678/0001-90".into()),
            address: Some("Rua das Flores, 100".into()),
            phone: None,
            email: None,
            responsible_professional: Some("Dra. Ana Lima".into()),
            professional_registration: Some("CRO-SP 12345".into()),
            contract_template: None,
            created_at: now(),
            updated_at: now(),
        };
        insert_clinic(conn, &clinic).unwrap();
        clinic
    }

    pub fn patient(conn: &Connection, clinic_id: Uuid) -> Patient {
        let patient = Patient {
            id: Uuid::new_v4(),
            clinic_id,
            name: "João da Silva".into(),
            birth_date: NaiveDate::from_ymd_opt(2012, 5, 3),
            document_number: None,
            guardian_name: Some("Maria da Silva".into()),
            phone: None,
            email: None,
            notes: None,
            created_at: now(),
            updated_at: now(),
        };
        insert_patient(conn, &patient).unwrap();
        patient
    }

    pub fn planning(conn: &Connection, patient_id: Uuid) -> PatientPlanning {
        let planning = PatientPlanning {
            id: Uuid::new_v4(),
            patient_id,
            status: PlanningStatus::Draft,
            intake: None,
            diagnosis: None,
            selected_option: None,
            ai_response: None,
            created_at: now(),
            updated_at: now(),
        };
        insert_planning(conn, &planning).unwrap();
        planning
    }
}
