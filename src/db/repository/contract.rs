use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{expect_changed, fmt_ts, now, parse_id, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const CONTRACT_COLUMNS: &str =
    "id, planning_id, content, is_signed, signed_at, created_at, updated_at";

pub fn insert_contract(conn: &Connection, contract: &Contract) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO contracts (id, planning_id, content, is_signed, signed_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            contract.id.to_string(),
            contract.planning_id.to_string(),
            contract.content,
            contract.is_signed as i32,
            contract.signed_at.as_ref().map(fmt_ts),
            fmt_ts(&contract.created_at),
            fmt_ts(&contract.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_contract(conn: &Connection, id: &Uuid) -> Result<Option<Contract>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {CONTRACT_COLUMNS} FROM contracts WHERE id = ?1"),
        params![id.to_string()],
        contract_from_row,
    )
    .optional()?
    .transpose()
}

/// Contracts of one planning, oldest first.
pub fn list_contracts_for_planning(
    conn: &Connection,
    planning_id: &Uuid,
) -> Result<Vec<Contract>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE planning_id = ?1
         ORDER BY created_at ASC"
    ))?;
    let rows = stmt.query_map(params![planning_id.to_string()], contract_from_row)?;

    let mut contracts = Vec::new();
    for row in rows {
        contracts.push(row??);
    }
    Ok(contracts)
}

/// Flag a contract as signed. Signing twice keeps the first signature time.
pub fn mark_contract_signed(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let ts = fmt_ts(&now());
    let changed = conn.execute(
        "UPDATE contracts SET is_signed = 1, signed_at = COALESCE(signed_at, ?2), updated_at = ?2
         WHERE id = ?1",
        params![id.to_string(), ts],
    )?;
    expect_changed(changed, "contract", id)
}

pub fn update_contract_content(
    conn: &Connection,
    id: &Uuid,
    content: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE contracts SET content = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), content, fmt_ts(&now())],
    )?;
    expect_changed(changed, "contract", id)
}

pub fn delete_contract(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM contracts WHERE id = ?1", params![id.to_string()])?;
    expect_changed(changed, "contract", id)
}

fn contract_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Contract, DatabaseError>> {
    let id: String = row.get(0)?;
    let planning_id: String = row.get(1)?;
    let signed_at: Option<String> = row.get(4)?;
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    let content: String = row.get(2)?;
    let is_signed: i32 = row.get(3)?;

    Ok(parse_id(&id).and_then(|id| {
        Ok(Contract {
            id,
            planning_id: parse_id(&planning_id)?,
            content,
            is_signed: is_signed != 0,
            signed_at: signed_at.as_deref().map(parse_ts),
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures;
    use crate::db::sqlite::open_memory_database;

    fn contract_for(planning_id: Uuid) -> Contract {
        Contract {
            id: Uuid::new_v4(),
            planning_id,
            content: "CONTRATO DE PRESTAÇÃO DE SERVIÇOS".into(),
            is_signed: false,
            signed_at: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn seeded_planning(conn: &Connection) -> Uuid {
        let clinic = fixtures::clinic(conn);
        let patient = fixtures::patient(conn, clinic.id);
        fixtures::planning(conn, patient.id).id
    }

    #[test]
    fn contract_starts_unsigned_and_can_be_signed() {
        let conn = open_memory_database().unwrap();
        let planning_id = seeded_planning(&conn);
        let contract = contract_for(planning_id);
        insert_contract(&conn, &contract).unwrap();

        mark_contract_signed(&conn, &contract.id).unwrap();
        let stored = get_contract(&conn, &contract.id).unwrap().unwrap();
        assert!(stored.is_signed);
        assert!(stored.signed_at.is_some());
    }

    #[test]
    fn planning_may_hold_several_contracts() {
        let conn = open_memory_database().unwrap();
        let planning_id = seeded_planning(&conn);
        insert_contract(&conn, &contract_for(planning_id)).unwrap();
        insert_contract(&conn, &contract_for(planning_id)).unwrap();

        let contracts = list_contracts_for_planning(&conn, &planning_id).unwrap();
        assert_eq!(contracts.len(), 2);
        assert!(contracts.iter().all(|c| !c.is_signed));
    }

    #[test]
    fn signing_unknown_contract_is_not_found() {
        let conn = open_memory_database().unwrap();
        let err = mark_contract_signed(&conn, &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn contract_content_can_be_edited() {
        let conn = open_memory_database().unwrap();
        let planning_id = seeded_planning(&conn);
        let contract = contract_for(planning_id);
        insert_contract(&conn, &contract).unwrap();

        update_contract_content(&conn, &contract.id, "Cláusula revisada").unwrap();
        let stored = get_contract(&conn, &contract.id).unwrap().unwrap();
        assert_eq!(stored.content, "Cláusula revisada");
    }
}
