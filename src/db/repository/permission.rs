use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{expect_changed, fmt_ts, parse_id, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_permission(conn: &Connection, permission: &Permission) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO permissions (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            permission.id.to_string(),
            permission.name,
            permission.description,
            fmt_ts(&permission.created_at),
        ],
    )?;
    Ok(())
}

pub fn update_permission(conn: &Connection, permission: &Permission) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE permissions SET name = ?2, description = ?3 WHERE id = ?1",
        params![permission.id.to_string(), permission.name, permission.description],
    )?;
    expect_changed(changed, "permission", &permission.id)
}

pub fn get_permission(conn: &Connection, id: &Uuid) -> Result<Option<Permission>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, description, created_at FROM permissions WHERE id = ?1",
        params![id.to_string()],
        permission_from_row,
    )
    .optional()?
    .transpose()
}

pub fn get_permission_by_name(
    conn: &Connection,
    name: &str,
) -> Result<Option<Permission>, DatabaseError> {
    conn.query_row(
        "SELECT id, name, description, created_at FROM permissions WHERE name = ?1",
        params![name],
        permission_from_row,
    )
    .optional()?
    .transpose()
}

pub fn list_permissions(conn: &Connection) -> Result<Vec<Permission>, DatabaseError> {
    let mut stmt =
        conn.prepare("SELECT id, name, description, created_at FROM permissions ORDER BY name")?;
    let rows = stmt.query_map([], permission_from_row)?;

    let mut permissions = Vec::new();
    for row in rows {
        permissions.push(row??);
    }
    Ok(permissions)
}

pub fn delete_permission(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM permissions WHERE id = ?1", params![id.to_string()])?;
    expect_changed(changed, "permission", id)
}

fn permission_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Permission, DatabaseError>> {
    let id: String = row.get(0)?;
    let created_at: String = row.get(3)?;
    let name = row.get(1)?;
    let description = row.get(2)?;
    Ok(parse_id(&id).map(|id| Permission {
        id,
        name,
        description,
        created_at: parse_ts(&created_at),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::now;
    use crate::db::sqlite::open_memory_database;

    fn permission(name: &str) -> Permission {
        Permission {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            created_at: now(),
        }
    }

    #[test]
    fn duplicate_name_is_unique_violation() {
        let conn = open_memory_database().unwrap();
        insert_permission(&conn, &permission("patients:read")).unwrap();
        let err = insert_permission(&conn, &permission("patients:read")).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn other_errors_are_not_unique_violations() {
        let err = DatabaseError::not_found("permission", Uuid::new_v4());
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn lookup_by_name() {
        let conn = open_memory_database().unwrap();
        let p = permission("contracts:sign");
        insert_permission(&conn, &p).unwrap();
        let found = get_permission_by_name(&conn, "contracts:sign").unwrap().unwrap();
        assert_eq!(found.id, p.id);
        assert!(get_permission_by_name(&conn, "nope").unwrap().is_none());
    }
}
