use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{expect_changed, fmt_ts, parse_id, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

/// Insert a role and its permission links in one transaction.
pub fn insert_role(conn: &Connection, role: &Role) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO roles (id, name, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            role.id.to_string(),
            role.name,
            role.description,
            fmt_ts(&role.created_at),
            fmt_ts(&role.updated_at),
        ],
    )?;
    replace_role_permissions(&tx, &role.id, &role.permission_ids)?;
    tx.commit()?;
    Ok(())
}

/// Update a role's name/description and replace its permission set.
pub fn update_role(conn: &Connection, role: &Role) -> Result<(), DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let changed = tx.execute(
        "UPDATE roles SET name = ?2, description = ?3, updated_at = ?4 WHERE id = ?1",
        params![
            role.id.to_string(),
            role.name,
            role.description,
            fmt_ts(&role.updated_at),
        ],
    )?;
    expect_changed(changed, "role", &role.id)?;
    replace_role_permissions(&tx, &role.id, &role.permission_ids)?;
    tx.commit()?;
    Ok(())
}

fn replace_role_permissions(
    conn: &Connection,
    role_id: &Uuid,
    permission_ids: &[Uuid],
) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM role_permissions WHERE role_id = ?1",
        params![role_id.to_string()],
    )?;
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO role_permissions (role_id, permission_id) VALUES (?1, ?2)",
    )?;
    for permission_id in permission_ids {
        stmt.execute(params![role_id.to_string(), permission_id.to_string()])?;
    }
    Ok(())
}

pub fn get_role(conn: &Connection, id: &Uuid) -> Result<Option<Role>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, name, description, created_at, updated_at FROM roles WHERE id = ?1",
            params![id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some(row) => Ok(Some(role_from_parts(conn, row)?)),
        None => Ok(None),
    }
}

pub fn get_role_by_name(conn: &Connection, name: &str) -> Result<Option<Role>, DatabaseError> {
    let id: Option<String> = conn
        .query_row("SELECT id FROM roles WHERE name = ?1", params![name], |row| row.get(0))
        .optional()?;
    match id {
        Some(id) => get_role(conn, &parse_id(&id)?),
        None => Ok(None),
    }
}

pub fn list_roles(conn: &Connection) -> Result<Vec<Role>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, description, created_at, updated_at FROM roles ORDER BY name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut roles = Vec::new();
    for row in rows {
        roles.push(role_from_parts(conn, row?)?);
    }
    Ok(roles)
}

pub fn delete_role(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM roles WHERE id = ?1", params![id.to_string()])?;
    expect_changed(changed, "role", id)
}

fn role_permission_ids(conn: &Connection, role_id: &Uuid) -> Result<Vec<Uuid>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT permission_id FROM role_permissions WHERE role_id = ?1 ORDER BY permission_id",
    )?;
    let rows = stmt.query_map(params![role_id.to_string()], |row| row.get::<_, String>(0))?;

    let mut ids = Vec::new();
    for row in rows {
        ids.push(parse_id(&row?)?);
    }
    Ok(ids)
}

type RoleParts = (String, String, Option<String>, String, String);

fn role_from_parts(conn: &Connection, parts: RoleParts) -> Result<Role, DatabaseError> {
    let (id, name, description, created_at, updated_at) = parts;
    let id = parse_id(&id)?;
    Ok(Role {
        id,
        name,
        description,
        permission_ids: role_permission_ids(conn, &id)?,
        created_at: parse_ts(&created_at),
        updated_at: parse_ts(&updated_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_permission, now};
    use crate::db::sqlite::open_memory_database;

    fn permission(conn: &Connection, name: &str) -> Uuid {
        let p = Permission {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            created_at: now(),
        };
        insert_permission(conn, &p).unwrap();
        p.id
    }

    fn role(name: &str, permission_ids: Vec<Uuid>) -> Role {
        Role {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            permission_ids,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn role_keeps_permission_links() {
        let conn = open_memory_database().unwrap();
        let read = permission(&conn, "patients:read");
        let write = permission(&conn, "patients:write");
        let r = role("Recepção", vec![read, write]);
        insert_role(&conn, &r).unwrap();

        let stored = get_role(&conn, &r.id).unwrap().unwrap();
        assert_eq!(stored.permission_ids.len(), 2);
        assert!(stored.permission_ids.contains(&read));
    }

    #[test]
    fn update_replaces_permission_set() {
        let conn = open_memory_database().unwrap();
        let read = permission(&conn, "patients:read");
        let write = permission(&conn, "patients:write");
        let mut r = role("Recepção", vec![read, write]);
        insert_role(&conn, &r).unwrap();

        r.permission_ids = vec![read];
        update_role(&conn, &r).unwrap();
        let stored = get_role(&conn, &r.id).unwrap().unwrap();
        assert_eq!(stored.permission_ids, vec![read]);
    }

    #[test]
    fn duplicate_role_name_rolls_back() {
        let conn = open_memory_database().unwrap();
        insert_role(&conn, &role("Dentista", vec![])).unwrap();
        let err = insert_role(&conn, &role("Dentista", vec![])).unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(list_roles(&conn).unwrap().len(), 1);
    }

    #[test]
    fn unknown_permission_id_is_rejected() {
        let conn = open_memory_database().unwrap();
        let err = insert_role(&conn, &role("Auditor", vec![Uuid::new_v4()])).unwrap_err();
        assert!(err.is_foreign_key_violation());
        assert!(!err.is_unique_violation());
        assert!(get_role_by_name(&conn, "Auditor").unwrap().is_none());
    }
}
