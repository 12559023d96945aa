use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{expect_changed, fmt_ts, parse_id, parse_ts};
use crate::db::DatabaseError;
use crate::models::*;

const USER_COLUMNS: &str =
    "id, clinic_id, name, email, password_hash, role_id, active, created_at, updated_at";

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, clinic_id, name, email, password_hash, role_id, active,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            user.id.to_string(),
            user.clinic_id.map(|id| id.to_string()),
            user.name,
            user.email,
            user.password_hash,
            user.role_id.map(|id| id.to_string()),
            user.active as i32,
            fmt_ts(&user.created_at),
            fmt_ts(&user.updated_at),
        ],
    )?;
    Ok(())
}

pub fn update_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET clinic_id = ?2, name = ?3, email = ?4, password_hash = ?5,
         role_id = ?6, active = ?7, updated_at = ?8
         WHERE id = ?1",
        params![
            user.id.to_string(),
            user.clinic_id.map(|id| id.to_string()),
            user.name,
            user.email,
            user.password_hash,
            user.role_id.map(|id| id.to_string()),
            user.active as i32,
            fmt_ts(&user.updated_at),
        ],
    )?;
    expect_changed(changed, "user", &user.id)
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id.to_string()],
        user_from_row,
    )
    .optional()?
    .transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
        params![email],
        user_from_row,
    )
    .optional()?
    .transpose()
}

pub fn list_users(conn: &Connection, clinic_id: Option<&Uuid>) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users
         WHERE (?1 IS NULL OR clinic_id = ?1)
         ORDER BY name COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map(params![clinic_id.map(|id| id.to_string())], user_from_row)?;

    let mut users = Vec::new();
    for row in rows {
        users.push(row??);
    }
    Ok(users)
}

pub fn delete_user(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    let changed = conn.execute("DELETE FROM users WHERE id = ?1", params![id.to_string()])?;
    expect_changed(changed, "user", id)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<Result<User, DatabaseError>> {
    let id: String = row.get(0)?;
    let clinic_id: Option<String> = row.get(1)?;
    let role_id: Option<String> = row.get(5)?;
    let name: String = row.get(2)?;
    let email: String = row.get(3)?;
    let password_hash: String = row.get(4)?;
    let active: i32 = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    let build = || -> Result<User, DatabaseError> {
        Ok(User {
            id: parse_id(&id)?,
            clinic_id: clinic_id.as_deref().map(parse_id).transpose()?,
            name,
            email,
            password_hash,
            role_id: role_id.as_deref().map(parse_id).transpose()?,
            active: active != 0,
            created_at: parse_ts(&created_at),
            updated_at: parse_ts(&updated_at),
        })
    };
    Ok(build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{fixtures, now};
    use crate::db::sqlite::open_memory_database;

    fn user(email: &str, clinic_id: Option<Uuid>) -> User {
        User {
            id: Uuid::new_v4(),
            clinic_id,
            name: "Carla Mendes".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role_id: None,
            active: true,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn duplicate_email_is_unique_violation() {
        let conn = open_memory_database().unwrap();
        insert_user(&conn, &user("carla@clinica.com", None)).unwrap();
        let err = insert_user(&conn, &user("carla@clinica.com", None)).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn users_filtered_by_clinic() {
        let conn = open_memory_database().unwrap();
        let clinic = fixtures::clinic(&conn);
        insert_user(&conn, &user("a@x.com", Some(clinic.id))).unwrap();
        insert_user(&conn, &user("b@x.com", None)).unwrap();

        assert_eq!(list_users(&conn, Some(&clinic.id)).unwrap().len(), 1);
        assert_eq!(list_users(&conn, None).unwrap().len(), 2);
    }

    #[test]
    fn user_found_by_email() {
        let conn = open_memory_database().unwrap();
        let u = user("dr@x.com", None);
        insert_user(&conn, &u).unwrap();
        let found = get_user_by_email(&conn, "dr@x.com").unwrap().unwrap();
        assert_eq!(found.id, u.id);
        assert_eq!(found.password_hash, "hash");
    }
}
