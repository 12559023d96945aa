//! Default access-control catalogue.
//!
//! Upserts the built-in permissions and the administrator role holding all
//! of them. Runs in a single transaction and can be re-run at every start.

use rusqlite::{params, Connection};
use uuid::Uuid;

use super::repository::{fmt_ts, now};
use super::DatabaseError;

pub const ADMIN_ROLE: &str = "Administrador";

/// Built-in permissions: (name, description).
pub const DEFAULT_PERMISSIONS: &[(&str, &str)] = &[
    ("clinicas.configurar", "Editar configurações da clínica"),
    ("usuarios.gerenciar", "Criar, editar e remover usuários"),
    ("funcoes.gerenciar", "Administrar funções e permissões"),
    ("pacientes.visualizar", "Consultar fichas de pacientes"),
    ("pacientes.editar", "Cadastrar e editar pacientes"),
    ("planejamentos.gerar", "Gerar diagnósticos e planos com IA"),
    ("planejamentos.editar", "Editar planos de tratamento"),
    ("contratos.gerar", "Gerar contratos"),
    ("contratos.assinar", "Registrar assinatura de contratos"),
    ("tratamentos.editar", "Atualizar acompanhamento de tratamentos"),
];

/// Summary of a seeding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub permissions: usize,
    pub admin_role_id: Uuid,
}

pub fn seed_defaults(conn: &Connection) -> Result<SeedReport, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let ts = fmt_ts(&now());

    for (name, description) in DEFAULT_PERMISSIONS {
        tx.execute(
            "INSERT INTO permissions (id, name, description, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET description = excluded.description",
            params![Uuid::new_v4().to_string(), name, description, ts],
        )?;
    }

    tx.execute(
        "INSERT INTO roles (id, name, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(name) DO NOTHING",
        params![
            Uuid::new_v4().to_string(),
            ADMIN_ROLE,
            "Acesso total ao sistema",
            ts
        ],
    )?;
    let admin_role_id: String = tx.query_row(
        "SELECT id FROM roles WHERE name = ?1",
        params![ADMIN_ROLE],
        |row| row.get(0),
    )?;

    tx.execute(
        "INSERT OR IGNORE INTO role_permissions (role_id, permission_id)
         SELECT ?1, id FROM permissions",
        params![admin_role_id],
    )?;

    tx.commit()?;

    let admin_role_id = super::repository::parse_id(&admin_role_id)?;
    tracing::info!(
        permissions = DEFAULT_PERMISSIONS.len(),
        %admin_role_id,
        "Access-control defaults seeded"
    );
    Ok(SeedReport {
        permissions: DEFAULT_PERMISSIONS.len(),
        admin_role_id,
    })
}
