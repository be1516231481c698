use rusqlite::{Connection, OptionalExtension};
use reg_core::{DepartmentId, Error, Result};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::Department;
use crate::support::{
    check_required, db_err, immediate, now, unique_or_db, ChangeSet, SHORT_TEXT,
};

const COLS: &str = "id, name, description, created_at, modified_at";

#[derive(Debug, Clone, Default)]
pub struct DepartmentChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn duplicate_name(name: &str) -> String {
    format!("department '{name}' already exists")
}

pub fn create_department(conn: &Connection, name: &str, description: &str) -> Result<Department> {
    check_required("name", name, SHORT_TEXT)?;
    let now = now();
    conn.execute(
        "INSERT INTO departments (name, description, created_at, modified_at)
         VALUES (?1, ?2, ?3, ?3)",
        rusqlite::params![name, description, now],
    )
    .map_err(|e| unique_or_db(e, || duplicate_name(name)))?;

    Ok(Department {
        id: DepartmentId::from(conn.last_insert_rowid()),
        name: name.to_string(),
        description: description.to_string(),
        created_at: now.clone(),
        modified_at: now,
    })
}

pub fn get_department(conn: &Connection, id: DepartmentId) -> Result<Option<Department>> {
    let q = format!("SELECT {COLS} FROM departments WHERE id = ?1");
    conn.query_row(&q, [id.get()], Department::from_row)
        .optional()
        .map_err(db_err)
}

pub fn list_departments(conn: &Connection) -> Result<Vec<Department>> {
    let q = format!("SELECT {COLS} FROM departments ORDER BY name ASC");
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([], Department::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

pub fn update_department(
    conn: &Connection,
    id: DepartmentId,
    changes: &DepartmentChanges,
) -> Result<Department> {
    if let Some(name) = &changes.name {
        check_required("name", name, SHORT_TEXT)?;
    }
    immediate(conn, |tx| {
        let mut set = ChangeSet::new();
        set.set("name", changes.name.clone());
        set.set("description", changes.description.clone());
        let n = set.apply(tx, "departments", "id", id.get()).map_err(|e| {
            unique_or_db(e, || duplicate_name(changes.name.as_deref().unwrap_or("")))
        })?;
        if n == 0 {
            return Err(Error::not_found("department", id));
        }
        get_department(tx, id)?.ok_or_else(|| Error::not_found("department", id))
    })
}

/// Delete a department; its subjects survive without one.
pub fn delete_department(conn: &Connection, id: DepartmentId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::Department, id.get())
}
