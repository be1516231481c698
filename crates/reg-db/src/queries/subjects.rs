//! Subject CRUD operations.

use rusqlite::{Connection, OptionalExtension};
use reg_core::{DepartmentId, Error, Result, SubjectId};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::Subject;
use crate::support::{
    check_required, db_err, immediate, now, unique_or_db, ChangeSet, SHORT_TEXT,
};

const COLS: &str = "id, department_id, name, description, created_at, modified_at";

#[derive(Debug, Clone, Default)]
pub struct NewSubject {
    pub department_id: Option<DepartmentId>,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct SubjectChanges {
    pub department_id: Option<Option<DepartmentId>>,
    pub name: Option<String>,
    pub description: Option<String>,
}

fn duplicate_name(name: &str) -> String {
    format!("subject '{name}' already exists")
}

pub fn create_subject(conn: &Connection, new: &NewSubject) -> Result<Subject> {
    check_required("name", &new.name, SHORT_TEXT)?;

    immediate(conn, |tx| {
        if let Some(dept) = new.department_id {
            integrity::ensure_exists(tx, Entity::Department, dept.get())?;
        }
        let now = now();
        tx.execute(
            "INSERT INTO subjects (department_id, name, description, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![new.department_id.map(|d| d.get()), new.name, new.description, now],
        )
        .map_err(|e| unique_or_db(e, || duplicate_name(&new.name)))?;

        Ok(Subject {
            id: SubjectId::from(tx.last_insert_rowid()),
            department_id: new.department_id,
            name: new.name.clone(),
            description: new.description.clone(),
            created_at: now.clone(),
            modified_at: now,
        })
    })
}

pub fn get_subject(conn: &Connection, id: SubjectId) -> Result<Option<Subject>> {
    let q = format!("SELECT {COLS} FROM subjects WHERE id = ?1");
    conn.query_row(&q, [id.get()], Subject::from_row)
        .optional()
        .map_err(db_err)
}

/// List subjects, optionally only those of one department.
pub fn list_subjects(conn: &Connection, department: Option<DepartmentId>) -> Result<Vec<Subject>> {
    let q = format!(
        "SELECT {COLS} FROM subjects
         WHERE (?1 IS NULL OR department_id = ?1) ORDER BY name ASC"
    );
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([department.map(|d| d.get())], Subject::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

pub fn update_subject(conn: &Connection, id: SubjectId, changes: &SubjectChanges) -> Result<Subject> {
    if let Some(name) = &changes.name {
        check_required("name", name, SHORT_TEXT)?;
    }
    immediate(conn, |tx| {
        integrity::ensure_exists(tx, Entity::Subject, id.get())?;
        if let Some(Some(dept)) = changes.department_id {
            integrity::ensure_exists(tx, Entity::Department, dept.get())?;
        }
        let mut set = ChangeSet::new();
        set.set_nullable("department_id", changes.department_id.map(|d| d.map(|d| d.get())));
        set.set("name", changes.name.clone());
        set.set("description", changes.description.clone());

        let n = set.apply(tx, "subjects", "id", id.get()).map_err(|e| {
            unique_or_db(e, || duplicate_name(changes.name.as_deref().unwrap_or("")))
        })?;
        if n == 0 {
            return Err(Error::not_found("subject", id));
        }
        get_subject(tx, id)?.ok_or_else(|| Error::not_found("subject", id))
    })
}

/// Delete a subject; courses teaching it keep their rows with no subject.
pub fn delete_subject(conn: &Connection, id: SubjectId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::Subject, id.get())
}
