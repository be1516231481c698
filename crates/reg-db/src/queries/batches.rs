//! Batch (student cohort) CRUD operations.

use rusqlite::{Connection, OptionalExtension};
use reg_core::{BatchId, Error, Result};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::Batch;
use crate::support::{
    check_date, check_opt_date, check_required, db_err, immediate, now, unique_or_db, ChangeSet,
    SHORT_TEXT,
};

const COLS: &str =
    "id, name, start_date, end_date, level, description, remarks, created_at, modified_at";

#[derive(Debug, Clone, Default)]
pub struct NewBatch {
    pub name: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub level: i64,
    pub description: String,
    pub remarks: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchChanges {
    pub name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<Option<String>>,
    pub level: Option<i64>,
    pub description: Option<String>,
    pub remarks: Option<String>,
}

fn duplicate_name(name: &str) -> String {
    format!("batch '{name}' already exists")
}

pub fn create_batch(conn: &Connection, new: &NewBatch) -> Result<Batch> {
    check_required("name", &new.name, SHORT_TEXT)?;
    check_date("start_date", &new.start_date)?;
    check_opt_date("end_date", new.end_date.as_deref())?;

    let now = now();
    conn.execute(
        "INSERT INTO batches (name, start_date, end_date, level, description, remarks,
                              created_at, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        rusqlite::params![
            new.name,
            new.start_date,
            new.end_date,
            new.level,
            new.description,
            new.remarks,
            now,
        ],
    )
    .map_err(|e| unique_or_db(e, || duplicate_name(&new.name)))?;

    Ok(Batch {
        id: BatchId::from(conn.last_insert_rowid()),
        name: new.name.clone(),
        start_date: new.start_date.clone(),
        end_date: new.end_date.clone(),
        level: new.level,
        description: new.description.clone(),
        remarks: new.remarks.clone(),
        created_at: now.clone(),
        modified_at: now,
    })
}

pub fn get_batch(conn: &Connection, id: BatchId) -> Result<Option<Batch>> {
    let q = format!("SELECT {COLS} FROM batches WHERE id = ?1");
    conn.query_row(&q, [id.get()], Batch::from_row)
        .optional()
        .map_err(db_err)
}

/// List batches, most recent intake first.
pub fn list_batches(conn: &Connection) -> Result<Vec<Batch>> {
    let q = format!("SELECT {COLS} FROM batches ORDER BY start_date DESC, name ASC");
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([], Batch::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

pub fn update_batch(conn: &Connection, id: BatchId, changes: &BatchChanges) -> Result<Batch> {
    if let Some(name) = &changes.name {
        check_required("name", name, SHORT_TEXT)?;
    }
    if let Some(start) = &changes.start_date {
        check_date("start_date", start)?;
    }
    if let Some(end) = &changes.end_date {
        check_opt_date("end_date", end.as_deref())?;
    }

    immediate(conn, |tx| {
        let mut set = ChangeSet::new();
        set.set("name", changes.name.clone());
        set.set("start_date", changes.start_date.clone());
        set.set_nullable("end_date", changes.end_date.clone());
        set.set("level", changes.level);
        set.set("description", changes.description.clone());
        set.set("remarks", changes.remarks.clone());

        let n = set.apply(tx, "batches", "id", id.get()).map_err(|e| {
            unique_or_db(e, || duplicate_name(changes.name.as_deref().unwrap_or("")))
        })?;
        if n == 0 {
            return Err(Error::not_found("batch", id));
        }
        get_batch(tx, id)?.ok_or_else(|| Error::not_found("batch", id))
    })
}

/// Delete a batch. Student profiles and courses keep their rows with the
/// batch reference cleared.
pub fn delete_batch(conn: &Connection, id: BatchId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::Batch, id.get())
}
