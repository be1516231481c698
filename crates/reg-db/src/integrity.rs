//! Delete propagation.
//!
//! Every entity declares the rows that reference it and what happens to them
//! when it is deleted: [`OnDelete::Cascade`] removes the dependent row (after
//! applying *its* rules), [`OnDelete::SetNull`] clears the foreign key and
//! keeps the row. [`delete_entity`] applies the whole tree in one IMMEDIATE
//! transaction and deletes the target row last.
//!
//! The schema declares its foreign keys without `ON DELETE` actions, so a
//! dependent missing from this table makes the final `DELETE` fail instead of
//! leaving dangling references.

use std::collections::BTreeMap;

use rusqlite::{Connection, OptionalExtension};
use reg_core::{Error, Result};

use crate::support::{db_err, immediate, now};

/// Every table the propagation rules know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    User,
    Address,
    EmergencyContact,
    EmergencyContactAddress,
    Role,
    UserRole,
    Batch,
    StudentProfile,
    TeacherProfile,
    StaffProfile,
    Department,
    Subject,
    Course,
    Enrollment,
    Assessment,
}

/// What happens to a dependent row when the row it references is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    Cascade,
    SetNull,
}

/// A foreign key pointing at an entity, and the rule applied to it.
#[derive(Debug, Clone, Copy)]
pub struct Dependent {
    pub entity: Entity,
    pub column: &'static str,
    pub action: OnDelete,
}

impl Dependent {
    const fn cascade(entity: Entity, column: &'static str) -> Self {
        Self {
            entity,
            column,
            action: OnDelete::Cascade,
        }
    }

    const fn set_null(entity: Entity, column: &'static str) -> Self {
        Self {
            entity,
            column,
            action: OnDelete::SetNull,
        }
    }
}

const USER_DEPENDENTS: &[Dependent] = &[
    Dependent::cascade(Entity::Address, "user_id"),
    Dependent::cascade(Entity::EmergencyContact, "user_id"),
    Dependent::cascade(Entity::UserRole, "user_id"),
    Dependent::cascade(Entity::StudentProfile, "user_id"),
    Dependent::cascade(Entity::TeacherProfile, "user_id"),
    Dependent::cascade(Entity::StaffProfile, "user_id"),
];

const EMERGENCY_CONTACT_DEPENDENTS: &[Dependent] = &[Dependent::cascade(
    Entity::EmergencyContactAddress,
    "emergency_contact_id",
)];

const ROLE_DEPENDENTS: &[Dependent] = &[Dependent::cascade(Entity::UserRole, "role_id")];

const BATCH_DEPENDENTS: &[Dependent] = &[
    Dependent::set_null(Entity::StudentProfile, "batch_id"),
    Dependent::set_null(Entity::Course, "batch_id"),
];

const STUDENT_DEPENDENTS: &[Dependent] = &[Dependent::cascade(Entity::Enrollment, "student_id")];

const TEACHER_DEPENDENTS: &[Dependent] = &[Dependent::set_null(Entity::Course, "teacher_id")];

const STAFF_DEPENDENTS: &[Dependent] = &[Dependent::set_null(Entity::Course, "staff_id")];

const DEPARTMENT_DEPENDENTS: &[Dependent] =
    &[Dependent::set_null(Entity::Subject, "department_id")];

const SUBJECT_DEPENDENTS: &[Dependent] = &[Dependent::set_null(Entity::Course, "subject_id")];

const COURSE_DEPENDENTS: &[Dependent] = &[Dependent::cascade(Entity::Enrollment, "course_id")];

const ENROLLMENT_DEPENDENTS: &[Dependent] =
    &[Dependent::cascade(Entity::Assessment, "enrollment_id")];

impl Entity {
    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Entity::User => "users",
            Entity::Address => "user_addresses",
            Entity::EmergencyContact => "emergency_contacts",
            Entity::EmergencyContactAddress => "emergency_contact_addresses",
            Entity::Role => "roles",
            Entity::UserRole => "user_roles",
            Entity::Batch => "batches",
            Entity::StudentProfile => "student_profiles",
            Entity::TeacherProfile => "teacher_profiles",
            Entity::StaffProfile => "staff_profiles",
            Entity::Department => "departments",
            Entity::Subject => "subjects",
            Entity::Course => "courses",
            Entity::Enrollment => "enrollments",
            Entity::Assessment => "assessments",
        }
    }

    /// Primary key column. Profiles are keyed by their owning user.
    pub fn key_column(self) -> &'static str {
        match self {
            Entity::StudentProfile | Entity::TeacherProfile | Entity::StaffProfile => "user_id",
            _ => "id",
        }
    }

    /// Human-readable name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Entity::User => "user",
            Entity::Address => "address",
            Entity::EmergencyContact => "emergency contact",
            Entity::EmergencyContactAddress => "emergency contact address",
            Entity::Role => "role",
            Entity::UserRole => "user role",
            Entity::Batch => "batch",
            Entity::StudentProfile => "student profile",
            Entity::TeacherProfile => "teacher profile",
            Entity::StaffProfile => "staff profile",
            Entity::Department => "department",
            Entity::Subject => "subject",
            Entity::Course => "course",
            Entity::Enrollment => "enrollment",
            Entity::Assessment => "assessment",
        }
    }

    /// Rows referencing this entity and the rule applied to each.
    pub fn dependents(self) -> &'static [Dependent] {
        match self {
            Entity::User => USER_DEPENDENTS,
            Entity::EmergencyContact => EMERGENCY_CONTACT_DEPENDENTS,
            Entity::Role => ROLE_DEPENDENTS,
            Entity::Batch => BATCH_DEPENDENTS,
            Entity::StudentProfile => STUDENT_DEPENDENTS,
            Entity::TeacherProfile => TEACHER_DEPENDENTS,
            Entity::StaffProfile => STAFF_DEPENDENTS,
            Entity::Department => DEPARTMENT_DEPENDENTS,
            Entity::Subject => SUBJECT_DEPENDENTS,
            Entity::Course => COURSE_DEPENDENTS,
            Entity::Enrollment => ENROLLMENT_DEPENDENTS,
            Entity::Address
            | Entity::EmergencyContactAddress
            | Entity::UserRole
            | Entity::Assessment => &[],
        }
    }
}

/// Rows touched by a single [`delete_entity`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    deleted: BTreeMap<&'static str, usize>,
    nullified: BTreeMap<(&'static str, &'static str), usize>,
}

impl DeleteReport {
    /// Rows removed from `table`, including the target row itself.
    pub fn deleted(&self, table: &str) -> usize {
        self.deleted.get(table).copied().unwrap_or(0)
    }

    /// Rows of `table` whose `column` was set to NULL.
    pub fn nullified(&self, table: &str, column: &str) -> usize {
        self.nullified
            .iter()
            .find(|((t, c), _)| *t == table && *c == column)
            .map_or(0, |(_, n)| *n)
    }

    pub fn total_deleted(&self) -> usize {
        self.deleted.values().sum()
    }

    pub fn total_nullified(&self) -> usize {
        self.nullified.values().sum()
    }

    fn record_deleted(&mut self, table: &'static str, n: usize) {
        if n > 0 {
            *self.deleted.entry(table).or_default() += n;
        }
    }

    fn record_nullified(&mut self, table: &'static str, column: &'static str, n: usize) {
        if n > 0 {
            *self.nullified.entry((table, column)).or_default() += n;
        }
    }
}

/// Whether a row with key `id` exists for `entity`.
pub fn exists(conn: &Connection, entity: Entity, id: i64) -> Result<bool> {
    let sql = format!(
        "SELECT 1 FROM {} WHERE {} = ?1",
        entity.table(),
        entity.key_column()
    );
    conn.query_row(&sql, [id], |_| Ok(()))
        .optional()
        .map(|found| found.is_some())
        .map_err(db_err)
}

/// Fail with [`Error::NotFound`] unless the referenced row exists.
pub fn ensure_exists(conn: &Connection, entity: Entity, id: i64) -> Result<()> {
    if exists(conn, entity, id)? {
        Ok(())
    } else {
        Err(Error::not_found(entity.label(), id))
    }
}

/// Delete one row and apply the propagation rules of everything below it.
///
/// Returns [`Error::NotFound`] when the row does not exist. Dependents never
/// block the delete.
pub fn delete_entity(conn: &Connection, entity: Entity, id: i64) -> Result<DeleteReport> {
    let report = immediate(conn, |tx| {
        ensure_exists(tx, entity, id)?;
        let mut report = DeleteReport::default();
        delete_tree(tx, entity, id, &mut report)?;
        Ok(report)
    })?;

    tracing::info!(
        entity = entity.label(),
        id,
        deleted = report.total_deleted(),
        nullified = report.total_nullified(),
        "Deleted {} {id}",
        entity.label()
    );
    Ok(report)
}

fn delete_tree(conn: &Connection, entity: Entity, id: i64, report: &mut DeleteReport) -> Result<()> {
    for dep in entity.dependents() {
        let child = dep.entity;
        match dep.action {
            OnDelete::Cascade if child.dependents().is_empty() => {
                let sql = format!("DELETE FROM {} WHERE {} = ?1", child.table(), dep.column);
                let n = conn.execute(&sql, [id]).map_err(db_err)?;
                report.record_deleted(child.table(), n);
            }
            OnDelete::Cascade => {
                let sql = format!(
                    "SELECT {} FROM {} WHERE {} = ?1",
                    child.key_column(),
                    child.table(),
                    dep.column
                );
                let mut stmt = conn.prepare(&sql).map_err(db_err)?;
                let child_ids = stmt
                    .query_map([id], |row| row.get::<_, i64>(0))
                    .map_err(db_err)?
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(db_err)?;
                for child_id in child_ids {
                    delete_tree(conn, child, child_id, report)?;
                }
            }
            OnDelete::SetNull => {
                let sql = format!(
                    "UPDATE {} SET {col} = NULL, modified_at = ?2 WHERE {col} = ?1",
                    child.table(),
                    col = dep.column
                );
                let n = conn
                    .execute(&sql, rusqlite::params![id, now()])
                    .map_err(db_err)?;
                report.record_nullified(child.table(), dep.column, n);
            }
        }
    }

    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1",
        entity.table(),
        entity.key_column()
    );
    let n = conn.execute(&sql, [id]).map_err(db_err)?;
    report.record_deleted(entity.table(), n);
    tracing::debug!(table = entity.table(), id, "Removed row");
    Ok(())
}
