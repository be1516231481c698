//! Course offerings: a subject taught to a batch in one semester of a year.

use rusqlite::{Connection, OptionalExtension};
use reg_core::{BatchId, CourseId, Error, Result, SubjectId, UserId};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::Course;
use crate::support::{db_err, immediate, now, unique_or_db, ChangeSet};

const COLS: &str = "id, subject_id, teacher_id, batch_id, staff_id, description, semester, \
                    year, remarks, created_at, modified_at";

#[derive(Debug, Clone, Default)]
pub struct NewCourse {
    pub subject_id: Option<SubjectId>,
    pub teacher_id: Option<UserId>,
    pub batch_id: Option<BatchId>,
    pub staff_id: Option<UserId>,
    pub description: String,
    pub semester: i64,
    pub year: i64,
    pub remarks: String,
}

#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub subject_id: Option<Option<SubjectId>>,
    pub teacher_id: Option<Option<UserId>>,
    pub batch_id: Option<Option<BatchId>>,
    pub staff_id: Option<Option<UserId>>,
    pub description: Option<String>,
    pub semester: Option<i64>,
    pub year: Option<i64>,
    pub remarks: Option<String>,
}

/// Optional filters for [`list_courses`]; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub subject_id: Option<SubjectId>,
    pub batch_id: Option<BatchId>,
    pub teacher_id: Option<UserId>,
    pub semester: Option<i64>,
    pub year: Option<i64>,
}

const DUPLICATE_OFFERING: &str =
    "a course for this subject, batch, semester and year already exists";

/// Check every reference that is being set points at an existing row.
fn check_references(
    conn: &Connection,
    subject: Option<SubjectId>,
    teacher: Option<UserId>,
    batch: Option<BatchId>,
    staff: Option<UserId>,
) -> Result<()> {
    if let Some(id) = subject {
        integrity::ensure_exists(conn, Entity::Subject, id.get())?;
    }
    if let Some(id) = teacher {
        integrity::ensure_exists(conn, Entity::TeacherProfile, id.get())?;
    }
    if let Some(id) = batch {
        integrity::ensure_exists(conn, Entity::Batch, id.get())?;
    }
    if let Some(id) = staff {
        integrity::ensure_exists(conn, Entity::StaffProfile, id.get())?;
    }
    Ok(())
}

pub fn create_course(conn: &Connection, new: &NewCourse) -> Result<Course> {
    immediate(conn, |tx| {
        check_references(tx, new.subject_id, new.teacher_id, new.batch_id, new.staff_id)?;

        let now = now();
        tx.execute(
            "INSERT INTO courses (subject_id, teacher_id, batch_id, staff_id, description,
                                  semester, year, remarks, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            rusqlite::params![
                new.subject_id.map(|id| id.get()),
                new.teacher_id.map(|id| id.get()),
                new.batch_id.map(|id| id.get()),
                new.staff_id.map(|id| id.get()),
                new.description,
                new.semester,
                new.year,
                new.remarks,
                now,
            ],
        )
        .map_err(|e| unique_or_db(e, || DUPLICATE_OFFERING.to_string()))?;

        Ok(Course {
            id: CourseId::from(tx.last_insert_rowid()),
            subject_id: new.subject_id,
            teacher_id: new.teacher_id,
            batch_id: new.batch_id,
            staff_id: new.staff_id,
            description: new.description.clone(),
            semester: new.semester,
            year: new.year,
            remarks: new.remarks.clone(),
            created_at: now.clone(),
            modified_at: now,
        })
    })
}

pub fn get_course(conn: &Connection, id: CourseId) -> Result<Option<Course>> {
    let q = format!("SELECT {COLS} FROM courses WHERE id = ?1");
    conn.query_row(&q, [id.get()], Course::from_row)
        .optional()
        .map_err(db_err)
}

/// List courses matching `filter`, newest offerings first.
pub fn list_courses(conn: &Connection, filter: &CourseFilter) -> Result<Vec<Course>> {
    let q = format!(
        "SELECT {COLS} FROM courses
         WHERE (?1 IS NULL OR subject_id = ?1)
           AND (?2 IS NULL OR batch_id = ?2)
           AND (?3 IS NULL OR teacher_id = ?3)
           AND (?4 IS NULL OR semester = ?4)
           AND (?5 IS NULL OR year = ?5)
         ORDER BY year DESC, semester DESC, id ASC"
    );
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map(
            rusqlite::params![
                filter.subject_id.map(|id| id.get()),
                filter.batch_id.map(|id| id.get()),
                filter.teacher_id.map(|id| id.get()),
                filter.semester,
                filter.year,
            ],
            Course::from_row,
        )
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

pub fn update_course(conn: &Connection, id: CourseId, changes: &CourseChanges) -> Result<Course> {
    immediate(conn, |tx| {
        integrity::ensure_exists(tx, Entity::Course, id.get())?;
        check_references(
            tx,
            changes.subject_id.flatten(),
            changes.teacher_id.flatten(),
            changes.batch_id.flatten(),
            changes.staff_id.flatten(),
        )?;

        let mut set = ChangeSet::new();
        set.set_nullable("subject_id", changes.subject_id.map(|v| v.map(|id| id.get())));
        set.set_nullable("teacher_id", changes.teacher_id.map(|v| v.map(|id| id.get())));
        set.set_nullable("batch_id", changes.batch_id.map(|v| v.map(|id| id.get())));
        set.set_nullable("staff_id", changes.staff_id.map(|v| v.map(|id| id.get())));
        set.set("description", changes.description.clone());
        set.set("semester", changes.semester);
        set.set("year", changes.year);
        set.set("remarks", changes.remarks.clone());

        let n = set
            .apply(tx, "courses", "id", id.get())
            .map_err(|e| unique_or_db(e, || DUPLICATE_OFFERING.to_string()))?;
        if n == 0 {
            return Err(Error::not_found("course", id));
        }
        get_course(tx, id)?.ok_or_else(|| Error::not_found("course", id))
    })
}

/// Delete a course with its enrollments and their assessments.
pub fn delete_course(conn: &Connection, id: CourseId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::Course, id.get())
}
