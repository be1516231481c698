//! Enrollment of students into courses.

use rusqlite::{Connection, OptionalExtension};
use reg_core::{CourseId, EnrollmentId, Error, Result, UserId};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::Enrollment;
use crate::support::{check_opt_timestamp, db_err, immediate, now, unique_or_db, ChangeSet};

const COLS: &str = "id, student_id, course_id, enrollment_date, status, grade, rank, \
                    created_at, modified_at";

const MAX_GRADE_LEN: usize = 2;
const MAX_STATUS_LEN: usize = 100;

#[derive(Debug, Clone)]
pub struct NewEnrollment {
    pub student_id: UserId,
    pub course_id: CourseId,
    pub enrollment_date: Option<String>,
    pub status: String,
    pub grade: String,
    pub rank: Option<i64>,
}

impl NewEnrollment {
    pub fn new(student_id: UserId, course_id: CourseId) -> Self {
        Self {
            student_id,
            course_id,
            enrollment_date: None,
            status: String::new(),
            grade: String::new(),
            rank: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentChanges {
    pub student_id: Option<UserId>,
    pub course_id: Option<CourseId>,
    pub enrollment_date: Option<Option<String>>,
    pub status: Option<String>,
    pub grade: Option<String>,
    pub rank: Option<Option<i64>>,
}

/// Filters for [`list_enrollments`]; unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentFilter {
    pub student_id: Option<UserId>,
    pub course_id: Option<CourseId>,
}

fn check_grade(grade: &str) -> Result<()> {
    if grade.chars().count() > MAX_GRADE_LEN {
        return Err(Error::Validation(format!(
            "grade must be at most {MAX_GRADE_LEN} characters, got '{grade}'"
        )));
    }
    Ok(())
}

fn check_status(status: &str) -> Result<()> {
    if status.chars().count() > MAX_STATUS_LEN {
        return Err(Error::Validation(format!(
            "status must be at most {MAX_STATUS_LEN} characters"
        )));
    }
    Ok(())
}

fn duplicate_pair(student: impl std::fmt::Display, course: impl std::fmt::Display) -> String {
    format!("student {student} is already enrolled in course {course}")
}

pub fn create_enrollment(conn: &Connection, new: &NewEnrollment) -> Result<Enrollment> {
    check_grade(&new.grade)?;
    check_status(&new.status)?;
    check_opt_timestamp("enrollment_date", new.enrollment_date.as_deref())?;

    immediate(conn, |tx| {
        integrity::ensure_exists(tx, Entity::StudentProfile, new.student_id.get())?;
        integrity::ensure_exists(tx, Entity::Course, new.course_id.get())?;

        let now = now();
        tx.execute(
            "INSERT INTO enrollments (student_id, course_id, enrollment_date, status, grade,
                                      rank, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            rusqlite::params![
                new.student_id.get(),
                new.course_id.get(),
                new.enrollment_date,
                new.status,
                new.grade,
                new.rank,
                now,
            ],
        )
        .map_err(|e| unique_or_db(e, || duplicate_pair(new.student_id, new.course_id)))?;

        Ok(Enrollment {
            id: EnrollmentId::from(tx.last_insert_rowid()),
            student_id: new.student_id,
            course_id: new.course_id,
            enrollment_date: new.enrollment_date.clone(),
            status: new.status.clone(),
            grade: new.grade.clone(),
            rank: new.rank,
            created_at: now.clone(),
            modified_at: now,
        })
    })
}

pub fn get_enrollment(conn: &Connection, id: EnrollmentId) -> Result<Option<Enrollment>> {
    let q = format!("SELECT {COLS} FROM enrollments WHERE id = ?1");
    conn.query_row(&q, [id.get()], Enrollment::from_row)
        .optional()
        .map_err(db_err)
}

pub fn list_enrollments(conn: &Connection, filter: &EnrollmentFilter) -> Result<Vec<Enrollment>> {
    let q = format!(
        "SELECT {COLS} FROM enrollments
         WHERE (?1 IS NULL OR student_id = ?1)
           AND (?2 IS NULL OR course_id = ?2)
         ORDER BY id ASC"
    );
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map(
            [
                filter.student_id.map(|id| id.get()),
                filter.course_id.map(|id| id.get()),
            ],
            Enrollment::from_row,
        )
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

pub fn update_enrollment(
    conn: &Connection,
    id: EnrollmentId,
    changes: &EnrollmentChanges,
) -> Result<Enrollment> {
    if let Some(grade) = &changes.grade {
        check_grade(grade)?;
    }
    if let Some(status) = &changes.status {
        check_status(status)?;
    }
    if let Some(date) = &changes.enrollment_date {
        check_opt_timestamp("enrollment_date", date.as_deref())?;
    }

    immediate(conn, |tx| {
        integrity::ensure_exists(tx, Entity::Enrollment, id.get())?;
        if let Some(student) = changes.student_id {
            integrity::ensure_exists(tx, Entity::StudentProfile, student.get())?;
        }
        if let Some(course) = changes.course_id {
            integrity::ensure_exists(tx, Entity::Course, course.get())?;
        }

        let mut set = ChangeSet::new();
        set.set("student_id", changes.student_id.map(|id| id.get()));
        set.set("course_id", changes.course_id.map(|id| id.get()));
        set.set_nullable("enrollment_date", changes.enrollment_date.clone());
        set.set("status", changes.status.clone());
        set.set("grade", changes.grade.clone());
        set.set_nullable("rank", changes.rank);

        let n = set.apply(tx, "enrollments", "id", id.get()).map_err(|e| {
            unique_or_db(e, || {
                let student = changes.student_id.map_or("?".to_string(), |s| s.to_string());
                let course = changes.course_id.map_or("?".to_string(), |c| c.to_string());
                duplicate_pair(student, course)
            })
        })?;
        if n == 0 {
            return Err(Error::not_found("enrollment", id));
        }
        get_enrollment(tx, id)?.ok_or_else(|| Error::not_found("enrollment", id))
    })
}

/// Delete an enrollment and its assessments.
pub fn delete_enrollment(conn: &Connection, id: EnrollmentId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::Enrollment, id.get())
}
