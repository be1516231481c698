//! Student, teacher and staff profiles.
//!
//! A profile is keyed by its owning user, so each user has at most one
//! profile of each kind. Teacher and staff profiles share a shape and are
//! handled together through [`ProfileKind`].

use rusqlite::{Connection, OptionalExtension};
use reg_core::{BatchId, Error, Result, UserId};

use crate::integrity::{self, DeleteReport, Entity};
use crate::models::{EmployeeProfile, StudentProfile};
use crate::support::{check_opt_date, db_err, immediate, now, unique_or_db, ChangeSet};

const STUDENT_COLS: &str = "user_id, batch_id, joined_at, created_at, modified_at";
const EMPLOYEE_COLS: &str = "user_id, start_date, remarks, created_at, modified_at";

// ---------------------------------------------------------------------------
// student profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NewStudentProfile {
    pub batch_id: Option<BatchId>,
    pub joined_at: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentProfileChanges {
    pub batch_id: Option<Option<BatchId>>,
    pub joined_at: Option<Option<String>>,
}

pub fn create_student_profile(
    conn: &Connection,
    user_id: UserId,
    new: &NewStudentProfile,
) -> Result<StudentProfile> {
    check_opt_date("joined_at", new.joined_at.as_deref())?;

    immediate(conn, |tx| {
        integrity::ensure_exists(tx, Entity::User, user_id.get())?;
        if let Some(batch) = new.batch_id {
            integrity::ensure_exists(tx, Entity::Batch, batch.get())?;
        }
        let now = now();
        tx.execute(
            "INSERT INTO student_profiles (user_id, batch_id, joined_at, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![user_id.get(), new.batch_id.map(|b| b.get()), new.joined_at, now],
        )
        .map_err(|e| unique_or_db(e, || format!("user {user_id} already has a student profile")))?;

        Ok(StudentProfile {
            user_id,
            batch_id: new.batch_id,
            joined_at: new.joined_at.clone(),
            created_at: now.clone(),
            modified_at: now,
        })
    })
}

pub fn get_student_profile(conn: &Connection, user_id: UserId) -> Result<Option<StudentProfile>> {
    let q = format!("SELECT {STUDENT_COLS} FROM student_profiles WHERE user_id = ?1");
    conn.query_row(&q, [user_id.get()], StudentProfile::from_row)
        .optional()
        .map_err(db_err)
}

/// List student profiles, optionally only those in one batch.
pub fn list_student_profiles(
    conn: &Connection,
    batch: Option<BatchId>,
) -> Result<Vec<StudentProfile>> {
    let q = format!(
        "SELECT {STUDENT_COLS} FROM student_profiles
         WHERE (?1 IS NULL OR batch_id = ?1) ORDER BY user_id ASC"
    );
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([batch.map(|b| b.get())], StudentProfile::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

pub fn update_student_profile(
    conn: &Connection,
    user_id: UserId,
    changes: &StudentProfileChanges,
) -> Result<StudentProfile> {
    if let Some(joined) = &changes.joined_at {
        check_opt_date("joined_at", joined.as_deref())?;
    }
    immediate(conn, |tx| {
        integrity::ensure_exists(tx, Entity::StudentProfile, user_id.get())?;
        if let Some(Some(batch)) = changes.batch_id {
            integrity::ensure_exists(tx, Entity::Batch, batch.get())?;
        }
        let mut set = ChangeSet::new();
        set.set_nullable("batch_id", changes.batch_id.map(|b| b.map(|b| b.get())));
        set.set_nullable("joined_at", changes.joined_at.clone());

        let n = set
            .apply(tx, "student_profiles", "user_id", user_id.get())
            .map_err(db_err)?;
        if n == 0 {
            return Err(Error::not_found("student profile", user_id));
        }
        get_student_profile(tx, user_id)?
            .ok_or_else(|| Error::not_found("student profile", user_id))
    })
}

/// Delete a student profile together with its enrollments and their
/// assessments. The user itself is kept.
pub fn delete_student_profile(conn: &Connection, user_id: UserId) -> Result<DeleteReport> {
    integrity::delete_entity(conn, Entity::StudentProfile, user_id.get())
}

// ---------------------------------------------------------------------------
// teacher and staff profiles
// ---------------------------------------------------------------------------

/// Which employee profile table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Teacher,
    Staff,
}

impl ProfileKind {
    fn entity(self) -> Entity {
        match self {
            ProfileKind::Teacher => Entity::TeacherProfile,
            ProfileKind::Staff => Entity::StaffProfile,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewEmployeeProfile {
    pub start_date: Option<String>,
    pub remarks: String,
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeProfileChanges {
    pub start_date: Option<Option<String>>,
    pub remarks: Option<String>,
}

pub fn create_employee_profile(
    conn: &Connection,
    kind: ProfileKind,
    user_id: UserId,
    new: &NewEmployeeProfile,
) -> Result<EmployeeProfile> {
    check_opt_date("start_date", new.start_date.as_deref())?;
    let entity = kind.entity();

    immediate(conn, |tx| {
        integrity::ensure_exists(tx, Entity::User, user_id.get())?;
        let now = now();
        let sql = format!(
            "INSERT INTO {} (user_id, start_date, remarks, created_at, modified_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            entity.table()
        );
        tx.execute(
            &sql,
            rusqlite::params![user_id.get(), new.start_date, new.remarks, now],
        )
        .map_err(|e| {
            unique_or_db(e, || format!("user {user_id} already has a {}", entity.label()))
        })?;

        Ok(EmployeeProfile {
            user_id,
            start_date: new.start_date.clone(),
            remarks: new.remarks.clone(),
            created_at: now.clone(),
            modified_at: now,
        })
    })
}

pub fn get_employee_profile(
    conn: &Connection,
    kind: ProfileKind,
    user_id: UserId,
) -> Result<Option<EmployeeProfile>> {
    let q = format!(
        "SELECT {EMPLOYEE_COLS} FROM {} WHERE user_id = ?1",
        kind.entity().table()
    );
    conn.query_row(&q, [user_id.get()], EmployeeProfile::from_row)
        .optional()
        .map_err(db_err)
}

pub fn list_employee_profiles(conn: &Connection, kind: ProfileKind) -> Result<Vec<EmployeeProfile>> {
    let q = format!(
        "SELECT {EMPLOYEE_COLS} FROM {} ORDER BY user_id ASC",
        kind.entity().table()
    );
    let mut stmt = conn.prepare(&q).map_err(db_err)?;
    let rows = stmt
        .query_map([], EmployeeProfile::from_row)
        .map_err(db_err)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(db_err)?;
    Ok(rows)
}

pub fn update_employee_profile(
    conn: &Connection,
    kind: ProfileKind,
    user_id: UserId,
    changes: &EmployeeProfileChanges,
) -> Result<EmployeeProfile> {
    if let Some(start) = &changes.start_date {
        check_opt_date("start_date", start.as_deref())?;
    }
    let entity = kind.entity();
    immediate(conn, |tx| {
        let mut set = ChangeSet::new();
        set.set_nullable("start_date", changes.start_date.clone());
        set.set("remarks", changes.remarks.clone());
        let n = set
            .apply(tx, entity.table(), "user_id", user_id.get())
            .map_err(db_err)?;
        if n == 0 {
            return Err(Error::not_found(entity.label(), user_id));
        }
        get_employee_profile(tx, kind, user_id)?
            .ok_or_else(|| Error::not_found(entity.label(), user_id))
    })
}

/// Delete a teacher or staff profile. Courses that referenced it keep their
/// rows with the reference cleared.
pub fn delete_employee_profile(
    conn: &Connection,
    kind: ProfileKind,
    user_id: UserId,
) -> Result<DeleteReport> {
    integrity::delete_entity(conn, kind.entity(), user_id.get())
}

pub fn create_teacher_profile(
    conn: &Connection,
    user_id: UserId,
    new: &NewEmployeeProfile,
) -> Result<EmployeeProfile> {
    create_employee_profile(conn, ProfileKind::Teacher, user_id, new)
}

pub fn get_teacher_profile(conn: &Connection, user_id: UserId) -> Result<Option<EmployeeProfile>> {
    get_employee_profile(conn, ProfileKind::Teacher, user_id)
}

pub fn update_teacher_profile(
    conn: &Connection,
    user_id: UserId,
    changes: &EmployeeProfileChanges,
) -> Result<EmployeeProfile> {
    update_employee_profile(conn, ProfileKind::Teacher, user_id, changes)
}

pub fn delete_teacher_profile(conn: &Connection, user_id: UserId) -> Result<DeleteReport> {
    delete_employee_profile(conn, ProfileKind::Teacher, user_id)
}

pub fn create_staff_profile(
    conn: &Connection,
    user_id: UserId,
    new: &NewEmployeeProfile,
) -> Result<EmployeeProfile> {
    create_employee_profile(conn, ProfileKind::Staff, user_id, new)
}

pub fn get_staff_profile(conn: &Connection, user_id: UserId) -> Result<Option<EmployeeProfile>> {
    get_employee_profile(conn, ProfileKind::Staff, user_id)
}

pub fn update_staff_profile(
    conn: &Connection,
    user_id: UserId,
    changes: &EmployeeProfileChanges,
) -> Result<EmployeeProfile> {
    update_employee_profile(conn, ProfileKind::Staff, user_id, changes)
}

pub fn delete_staff_profile(conn: &Connection, user_id: UserId) -> Result<DeleteReport> {
    delete_employee_profile(conn, ProfileKind::Staff, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::batches::{self, NewBatch};
    use crate::queries::users::{self, NewUser};

    #[test]
    fn student_profile_lifecycle() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("stu")).unwrap();
        let batch = batches::create_batch(
            &conn,
            &NewBatch {
                name: "B1".into(),
                start_date: "2024-09-01".into(),
                ..Default::default()
            },
        )
        .unwrap();

        let new = NewStudentProfile {
            batch_id: Some(batch.id),
            joined_at: Some("2024-09-02".into()),
        };
        let p = create_student_profile(&conn, user.id, &new).unwrap();
        assert_eq!(get_student_profile(&conn, user.id).unwrap().unwrap(), p);
        assert_eq!(list_student_profiles(&conn, Some(batch.id)).unwrap().len(), 1);

        let changes = StudentProfileChanges {
            batch_id: Some(None),
            ..Default::default()
        };
        let updated = update_student_profile(&conn, user.id, &changes).unwrap();
        assert_eq!(updated.batch_id, None);
        assert_eq!(updated.joined_at.as_deref(), Some("2024-09-02"));

        let report = delete_student_profile(&conn, user.id).unwrap();
        assert_eq!(report.deleted("student_profiles"), 1);
        assert!(users::get_user(&conn, user.id).unwrap().is_some());
    }

    #[test]
    fn second_profile_of_same_kind_rejected() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("twice")).unwrap();

        create_student_profile(&conn, user.id, &NewStudentProfile::default()).unwrap();
        let err = create_student_profile(&conn, user.id, &NewStudentProfile::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        create_teacher_profile(&conn, user.id, &NewEmployeeProfile::default()).unwrap();
        let err = create_teacher_profile(&conn, user.id, &NewEmployeeProfile::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        // a staff profile is a different kind
        create_staff_profile(&conn, user.id, &NewEmployeeProfile::default()).unwrap();
    }

    #[test]
    fn missing_user_or_batch() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let err = create_teacher_profile(&conn, UserId::from(8), &NewEmployeeProfile::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "user not found: 8");

        let user = users::create_user(&conn, &NewUser::new("nobatch")).unwrap();
        let new = NewStudentProfile {
            batch_id: Some(BatchId::from(3)),
            joined_at: None,
        };
        let err = create_student_profile(&conn, user.id, &new).unwrap_err();
        assert_eq!(err.to_string(), "batch not found: 3");
    }

    #[test]
    fn employee_profile_update() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let user = users::create_user(&conn, &NewUser::new("emp")).unwrap();
        create_staff_profile(
            &conn,
            user.id,
            &NewEmployeeProfile {
                start_date: Some("2020-01-15".into()),
                remarks: String::new(),
            },
        )
        .unwrap();

        let changes = EmployeeProfileChanges {
            remarks: Some("Registrar office".into()),
            ..Default::default()
        };
        let p = update_staff_profile(&conn, user.id, &changes).unwrap();
        assert_eq!(p.remarks, "Registrar office");
        assert_eq!(p.start_date.as_deref(), Some("2020-01-15"));

        assert!(matches!(
            update_teacher_profile(&conn, user.id, &changes),
            Err(Error::NotFound { .. })
        ));
        assert_eq!(list_employee_profiles(&conn, ProfileKind::Staff).unwrap().len(), 1);
        assert!(get_teacher_profile(&conn, user.id).unwrap().is_none());
        delete_staff_profile(&conn, user.id).unwrap();
        assert!(get_staff_profile(&conn, user.id).unwrap().is_none());
    }
}
