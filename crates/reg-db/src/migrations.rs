//! Embedded SQL migrations and runner.
//!
//! Migrations are stored as `&str` constants and executed in order.  A
//! `schema_migrations` table tracks which versions have been applied.
//!
//! Foreign keys carry no `ON DELETE` action: deletes are propagated by
//! [`crate::integrity`], and the store rejects any dependent row it missed.

use rusqlite::Connection;
use reg_core::{Error, Result};

/// V1: identity -- users, their addresses and emergency contacts, roles.
const V1_IDENTITY: &str = r#"
CREATE TABLE users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT UNIQUE NOT NULL,
    first_name    TEXT NOT NULL DEFAULT '',
    last_name     TEXT NOT NULL DEFAULT '',
    email         TEXT NOT NULL DEFAULT '',
    date_of_birth TEXT,
    phone_number  TEXT NOT NULL DEFAULT '',
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT NOT NULL,
    modified_at   TEXT NOT NULL
);

CREATE TABLE user_addresses (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id        INTEGER NOT NULL REFERENCES users(id),
    street_address TEXT NOT NULL,
    woreda         INTEGER NOT NULL,
    sub_city       TEXT NOT NULL,
    city           TEXT NOT NULL,
    country        TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    modified_at    TEXT NOT NULL
);

CREATE TABLE emergency_contacts (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL REFERENCES users(id),
    first_name   TEXT NOT NULL,
    last_name    TEXT NOT NULL,
    relationship TEXT NOT NULL,
    phone_number TEXT UNIQUE NOT NULL,
    email        TEXT,
    created_at   TEXT NOT NULL,
    modified_at  TEXT NOT NULL
);

CREATE TABLE emergency_contact_addresses (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    emergency_contact_id INTEGER NOT NULL REFERENCES emergency_contacts(id),
    street_address       TEXT NOT NULL,
    woreda               INTEGER NOT NULL,
    sub_city             TEXT NOT NULL,
    city                 TEXT NOT NULL,
    country              TEXT NOT NULL,
    created_at           TEXT NOT NULL,
    modified_at          TEXT NOT NULL
);

CREATE TABLE roles (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT UNIQUE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE TABLE user_roles (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id),
    role_id     INTEGER NOT NULL REFERENCES roles(id),
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE UNIQUE INDEX uniq_user_role ON user_roles(user_id, role_id);
CREATE INDEX idx_user_roles_role ON user_roles(role_id);
CREATE INDEX idx_user_addresses_user ON user_addresses(user_id);
CREATE INDEX idx_emergency_contacts_user ON emergency_contacts(user_id);
CREATE INDEX idx_ec_addresses_contact ON emergency_contact_addresses(emergency_contact_id);
"#;

/// V2: academic organisation -- batches, profiles, departments, subjects, courses.
const V2_ACADEMICS: &str = r#"
CREATE TABLE batches (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT UNIQUE NOT NULL,
    start_date  TEXT NOT NULL,
    end_date    TEXT,
    level       INTEGER NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    remarks     TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE TABLE student_profiles (
    user_id     INTEGER PRIMARY KEY REFERENCES users(id),
    batch_id    INTEGER REFERENCES batches(id),
    joined_at   TEXT,
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE TABLE teacher_profiles (
    user_id     INTEGER PRIMARY KEY REFERENCES users(id),
    start_date  TEXT,
    remarks     TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE TABLE staff_profiles (
    user_id     INTEGER PRIMARY KEY REFERENCES users(id),
    start_date  TEXT,
    remarks     TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE TABLE departments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT UNIQUE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE TABLE subjects (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    department_id INTEGER REFERENCES departments(id),
    name          TEXT UNIQUE NOT NULL,
    description   TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL,
    modified_at   TEXT NOT NULL
);

CREATE TABLE courses (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id  INTEGER REFERENCES subjects(id),
    teacher_id  INTEGER REFERENCES teacher_profiles(user_id),
    batch_id    INTEGER REFERENCES batches(id),
    staff_id    INTEGER REFERENCES staff_profiles(user_id),
    description TEXT NOT NULL DEFAULT '',
    semester    INTEGER NOT NULL,
    year        INTEGER NOT NULL,
    remarks     TEXT NOT NULL DEFAULT '',
    created_at  TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

CREATE UNIQUE INDEX uniq_subject_batch_semester_year
    ON courses(subject_id, batch_id, semester, year);
CREATE INDEX idx_student_profiles_batch ON student_profiles(batch_id);
CREATE INDEX idx_subjects_department ON subjects(department_id);
CREATE INDEX idx_courses_teacher ON courses(teacher_id);
CREATE INDEX idx_courses_batch ON courses(batch_id);
CREATE INDEX idx_courses_staff ON courses(staff_id);
"#;

/// V3: enrollment and assessment scoring.
const V3_ENROLLMENT: &str = r#"
CREATE TABLE enrollments (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id      INTEGER NOT NULL REFERENCES student_profiles(user_id),
    course_id       INTEGER NOT NULL REFERENCES courses(id),
    enrollment_date TEXT,
    status          TEXT NOT NULL DEFAULT '',
    grade           TEXT NOT NULL DEFAULT '',
    rank            INTEGER,
    created_at      TEXT NOT NULL,
    modified_at     TEXT NOT NULL
);

CREATE TABLE assessments (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    enrollment_id   INTEGER NOT NULL REFERENCES enrollments(id),
    assessment_type TEXT NOT NULL,
    score           REAL,
    total_score     REAL,
    given_at        TEXT,
    remarks         TEXT NOT NULL DEFAULT '',
    created_at      TEXT NOT NULL,
    modified_at     TEXT NOT NULL
);

CREATE UNIQUE INDEX uniq_student_course ON enrollments(student_id, course_id);
CREATE INDEX idx_enrollments_course ON enrollments(course_id);
CREATE INDEX idx_assessments_enrollment ON assessments(enrollment_id);
"#;

/// Ordered list of (version, sql) pairs.
const MIGRATIONS: &[(i64, &str)] = &[
    (1, V1_IDENTITY),
    (2, V2_ACADEMICS),
    (3, V3_ENROLLMENT),
];

/// Run all pending migrations on `conn`.
///
/// Creates the `schema_migrations` tracking table if it does not exist,
/// then applies each outstanding migration inside a transaction.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(|e| Error::database(format!("Failed to create schema_migrations: {e}")))?;

    for &(version, sql) in MIGRATIONS {
        let already: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM schema_migrations WHERE version = ?1",
                [version],
                |row| row.get(0),
            )
            .map_err(|e| Error::database(e.to_string()))?;

        if already {
            continue;
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| Error::database(e.to_string()))?;

        tx.execute_batch(sql)
            .map_err(|e| Error::database(format!("Migration V{version} failed: {e}")))?;

        tx.execute(
            "INSERT INTO schema_migrations (version) VALUES (?1)",
            [version],
        )
        .map_err(|e| Error::database(e.to_string()))?;

        tx.commit()
            .map_err(|e| Error::database(e.to_string()))?;

        tracing::debug!("Applied migration V{version}");
    }

    Ok(())
}

/// Highest migration version known to this build.
pub fn latest_version() -> i64 {
    MIGRATIONS.last().map(|&(v, _)| v).unwrap_or(0)
}

/// Highest migration version recorded in `conn`, 0 for a fresh database.
pub fn current_version(conn: &Connection) -> Result<i64> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(|e| Error::database(e.to_string()))
}
