//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`. Column order matches the `COLS` constant of the query
//! module that owns the table.

use reg_core::{
    AddressId, AssessmentId, BatchId, CourseId, DepartmentId, EmergencyContactAddressId,
    EmergencyContactId, EnrollmentId, RoleId, SubjectId, UserId, UserRoleId,
};

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

/// Read an integer key column into a typed ID.
fn parse_id<T: From<i64>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    row.get::<_, i64>(idx).map(T::from)
}

fn parse_opt_id<T: From<i64>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Option<T>> {
    Ok(row.get::<_, Option<i64>>(idx)?.map(T::from))
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: Option<String>,
    pub phone_number: String,
    pub is_active: bool,
    pub created_at: String,
    pub modified_at: String,
}

impl User {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            username: row.get(1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            email: row.get(4)?,
            date_of_birth: row.get(5)?,
            phone_number: row.get(6)?,
            is_active: row.get(7)?,
            created_at: row.get(8)?,
            modified_at: row.get(9)?,
        })
    }
}

/// A postal address owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street_address: String,
    pub woreda: i64,
    pub sub_city: String,
    pub city: String,
    pub country: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Address {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            user_id: parse_id(row, 1)?,
            street_address: row.get(2)?,
            woreda: row.get(3)?,
            sub_city: row.get(4)?,
            city: row.get(5)?,
            country: row.get(6)?,
            created_at: row.get(7)?,
            modified_at: row.get(8)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyContact {
    pub id: EmergencyContactId,
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub relationship: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub created_at: String,
    pub modified_at: String,
}

impl EmergencyContact {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            user_id: parse_id(row, 1)?,
            first_name: row.get(2)?,
            last_name: row.get(3)?,
            relationship: row.get(4)?,
            phone_number: row.get(5)?,
            email: row.get(6)?,
            created_at: row.get(7)?,
            modified_at: row.get(8)?,
        })
    }
}

/// A postal address owned by an emergency contact.
#[derive(Debug, Clone, PartialEq)]
pub struct EmergencyContactAddress {
    pub id: EmergencyContactAddressId,
    pub emergency_contact_id: EmergencyContactId,
    pub street_address: String,
    pub woreda: i64,
    pub sub_city: String,
    pub city: String,
    pub country: String,
    pub created_at: String,
    pub modified_at: String,
}

impl EmergencyContactAddress {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            emergency_contact_id: parse_id(row, 1)?,
            street_address: row.get(2)?,
            woreda: row.get(3)?,
            sub_city: row.get(4)?,
            city: row.get(5)?,
            country: row.get(6)?,
            created_at: row.get(7)?,
            modified_at: row.get(8)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Role {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            modified_at: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRole {
    pub id: UserRoleId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub created_at: String,
    pub modified_at: String,
}

impl UserRole {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            user_id: parse_id(row, 1)?,
            role_id: parse_id(row, 2)?,
            created_at: row.get(3)?,
            modified_at: row.get(4)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Academic organisation
// ---------------------------------------------------------------------------

/// A cohort of students sharing an intake.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub id: BatchId,
    pub name: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub level: i64,
    pub description: String,
    pub remarks: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Batch {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            name: row.get(1)?,
            start_date: row.get(2)?,
            end_date: row.get(3)?,
            level: row.get(4)?,
            description: row.get(5)?,
            remarks: row.get(6)?,
            created_at: row.get(7)?,
            modified_at: row.get(8)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub user_id: UserId,
    pub batch_id: Option<BatchId>,
    pub joined_at: Option<String>,
    pub created_at: String,
    pub modified_at: String,
}

impl StudentProfile {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: parse_id(row, 0)?,
            batch_id: parse_opt_id(row, 1)?,
            joined_at: row.get(2)?,
            created_at: row.get(3)?,
            modified_at: row.get(4)?,
        })
    }
}

/// Teacher and staff profiles share one shape; the table tells them apart.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeProfile {
    pub user_id: UserId,
    pub start_date: Option<String>,
    pub remarks: String,
    pub created_at: String,
    pub modified_at: String,
}

impl EmployeeProfile {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: parse_id(row, 0)?,
            start_date: row.get(1)?,
            remarks: row.get(2)?,
            created_at: row.get(3)?,
            modified_at: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Department {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            modified_at: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subject {
    pub id: SubjectId,
    pub department_id: Option<DepartmentId>,
    pub name: String,
    pub description: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Subject {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            department_id: parse_opt_id(row, 1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            created_at: row.get(4)?,
            modified_at: row.get(5)?,
        })
    }
}

/// A subject offered to a batch in a given semester and year.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub subject_id: Option<SubjectId>,
    pub teacher_id: Option<UserId>,
    pub batch_id: Option<BatchId>,
    pub staff_id: Option<UserId>,
    pub description: String,
    pub semester: i64,
    pub year: i64,
    pub remarks: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Course {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            subject_id: parse_opt_id(row, 1)?,
            teacher_id: parse_opt_id(row, 2)?,
            batch_id: parse_opt_id(row, 3)?,
            staff_id: parse_opt_id(row, 4)?,
            description: row.get(5)?,
            semester: row.get(6)?,
            year: row.get(7)?,
            remarks: row.get(8)?,
            created_at: row.get(9)?,
            modified_at: row.get(10)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Enrollment and scoring
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_id: UserId,
    pub course_id: CourseId,
    pub enrollment_date: Option<String>,
    pub status: String,
    pub grade: String,
    pub rank: Option<i64>,
    pub created_at: String,
    pub modified_at: String,
}

impl Enrollment {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            student_id: parse_id(row, 1)?,
            course_id: parse_id(row, 2)?,
            enrollment_date: row.get(3)?,
            status: row.get(4)?,
            grade: row.get(5)?,
            rank: row.get(6)?,
            created_at: row.get(7)?,
            modified_at: row.get(8)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub id: AssessmentId,
    pub enrollment_id: EnrollmentId,
    pub assessment_type: String,
    pub score: Option<f64>,
    pub total_score: Option<f64>,
    pub given_at: Option<String>,
    pub remarks: String,
    pub created_at: String,
    pub modified_at: String,
}

impl Assessment {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            enrollment_id: parse_id(row, 1)?,
            assessment_type: row.get(2)?,
            score: row.get(3)?,
            total_score: row.get(4)?,
            given_at: row.get(5)?,
            remarks: row.get(6)?,
            created_at: row.get(7)?,
            modified_at: row.get(8)?,
        })
    }
}
