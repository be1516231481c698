//! Typed ID wrappers providing compile-time safety for entity identifiers.
//!
//! Each ID type is a newtype over the `i64` surrogate key SQLite assigns,
//! preventing accidental misuse (e.g., passing a `RoleId` where a `UserId`
//! is expected).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generate a newtype ID wrapper over `i64`.
///
/// The macro produces a struct with:
/// - `get()` returning the raw key for SQL parameters
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`, `Serialize`, `Deserialize`
/// - `Display` and `FromStr` delegating to the inner integer
/// - `From<i64>` and `Into<i64>` conversions
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(i64);

            impl $name {
                /// Return the raw integer key.
                #[must_use]
                pub fn get(self) -> i64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = std::num::ParseIntError;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    s.parse::<i64>().map(Self)
                }
            }

            impl From<i64> for $name {
                fn from(raw: i64) -> Self {
                    Self(raw)
                }
            }

            impl From<$name> for i64 {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

typed_id! {
    /// Identifier for a user account.
    UserId,
    /// Identifier for a role.
    RoleId,
    /// Identifier for a user/role assignment row.
    UserRoleId,
    /// Identifier for a user's postal address.
    AddressId,
    /// Identifier for an emergency contact.
    EmergencyContactId,
    /// Identifier for an emergency contact's postal address.
    EmergencyContactAddressId,
    /// Identifier for a student batch (cohort).
    BatchId,
    /// Identifier for a department.
    DepartmentId,
    /// Identifier for a subject.
    SubjectId,
    /// Identifier for a course offering.
    CourseId,
    /// Identifier for an enrollment.
    EnrollmentId,
    /// Identifier for an assessment record.
    AssessmentId,
}
