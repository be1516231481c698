//! Route handlers for the HTTP API.

pub mod addresses;
pub mod assessments;
pub mod batches;
pub mod courses;
pub mod departments;
pub mod emergency_contacts;
pub mod enrollments;
pub mod health;
pub mod profiles;
pub mod roles;
pub mod subjects;
pub mod users;

use std::str::FromStr;

use serde::Serialize;

/// Parse an integer path segment into a typed ID.
pub(crate) fn parse_id<T: FromStr>(raw: &str, name: &str) -> Result<T, reg_core::Error> {
    raw.parse()
        .map_err(|_| reg_core::Error::Validation(format!("Invalid {name}")))
}

/// Body returned by actions that have no record to show.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
