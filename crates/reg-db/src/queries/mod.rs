//! Query modules, one per entity group.
//!
//! Every module follows the same shape: `create_*`, `get_*` returning
//! `Option`, `list_*`, `update_*` taking a partial changes struct, and
//! `delete_*` delegating to [`crate::integrity`].

pub mod addresses;
pub mod assessments;
pub mod batches;
pub mod courses;
pub mod departments;
pub mod emergency_contacts;
pub mod enrollments;
pub mod profiles;
pub mod roles;
pub mod subjects;
pub mod users;
