//! HTTP middleware: request ID and the admin gate for writes.

pub mod admin;
pub mod request_id;
