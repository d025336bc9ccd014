//! HTTP middleware and extractors.

pub mod auth;
pub mod request_id;

pub use auth::{AdminAuthRejection, RequireAdmin};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
