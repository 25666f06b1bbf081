//! HTTP middleware and extractors.

pub mod auth;
pub mod error_path;
pub mod extract;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAuth};
pub use error_path::error_path_middleware;
pub use extract::{ValidatedJson, ValidatedPath};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
