//! Request middleware

pub mod auth;

pub use auth::{auth_middleware, AuthUser, CurrentUser, Role, READ_ROLES, WRITE_ROLES};
