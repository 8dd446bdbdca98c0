//! Request extractors with JSON error responses.
//!
//! - [`AuthHeader`] and [`AuthState`] authenticate bearer tokens
//! - [`Json`], [`ValidateJson`] and [`Path`] replace their axum counterparts
//!   so every rejection is rendered as the crate's JSON error body

pub mod auth;
pub mod reject;

pub use crate::extract::auth::{AuthHeader, AuthState};
pub use crate::extract::reject::{Json, Path, ValidateJson};
