//! Bearer token authentication.
//!
//! - [`AuthHeader`] reads and verifies the `Authorization` header
//! - [`AuthState`] exposes the verified claims to handlers

mod auth_header;
mod auth_state;

pub use self::auth_header::AuthHeader;
pub use self::auth_state::AuthState;
