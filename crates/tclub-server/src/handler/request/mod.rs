//! Request types for HTTP handlers.

mod accounts;
mod paths;

pub use accounts::*;
pub use paths::*;
