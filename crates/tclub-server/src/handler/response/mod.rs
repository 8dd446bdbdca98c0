//! Response types for HTTP handlers.

mod accounts;
mod errors;

pub use accounts::*;
pub use errors::*;
