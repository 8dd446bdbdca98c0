//! Account registration and availability workflow.

mod error;
mod workflow;

pub use error::{AccountError, AccountResult};
pub use workflow::{AccountWorkflow, CreatedAccount, Registration};
