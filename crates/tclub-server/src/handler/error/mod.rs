//! [`Error`], [`ErrorKind`] and [`Result`].

mod account_error;
mod cache_error;
mod http_error;
mod mongo_error;
mod service_error;

pub use http_error::{Error, ErrorKind, Result};
