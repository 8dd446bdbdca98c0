//! Security services: password hashing and token signing.

mod password_hasher;
mod token_service;

pub use password_hasher::{HashError, PasswordHasher};
pub use token_service::{
    TokenClaims, TokenConfig, TokenError, TokenResult, TokenService, generate_token,
    validate_token,
};
