// Authentication exports
pub mod extractor;
pub mod jwt;
pub mod password;

use thiserror::Error;

pub use extractor::AuthUser;
pub use jwt::{Claims, JwtManager};
pub use password::{hash_password, verify_password};

/// Errors from token handling and password hashing
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Hashing task failed: {0}")]
    Task(String),
}
