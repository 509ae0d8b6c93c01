//! Domain service for authentication.
//!
//! Handles login (credential check plus token issuance) and turning an inbound
//! bearer token back into a verified user.

use thiserror::Error;

use crate::db::User;
use crate::services::token::TokenError;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("{0}")]
    Token(#[from] TokenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Login result containing the bearer token.
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user: User,
    pub access_token: String,
    pub expires_in_seconds: i64,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials and issues an access token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if the username is unknown or
    /// the password does not match. The two cases are not distinguished.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Verifies a bearer token and returns the user it was issued to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Token`] for bad or expired tokens and
    /// [`AuthError::UserNotFound`] if the subject no longer exists.
    async fn authenticate(&self, token: &str) -> Result<User, AuthError>;
}
