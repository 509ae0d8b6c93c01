//! Bearer access tokens.
//!
//! Tokens are HS256-signed JWTs whose `sub` claim is the user id. They are
//! self-contained: nothing is stored server side, so a token stays valid until
//! it expires or the signing secret changes.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::config::SecurityConfig;
use crate::db::User;
use crate::domain::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Could not validate credentials")]
    Invalid,

    #[error("Invalid token format")]
    BadSubject,

    #[error("Failed to generate token: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// # Errors
    ///
    /// Returns [`TokenError::BadSubject`] if `sub` is not a UUID.
    pub fn user_id(&self) -> Result<UserId, TokenError> {
        self.sub.parse().map_err(|_| TokenError::BadSubject)
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in_seconds: i64,
}

#[derive(Clone)]
pub struct TokenIssuer {
    secret: String,
    expiry_seconds: i64,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: String, expiry_minutes: u64) -> Self {
        let expiry_seconds = i64::try_from(expiry_minutes.saturating_mul(60)).unwrap_or(i64::MAX);
        Self {
            secret,
            expiry_seconds,
        }
    }

    /// Uses the configured secret, or a random one when none is set.
    #[must_use]
    pub fn from_config(config: &SecurityConfig) -> Self {
        let secret = if config.jwt_secret.is_empty() {
            warn!("No JWT secret configured; generated a random one. Tokens will not survive a restart");
            generate_secret()
        } else {
            config.jwt_secret.clone()
        };
        Self::new(secret, config.token_expiry_minutes)
    }

    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if signing fails.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat,
            exp: iat.saturating_add(self.expiry_seconds),
        };

        Ok(IssuedToken {
            token: self.encode_claims(&claims)?,
            expires_in_seconds: self.expiry_seconds,
        })
    }

    /// # Errors
    ///
    /// Returns [`TokenError::Encoding`] if signing fails.
    pub fn encode_claims(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    /// Checks the signature and expiry and returns the claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] or [`TokenError::Invalid`].
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|err| match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
    }
}

/// Generate a random secret (64 character hex string)
#[must_use]
pub fn generate_secret() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn extract_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User {
            id: UserId::new(),
            username: "testuser".to_string(),
            created_at: Utc::now(),
        }
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(generate_secret(), 30)
    }

    #[test]
    fn test_issue_and_verify() {
        let issuer = issuer();
        let user = user();
        let issued = issuer.issue(&user, Utc::now()).unwrap();
        assert_eq!(issued.expires_in_seconds, 30 * 60);

        let claims = issuer.verify(&issued.token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let issued = issuer().issue(&user(), Utc::now()).unwrap();
        assert_eq!(issuer().verify(&issued.token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_tampered_and_garbage_tokens() {
        let issuer = issuer();
        let issued = issuer.issue(&user(), Utc::now()).unwrap();
        let mut tampered = issued.token.clone();
        tampered.push('x');

        assert_eq!(issuer.verify(&tampered), Err(TokenError::Invalid));
        assert_eq!(issuer.verify(""), Err(TokenError::Invalid));
        assert_eq!(issuer.verify("invalid_token"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer();
        let issued = issuer
            .issue(&user(), Utc::now() - Duration::hours(2))
            .unwrap();
        assert_eq!(issuer.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_bad_subject() {
        let issuer = issuer();
        let now = Utc::now().timestamp();
        let token = issuer
            .encode_claims(&Claims {
                sub: "not-a-uuid".to_string(),
                username: "x".to_string(),
                iat: now,
                exp: now + 600,
            })
            .unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.user_id(), Err(TokenError::BadSubject));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("bearer  abc "), Some("abc"));
        assert_eq!(extract_bearer("Basic abc"), None);
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("abc"), None);
    }

    #[test]
    fn test_generate_secret() {
        let a = generate_secret();
        assert_eq!(a.len(), 64);
        assert_ne!(a, generate_secret());
    }
}
