//! In-memory implementation of the `AuthService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::db::{Store, User};
use crate::services::auth_service::{AuthError, AuthService, LoginResult};
use crate::services::clock::Clock;
use crate::services::token::TokenIssuer;

pub struct TokenAuthService {
    store: Store,
    tokens: TokenIssuer,
    clock: Arc<dyn Clock>,
}

impl TokenAuthService {
    #[must_use]
    pub fn new(store: Store, tokens: TokenIssuer, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            tokens,
            clock,
        }
    }
}

#[async_trait]
impl AuthService for TokenAuthService {
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        if username.is_empty() || password.is_empty() {
            metrics::counter!("auth_login_attempts_total", "result" => "failure").increment(1);
            return Err(AuthError::InvalidCredentials);
        }

        let Some(user) = self.store.verify_user_password(username, password).await? else {
            metrics::counter!("auth_login_attempts_total", "result" => "failure").increment(1);
            debug!(username, "Login rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let issued = self.tokens.issue(&user, self.clock.now())?;
        metrics::counter!("auth_login_attempts_total", "result" => "success").increment(1);
        info!(user_id = %user.id, "User logged in");

        Ok(LoginResult {
            user,
            access_token: issued.token,
            expires_in_seconds: issued.expires_in_seconds,
        })
    }

    async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;
        let user_id = claims.user_id()?;

        self.store
            .get_user_by_id(user_id)
            .await
            .ok_or(AuthError::UserNotFound)
    }
}
