use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::{info, warn};
use wellness_core::model::{User, UserId};

use storage::repository::{NewUserRecord, StorageError, UserRepository};

use crate::Clock;
use crate::error::AuthError;
use crate::tokens::TokenIssuer;

/// A user plus a freshly issued bearer token.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub token: String,
}

/// Registration, login and bearer-token checks.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    tokens: TokenIssuer,
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

fn password_matches(password: &str, stored: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored).map_err(|e| AuthError::Hash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl AuthService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>, tokens: TokenIssuer) -> Self {
        Self {
            clock,
            users,
            tokens,
        }
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if any field is blank,
    /// `AuthError::InvalidUser` for a malformed email, `AuthError::UserExists`
    /// if the email is taken.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, AuthError> {
        if blank(email) || password.is_empty() || blank(name) {
            return Err(AuthError::MissingFields);
        }
        let now = self.clock.now();
        let draft = User::new(UserId::new(0), email, name, now)?;

        let record = NewUserRecord {
            email: draft.email().to_owned(),
            name: draft.name().to_owned(),
            password_hash: hash_password(password)?,
            created_at: now,
        };
        let id = match self.users.insert_user(record).await {
            Ok(id) => id,
            Err(StorageError::Conflict) => return Err(AuthError::UserExists),
            Err(err) => return Err(err.into()),
        };

        let user = draft.with_id(id);
        info!(user = %id, "registered user");
        let token = self.tokens.issue(id, now)?;
        Ok(Session { user, token })
    }

    /// Check credentials and issue a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if either field is blank and
    /// `AuthError::InvalidCredentials` for an unknown email or wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        if blank(email) || password.is_empty() {
            return Err(AuthError::MissingFields);
        }

        let Some(credentials) = self.users.find_credentials(email).await? else {
            warn!("login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };
        if !password_matches(password, &credentials.password_hash)? {
            warn!(user = %credentials.user.id(), "login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(credentials.user.id(), self.clock.now())?;
        Ok(Session {
            user: credentials.user,
            token,
        })
    }

    /// Resolve a bearer token to its user id without touching storage.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is bad or expired.
    pub fn authenticate(&self, token: &str) -> Result<UserId, AuthError> {
        self.tokens.verify(token, self.clock.now())
    }

    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn current_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;
    use wellness_core::time::fixed_clock;

    fn service() -> AuthService {
        AuthService::new(
            fixed_clock(),
            Arc::new(InMemoryRepository::new()),
            TokenIssuer::new(b"secret"),
        )
    }

    #[tokio::test]
    async fn register_then_login_round_trip() {
        let auth = service();
        let registered = auth
            .register(" ana@example.com ", "hunter22", "Ana")
            .await
            .unwrap();
        assert_eq!(registered.user.email(), "ana@example.com");
        assert_eq!(
            auth.authenticate(&registered.token).unwrap(),
            registered.user.id()
        );

        let session = auth.login("ana@example.com", "hunter22").await.unwrap();
        assert_eq!(session.user.id(), registered.user.id());
        let me = auth.current_user(session.user.id()).await.unwrap();
        assert_eq!(me.name(), "Ana");
    }

    #[tokio::test]
    async fn register_rejects_missing_and_duplicate() {
        let auth = service();
        assert!(matches!(
            auth.register("ana@example.com", "", "Ana").await,
            Err(AuthError::MissingFields)
        ));
        assert!(matches!(
            auth.register("not-an-email", "pw", "Ana").await,
            Err(AuthError::InvalidUser(_))
        ));
        auth.register("ana@example.com", "pw", "Ana").await.unwrap();
        assert!(matches!(
            auth.register("ana@example.com", "pw2", "Other").await,
            Err(AuthError::UserExists)
        ));
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let auth = service();
        auth.register("ana@example.com", "right", "Ana").await.unwrap();

        assert!(matches!(
            auth.login("ana@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("bo@example.com", "right").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("", "right").await,
            Err(AuthError::MissingFields)
        ));
    }

    #[tokio::test]
    async fn unknown_user_is_reported() {
        let auth = service();
        assert!(matches!(
            auth.current_user(UserId::new(42)).await,
            Err(AuthError::UserNotFound)
        ));
        assert!(matches!(
            auth.authenticate("garbage"),
            Err(AuthError::InvalidToken)
        ));
    }
}
