use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::auth_service::AuthService;
use crate::error::AppServicesError;
use crate::practice_service::PracticeService;
use crate::timeline_service::TimelineService;
use crate::tokens::TokenIssuer;

/// Assembles the services the HTTP layer and the seeder share.
#[derive(Clone)]
pub struct AppServices {
    practice: Arc<PracticeService>,
    auth: Arc<AuthService>,
    timeline: Arc<TimelineService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::MissingSecret` for an empty secret and
    /// `AppServicesError::Sqlite` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        jwt_secret: &str,
    ) -> Result<Self, AppServicesError> {
        let tokens = token_issuer(jwt_secret)?;
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::assemble(&storage, clock, tokens))
    }

    /// Build services over fresh in-memory storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::MissingSecret` for an empty secret.
    pub fn in_memory(clock: Clock, jwt_secret: &str) -> Result<Self, AppServicesError> {
        let tokens = token_issuer(jwt_secret)?;
        Ok(Self::assemble(&Storage::in_memory(), clock, tokens))
    }

    fn assemble(storage: &Storage, clock: Clock, tokens: TokenIssuer) -> Self {
        let practice = Arc::new(PracticeService::new(clock, Arc::clone(&storage.practices)));
        let auth = Arc::new(AuthService::new(clock, Arc::clone(&storage.users), tokens));
        let timeline = Arc::new(TimelineService::new(clock, Arc::clone(&storage.timeline)));

        Self {
            practice,
            auth,
            timeline,
        }
    }

    #[must_use]
    pub fn practice(&self) -> Arc<PracticeService> {
        Arc::clone(&self.practice)
    }

    #[must_use]
    pub fn auth(&self) -> Arc<AuthService> {
        Arc::clone(&self.auth)
    }

    #[must_use]
    pub fn timeline(&self) -> Arc<TimelineService> {
        Arc::clone(&self.timeline)
    }
}

fn token_issuer(secret: &str) -> Result<TokenIssuer, AppServicesError> {
    if secret.trim().is_empty() {
        return Err(AppServicesError::MissingSecret);
    }
    Ok(TokenIssuer::new(secret.as_bytes()))
}
