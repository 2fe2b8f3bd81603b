use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserError {
    #[error("email cannot be empty")]
    EmptyEmail,

    #[error("email is not valid: {0}")]
    InvalidEmail(String),

    #[error("name cannot be empty")]
    EmptyName,

    #[error("updated_at is before created_at")]
    InvalidTimeRange,
}

/// Trim and sanity-check an email address.
///
/// # Errors
///
/// Returns `UserError::EmptyEmail` or `UserError::InvalidEmail`.
pub fn normalize_email(raw: &str) -> Result<String, UserError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(UserError::EmptyEmail);
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email.to_owned()),
        _ => Err(UserError::InvalidEmail(email.to_owned())),
    }
}

/// A registered account. Credentials live in storage, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a user with a fresh timestamp pair.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if email or name fail validation.
    pub fn new(
        id: UserId,
        email: &str,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        Self::from_persisted(id, email, name, created_at, created_at)
    }

    /// Rehydrate a user from storage.
    ///
    /// # Errors
    ///
    /// Returns `UserError` if a stored field is invalid.
    pub fn from_persisted(
        id: UserId,
        email: &str,
        name: &str,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, UserError> {
        let email = normalize_email(email)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(UserError::EmptyName);
        }
        if updated_at < created_at {
            return Err(UserError::InvalidTimeRange);
        }

        Ok(Self {
            id,
            email,
            name: name.to_owned(),
            created_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Return a copy carrying a storage-assigned id.
    #[must_use]
    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = id;
        self
    }
}
