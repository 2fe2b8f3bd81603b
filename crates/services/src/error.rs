//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;
use wellness_core::model::{TimelineError, TreeError, UserError};

/// Errors emitted by `PracticeService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PracticeServiceError {
    /// No tree for the user, or the path does not lead to a pose.
    #[error("not found")]
    NotFound,
    #[error(transparent)]
    Tree(TreeError),
    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for PracticeServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound | StorageError::Tree(TreeError::PathNotFound) => {
                Self::NotFound
            }
            StorageError::Tree(tree) => Self::Tree(tree),
            other => Self::Storage(other),
        }
    }
}

impl From<TreeError> for PracticeServiceError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::PathNotFound => Self::NotFound,
            other => Self::Tree(other),
        }
    }
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("missing required fields")]
    MissingFields,
    #[error("user already exists")]
    UserExists,
    #[error(transparent)]
    InvalidUser(#[from] UserError),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("user not found")]
    UserNotFound,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `TimelineService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TimelineServiceError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error("JWT secret is not configured")]
    MissingSecret,
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
