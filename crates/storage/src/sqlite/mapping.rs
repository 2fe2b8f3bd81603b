use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use wellness_core::model::{PracticeEntry, User, UserId};

use crate::repository::{StorageError, UserCredentials};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Like `conn`, but unique-key violations become `Conflict`.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::Conflict,
        _ => conn(e),
    }
}

pub(crate) fn user_id_to_i64(id: UserId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("user_id overflow".into()))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    u64::try_from(v)
        .map(UserId::new)
        .map_err(|_| StorageError::Serialization("user_id sign overflow".into()))
}

pub(crate) fn to_document<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

pub(crate) fn from_document<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(crate) fn map_user_row(row: &SqliteRow) -> Result<User, StorageError> {
    User::from_persisted(
        user_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("email").map_err(ser)?.as_str(),
        row.try_get::<String, _>("name").map_err(ser)?.as_str(),
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_credentials_row(row: &SqliteRow) -> Result<UserCredentials, StorageError> {
    Ok(UserCredentials {
        user: map_user_row(row)?,
        password_hash: row.try_get("password_hash").map_err(ser)?,
    })
}

pub(crate) fn map_entry_row(row: &SqliteRow) -> Result<PracticeEntry, StorageError> {
    let text = |column: &str| row.try_get::<String, _>(column).map_err(ser);
    let duration = u32::try_from(row.try_get::<i64, _>("duration").map_err(ser)?)
        .map_err(|_| StorageError::Serialization("duration overflow".into()))?;

    PracticeEntry::new(
        row.try_get("practiced_on").map_err(ser)?,
        text("style")?.parse().map_err(ser)?,
        duration,
        text("focus")?.parse().map_err(ser)?,
        text("intensity")?.parse().map_err(ser)?,
        text("props")?.parse().map_err(ser)?,
    )
    .map_err(ser)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_ids_reject_negative_rows() {
        assert_eq!(user_id_from_i64(7).unwrap(), UserId::new(7));
        assert!(matches!(
            user_id_from_i64(-1),
            Err(StorageError::Serialization(_))
        ));
        assert!(user_id_to_i64(UserId::new(u64::MAX)).is_err());
    }

    #[test]
    fn bad_documents_surface_as_serialization_errors() {
        let err = from_document::<wellness_core::model::SunburstNode>("{").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
