use async_trait::async_trait;
use wellness_core::model::{User, UserId};

use super::SqliteRepository;
use super::mapping::{
    conn, map_credentials_row, map_user_row, ser, user_id_from_i64, user_id_to_i64, write_err,
};
use crate::repository::{NewUserRecord, StorageError, UserCredentials, UserRepository};

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn insert_user(&self, user: NewUserRecord) -> Result<UserId, StorageError> {
        // Validate before touching the table; the placeholder id is replaced below.
        let draft = User::new(UserId::new(0), &user.email, &user.name, user.created_at)
            .map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO users (email, name, password_hash, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(draft.email())
        .bind(draft.name())
        .bind(user.password_hash)
        .bind(draft.created_at())
        .bind(draft.updated_at())
        .execute(&self.pool)
        .await
        .map_err(write_err)?;

        user_id_from_i64(res.last_insert_rowid())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, email, name, created_at, updated_at
            FROM users WHERE id = ?1
            ",
        )
        .bind(user_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_user_row).transpose()
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, email, name, password_hash, created_at, updated_at
            FROM users WHERE email = ?1
            ",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.as_ref().map(map_credentials_row).transpose()
    }
}
