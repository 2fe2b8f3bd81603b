use async_trait::async_trait;
use chrono::NaiveDate;
use wellness_core::model::{PracticeEntry, UserId};

use super::SqliteRepository;
use super::mapping::{conn, map_entry_row, user_id_to_i64, write_err};
use crate::repository::{StorageError, TimelineRepository};

#[async_trait]
impl TimelineRepository for SqliteRepository {
    async fn replace_entries(
        &self,
        user_id: UserId,
        entries: &[PracticeEntry],
    ) -> Result<(), StorageError> {
        let user = user_id_to_i64(user_id)?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM practice_entries WHERE user_id = ?1")
            .bind(user)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for entry in entries {
            sqlx::query(
                r"
                INSERT INTO practice_entries
                    (user_id, id, practiced_on, style, duration, focus, intensity, props)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ",
            )
            .bind(user)
            .bind(entry.id.as_str())
            .bind(entry.date)
            .bind(entry.style.as_str())
            .bind(i64::from(entry.duration))
            .bind(entry.focus.as_str())
            .bind(entry.intensity.as_str())
            .bind(entry.props.as_str())
            .execute(&mut *tx)
            .await
            .map_err(write_err)?;
        }

        tx.commit().await.map_err(conn)
    }

    async fn list_entries(
        &self,
        user_id: UserId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<PracticeEntry>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT practiced_on, style, duration, focus, intensity, props
            FROM practice_entries
            WHERE user_id = ?1 AND (?2 IS NULL OR practiced_on >= ?2)
            ORDER BY practiced_on DESC, style ASC
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_entry_row).collect()
    }
}
