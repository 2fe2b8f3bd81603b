use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, Sqlite, Transaction};
use wellness_core::model::{IncrementOutcome, PosePath, PracticeTree, SunburstNode, UserId};

use super::SqliteRepository;
use super::mapping::{conn, from_document, ser, to_document, user_id_to_i64};
use crate::repository::{PracticeRepository, StorageError};

async fn write_documents(
    tx: &mut Transaction<'_, Sqlite>,
    tree: &PracticeTree,
) -> Result<(), StorageError> {
    let user = user_id_to_i64(tree.user_id())?;
    let tree_doc = to_document(tree)?;
    let projection_doc = to_document(&SunburstNode::from_tree(tree))?;

    sqlx::query(
        r"
        INSERT INTO practice_trees (user_id, document, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(user_id) DO UPDATE SET
            document = excluded.document,
            updated_at = excluded.updated_at
        ",
    )
    .bind(user)
    .bind(tree_doc)
    .bind(tree.last_updated())
    .execute(&mut **tx)
    .await
    .map_err(conn)?;

    sqlx::query(
        r"
        INSERT INTO practice_projections (user_id, document, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(user_id) DO UPDATE SET
            document = excluded.document,
            updated_at = excluded.updated_at
        ",
    )
    .bind(user)
    .bind(projection_doc)
    .bind(tree.last_updated())
    .execute(&mut **tx)
    .await
    .map_err(conn)?;

    Ok(())
}

#[async_trait]
impl PracticeRepository for SqliteRepository {
    async fn load_tree(&self, user_id: UserId) -> Result<PracticeTree, StorageError> {
        let row = sqlx::query("SELECT document FROM practice_trees WHERE user_id = ?1")
            .bind(user_id_to_i64(user_id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;
        from_document(row.try_get::<&str, _>("document").map_err(ser)?)
    }

    async fn save_tree(&self, tree: &PracticeTree) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        write_documents(&mut tx, tree).await?;
        tx.commit().await.map_err(conn)
    }

    async fn load_projection(&self, user_id: UserId) -> Result<SunburstNode, StorageError> {
        let row = sqlx::query("SELECT document FROM practice_projections WHERE user_id = ?1")
            .bind(user_id_to_i64(user_id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;
        from_document(row.try_get::<&str, _>("document").map_err(ser)?)
    }

    async fn save_projection(
        &self,
        user_id: UserId,
        projection: &SunburstNode,
    ) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO practice_projections (user_id, document, updated_at)
            SELECT user_id, ?2, ?3 FROM practice_trees WHERE user_id = ?1
            ON CONFLICT(user_id) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user_id_to_i64(user_id)?)
        .bind(to_document(projection)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn apply_increment(
        &self,
        user_id: UserId,
        path: &PosePath,
        now: DateTime<Utc>,
    ) -> Result<IncrementOutcome, StorageError> {
        let user = user_id_to_i64(user_id)?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        // Take the write lock before reading so concurrent increments serialize.
        let touched =
            sqlx::query("UPDATE practice_trees SET updated_at = updated_at WHERE user_id = ?1")
                .bind(user)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        if touched.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let row = sqlx::query("SELECT document FROM practice_trees WHERE user_id = ?1")
            .bind(user)
            .fetch_one(&mut *tx)
            .await
            .map_err(conn)?;
        let mut tree: PracticeTree =
            from_document(row.try_get::<&str, _>("document").map_err(ser)?)?;

        // An error here drops `tx`, which rolls back.
        let outcome = tree.increment(path, now)?;
        write_documents(&mut tx, &tree).await?;
        tx.commit().await.map_err(conn)?;

        Ok(outcome)
    }

    async fn delete_practice(&self, user_id: UserId) -> Result<(), StorageError> {
        let user = user_id_to_i64(user_id)?;
        let mut tx = self.pool.begin().await.map_err(conn)?;
        sqlx::query("DELETE FROM practice_projections WHERE user_id = ?1")
            .bind(user)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        sqlx::query("DELETE FROM practice_trees WHERE user_id = ?1")
            .bind(user)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        tx.commit().await.map_err(conn)
    }
}
