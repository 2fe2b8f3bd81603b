use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use wellness_core::model::{
    IncrementOutcome, PosePath, PracticeEntry, PracticeTree, SunburstNode, TreeError, User,
    UserId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Insert payload for a new account; the id is assigned by storage.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user together with the stored password hash, for login checks.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the email is already registered,
    /// `StorageError::Serialization` if the record fails domain validation.
    async fn insert_user(&self, user: NewUserRecord) -> Result<UserId, StorageError>;

    /// Fetch a user by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError>;

    /// Fetch a user and password hash by email, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn find_credentials(&self, email: &str)
    -> Result<Option<UserCredentials>, StorageError>;
}

/// Persistence for a user's practice tree and its sunburst projection.
///
/// The two documents are always written together, so a stored projection is
/// the projection of the stored tree.
#[async_trait]
pub trait PracticeRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user has no tree.
    async fn load_tree(&self, user_id: UserId) -> Result<PracticeTree, StorageError>;

    /// Write `tree` and its freshly derived projection, replacing any previous pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the documents cannot be stored.
    async fn save_tree(&self, tree: &PracticeTree) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user has no projection.
    async fn load_projection(&self, user_id: UserId) -> Result<SunburstNode, StorageError>;

    /// Replace the stored projection.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user has no tree to project.
    async fn save_projection(
        &self,
        user_id: UserId,
        projection: &SunburstNode,
    ) -> Result<(), StorageError>;

    /// Record one practice of the pose at `path` and rewrite both documents.
    ///
    /// Either the tree and projection are both updated or neither is.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user has no tree,
    /// `StorageError::Tree` if the path does not resolve or a counter would overflow.
    async fn apply_increment(
        &self,
        user_id: UserId,
        path: &PosePath,
        now: DateTime<Utc>,
    ) -> Result<IncrementOutcome, StorageError>;

    /// Remove the tree and projection. Missing documents are not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_practice(&self, user_id: UserId) -> Result<(), StorageError>;
}

/// Per-user log of practice sessions.
#[async_trait]
pub trait TimelineRepository: Send + Sync {
    /// Replace every entry of the user with `entries`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if two entries share an id.
    async fn replace_entries(
        &self,
        user_id: UserId,
        entries: &[PracticeEntry],
    ) -> Result<(), StorageError>;

    /// Entries on or after `since` (all when `None`), newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_entries(
        &self,
        user_id: UserId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<PracticeEntry>, StorageError>;
}

#[derive(Default)]
struct UserTable {
    next_id: u64,
    rows: HashMap<UserId, UserCredentials>,
}

#[derive(Default)]
struct PracticeDocuments {
    trees: HashMap<UserId, PracticeTree>,
    projections: HashMap<UserId, SunburstNode>,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    users: Arc<Mutex<UserTable>>,
    practice: Arc<Mutex<PracticeDocuments>>,
    entries: Arc<Mutex<HashMap<UserId, Vec<PracticeEntry>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: ToString>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn insert_user(&self, user: NewUserRecord) -> Result<UserId, StorageError> {
        let mut guard = self.users.lock().map_err(poisoned)?;
        let taken = guard
            .rows
            .values()
            .any(|row| row.user.email().eq_ignore_ascii_case(user.email.trim()));
        if taken {
            return Err(StorageError::Conflict);
        }

        guard.next_id += 1;
        let id = UserId::new(guard.next_id);
        let domain = User::new(id, &user.email, &user.name, user.created_at)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.rows.insert(
            id,
            UserCredentials {
                user: domain,
                password_hash: user.password_hash,
            },
        );
        Ok(id)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        Ok(guard.rows.get(&id).map(|row| row.user.clone()))
    }

    async fn find_credentials(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, StorageError> {
        let guard = self.users.lock().map_err(poisoned)?;
        let email = email.trim();
        Ok(guard
            .rows
            .values()
            .find(|row| row.user.email().eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[async_trait]
impl PracticeRepository for InMemoryRepository {
    async fn load_tree(&self, user_id: UserId) -> Result<PracticeTree, StorageError> {
        let guard = self.practice.lock().map_err(poisoned)?;
        guard
            .trees
            .get(&user_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn save_tree(&self, tree: &PracticeTree) -> Result<(), StorageError> {
        let mut guard = self.practice.lock().map_err(poisoned)?;
        guard
            .projections
            .insert(tree.user_id(), SunburstNode::from_tree(tree));
        guard.trees.insert(tree.user_id(), tree.clone());
        Ok(())
    }

    async fn load_projection(&self, user_id: UserId) -> Result<SunburstNode, StorageError> {
        let guard = self.practice.lock().map_err(poisoned)?;
        guard
            .projections
            .get(&user_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn save_projection(
        &self,
        user_id: UserId,
        projection: &SunburstNode,
    ) -> Result<(), StorageError> {
        let mut guard = self.practice.lock().map_err(poisoned)?;
        if !guard.trees.contains_key(&user_id) {
            return Err(StorageError::NotFound);
        }
        guard.projections.insert(user_id, projection.clone());
        Ok(())
    }

    async fn apply_increment(
        &self,
        user_id: UserId,
        path: &PosePath,
        now: DateTime<Utc>,
    ) -> Result<IncrementOutcome, StorageError> {
        // One guard across read-modify-write.
        let mut guard = self.practice.lock().map_err(poisoned)?;
        let tree = guard
            .trees
            .get_mut(&user_id)
            .ok_or(StorageError::NotFound)?;
        let outcome = tree.increment(path, now)?;
        let projection = SunburstNode::from_tree(tree);
        guard.projections.insert(user_id, projection);
        Ok(outcome)
    }

    async fn delete_practice(&self, user_id: UserId) -> Result<(), StorageError> {
        let mut guard = self.practice.lock().map_err(poisoned)?;
        guard.trees.remove(&user_id);
        guard.projections.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl TimelineRepository for InMemoryRepository {
    async fn replace_entries(
        &self,
        user_id: UserId,
        entries: &[PracticeEntry],
    ) -> Result<(), StorageError> {
        let mut ids: Vec<&str> = entries.iter().map(|entry| entry.id.as_str()).collect();
        ids.sort_unstable();
        if ids.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(StorageError::Conflict);
        }

        let mut guard = self.entries.lock().map_err(poisoned)?;
        guard.insert(user_id, entries.to_vec());
        Ok(())
    }

    async fn list_entries(
        &self,
        user_id: UserId,
        since: Option<NaiveDate>,
    ) -> Result<Vec<PracticeEntry>, StorageError> {
        let guard = self.entries.lock().map_err(poisoned)?;
        let mut found: Vec<PracticeEntry> = guard
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter(|entry| since.is_none_or(|start| entry.date >= start))
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| a.style.as_str().cmp(b.style.as_str()))
        });
        Ok(found)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserRepository>,
    pub practices: Arc<dyn PracticeRepository>,
    pub timeline: Arc<dyn TimelineRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let users: Arc<dyn UserRepository> = Arc::new(repo.clone());
        let practices: Arc<dyn PracticeRepository> = Arc::new(repo.clone());
        let timeline: Arc<dyn TimelineRepository> = Arc::new(repo);
        Self {
            users,
            practices,
            timeline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wellness_core::catalog::default_tree;
    use wellness_core::model::{Focus, Intensity, NodeId, Prop, SubCategoryContent, YogaStyle};
    use wellness_core::time::fixed_now;

    fn seeded_tree(user_id: UserId) -> PracticeTree {
        default_tree(user_id, fixed_now(), NodeId::generate).unwrap()
    }

    fn relaxation_path(tree: &PracticeTree) -> PosePath {
        let restorative = &tree.categories()[3];
        let relaxation = &restorative.sub_categories[0];
        let SubCategoryContent::Poses(poses) = &relaxation.content else {
            panic!("relaxation holds poses directly");
        };
        PosePath::new(
            restorative.id.clone(),
            relaxation.id.clone(),
            poses[0].id.clone(),
        )
    }

    fn new_user(email: &str) -> NewUserRecord {
        NewUserRecord {
            email: email.into(),
            name: "Ana".into(),
            password_hash: "hash".into(),
            created_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn users_get_sequential_ids_and_unique_emails() {
        let repo = InMemoryRepository::new();
        let first = repo.insert_user(new_user("ana@example.com")).await.unwrap();
        let second = repo.insert_user(new_user("bo@example.com")).await.unwrap();
        assert_eq!(first, UserId::new(1));
        assert_eq!(second, UserId::new(2));

        let err = repo
            .insert_user(new_user("ANA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let creds = repo.find_credentials(" Ana@Example.com").await.unwrap().unwrap();
        assert_eq!(creds.user.id(), first);
        assert_eq!(creds.password_hash, "hash");
    }

    #[tokio::test]
    async fn save_tree_writes_matching_projection() {
        let repo = InMemoryRepository::new();
        let tree = seeded_tree(UserId::new(1));
        repo.save_tree(&tree).await.unwrap();

        let projection = repo.load_projection(UserId::new(1)).await.unwrap();
        assert_eq!(projection, SunburstNode::from_tree(&tree));
        assert!(matches!(
            repo.load_tree(UserId::new(2)).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn apply_increment_updates_both_documents() {
        let repo = InMemoryRepository::new();
        let tree = seeded_tree(UserId::new(1));
        let path = relaxation_path(&tree);
        repo.save_tree(&tree).await.unwrap();

        let outcome = repo
            .apply_increment(UserId::new(1), &path, fixed_now())
            .await
            .unwrap();
        assert_eq!(outcome.added_minutes, 10);
        assert_eq!(outcome.frequency, 1);

        let stored = repo.load_tree(UserId::new(1)).await.unwrap();
        assert_eq!(stored.total_minutes(), tree.total_minutes() + 10);
        let projection = repo.load_projection(UserId::new(1)).await.unwrap();
        assert_eq!(projection.find("Corpse Pose").unwrap().value, Some(50));
    }

    #[tokio::test]
    async fn failed_increment_changes_nothing() {
        let repo = InMemoryRepository::new();
        let tree = seeded_tree(UserId::new(1));
        repo.save_tree(&tree).await.unwrap();
        let mut path = relaxation_path(&tree);
        path.pose_id = NodeId::new("missing").unwrap();

        let err = repo
            .apply_increment(UserId::new(1), &path, fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Tree(TreeError::PathNotFound)));
        assert_eq!(repo.load_tree(UserId::new(1)).await.unwrap(), tree);
        assert_eq!(
            repo.load_projection(UserId::new(1)).await.unwrap(),
            SunburstNode::from_tree(&tree)
        );
    }

    #[tokio::test]
    async fn increment_without_tree_is_not_found() {
        let repo = InMemoryRepository::new();
        let tree = seeded_tree(UserId::new(1));
        let err = repo
            .apply_increment(UserId::new(9), &relaxation_path(&tree), fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn delete_practice_removes_both_documents() {
        let repo = InMemoryRepository::new();
        repo.save_tree(&seeded_tree(UserId::new(1))).await.unwrap();
        repo.delete_practice(UserId::new(1)).await.unwrap();
        repo.delete_practice(UserId::new(1)).await.unwrap();

        assert!(matches!(
            repo.load_projection(UserId::new(1)).await,
            Err(StorageError::NotFound)
        ));
        let err = repo
            .save_projection(UserId::new(1), &SunburstNode::leaf("x", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn timeline_lists_newest_first_from_cutoff() {
        let repo = InMemoryRepository::new();
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        let entry = |d, style| {
            PracticeEntry::new(day(d), style, 30, Focus::Balance, Intensity::Gentle, Prop::Mat)
                .unwrap()
        };
        repo.replace_entries(
            UserId::new(1),
            &[
                entry(1, YogaStyle::Yin),
                entry(3, YogaStyle::Hatha),
                entry(2, YogaStyle::Vinyasa),
            ],
        )
        .await
        .unwrap();

        let all = repo.list_entries(UserId::new(1), None).await.unwrap();
        let dates: Vec<_> = all.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(3), day(2), day(1)]);

        let recent = repo
            .list_entries(UserId::new(1), Some(day(2)))
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);

        let err = repo
            .replace_entries(
                UserId::new(1),
                &[entry(1, YogaStyle::Yin), entry(1, YogaStyle::Yin)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
        assert_eq!(repo.list_entries(UserId::new(1), None).await.unwrap().len(), 3);
    }
}
