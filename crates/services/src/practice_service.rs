use std::sync::Arc;

use tracing::{debug, info};
use wellness_core::catalog::default_tree;
use wellness_core::model::{IncrementOutcome, NodeId, PosePath, PracticeTree, SunburstNode, UserId};

use storage::repository::{PracticeRepository, StorageError};

use crate::Clock;
use crate::error::PracticeServiceError;

/// What `initialize` did with the user's tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeInit {
    Created,
    Replaced,
    Kept,
}

/// Records practice on a user's yoga tree and serves its views.
#[derive(Clone)]
pub struct PracticeService {
    clock: Clock,
    practices: Arc<dyn PracticeRepository>,
}

impl PracticeService {
    #[must_use]
    pub fn new(clock: Clock, practices: Arc<dyn PracticeRepository>) -> Self {
        Self { clock, practices }
    }

    /// Record one practice of the pose at `path`.
    ///
    /// The tree and its projection are updated together or not at all.
    ///
    /// # Errors
    ///
    /// Returns `PracticeServiceError::NotFound` if the user has no tree or the
    /// path does not resolve, `PracticeServiceError::Tree` on counter overflow,
    /// `PracticeServiceError::Storage` if persistence fails.
    pub async fn record_practice(
        &self,
        user_id: UserId,
        path: &PosePath,
    ) -> Result<IncrementOutcome, PracticeServiceError> {
        let outcome = self
            .practices
            .apply_increment(user_id, path, self.clock.now())
            .await?;
        info!(
            user = %user_id,
            pose = %outcome.pose_id,
            minutes = outcome.added_minutes,
            frequency = outcome.frequency,
            "recorded pose practice"
        );
        Ok(outcome)
    }

    /// Stored sunburst projection for the user.
    ///
    /// # Errors
    ///
    /// Returns `PracticeServiceError::NotFound` if none has been written.
    pub async fn sunburst(&self, user_id: UserId) -> Result<SunburstNode, PracticeServiceError> {
        Ok(self.practices.load_projection(user_id).await?)
    }

    /// Full practice tree for the user.
    ///
    /// # Errors
    ///
    /// Returns `PracticeServiceError::NotFound` if the user has no tree.
    pub async fn tree(&self, user_id: UserId) -> Result<PracticeTree, PracticeServiceError> {
        Ok(self.practices.load_tree(user_id).await?)
    }

    /// Write the default taxonomy for the user.
    ///
    /// An existing tree is kept unless `force` is set, in which case it is
    /// deleted and rebuilt with zero frequencies.
    ///
    /// # Errors
    ///
    /// Returns `PracticeServiceError` if the catalog is invalid or storage fails.
    pub async fn initialize(
        &self,
        user_id: UserId,
        force: bool,
    ) -> Result<TreeInit, PracticeServiceError> {
        let existing = match self.practices.load_tree(user_id).await {
            Ok(_) => true,
            Err(StorageError::NotFound) => false,
            Err(err) => return Err(err.into()),
        };
        if existing && !force {
            debug!(user = %user_id, "practice tree already present, keeping it");
            return Ok(TreeInit::Kept);
        }

        if existing {
            self.practices.delete_practice(user_id).await?;
        }
        let tree = default_tree(user_id, self.clock.now(), NodeId::generate)?;
        self.practices.save_tree(&tree).await?;
        info!(
            user = %user_id,
            minutes = tree.total_minutes(),
            replaced = existing,
            "initialized practice tree"
        );

        Ok(if existing {
            TreeInit::Replaced
        } else {
            TreeInit::Created
        })
    }

    /// Re-derive the projection from the stored tree and store it.
    ///
    /// # Errors
    ///
    /// Returns `PracticeServiceError::NotFound` if the user has no tree.
    pub async fn rebuild_projection(
        &self,
        user_id: UserId,
    ) -> Result<SunburstNode, PracticeServiceError> {
        let tree = self.practices.load_tree(user_id).await?;
        let projection = SunburstNode::from_tree(&tree);
        self.practices.save_projection(user_id, &projection).await?;
        Ok(projection)
    }
}
