use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{NodeId, UserId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TreeError {
    #[error("no node matches the requested path")]
    PathNotFound,

    #[error("pose id {0} appears more than once")]
    DuplicatePoseId(NodeId),

    #[error("sibling id {0} appears more than once")]
    DuplicateSiblingId(NodeId),

    #[error("subcategory {0} has no content")]
    EmptySubCategory(NodeId),

    #[error("pose {0} must have a positive duration")]
    ZeroDuration(NodeId),

    #[error("node {id} holds {actual} minutes but its children sum to {expected}")]
    AggregateMismatch { id: NodeId, expected: u64, actual: u64 },

    #[error("counter overflow while recording pose {0}")]
    CounterOverflow(NodeId),
}

/// Errors raised while reading an increment request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

//
// ─── NODES ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoseName {
    pub sanskrit: String,
    pub english: String,
}

/// Leaf of the practice tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub id: NodeId,
    pub name: PoseName,
    pub difficulty: Difficulty,
    pub duration_in_seconds: u32,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub frequency: u32,
    pub practice_time_minutes: u32,
}

impl Pose {
    /// Minutes credited for one practice of this pose, rounded up to a whole minute.
    #[must_use]
    pub fn session_minutes(&self) -> u32 {
        self.duration_in_seconds.div_ceil(60)
    }
}

/// Optional fourth level: a named group of poses under a subcategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubSubCategory {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub practice_time_minutes: u32,
    pub poses: Vec<Pose>,
}

/// What a subcategory holds: poses directly, or one more level of groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubCategoryContent {
    Poses(Vec<Pose>),
    SubCategories(Vec<SubSubCategory>),
}

impl SubCategoryContent {
    fn is_empty(&self) -> bool {
        match self {
            SubCategoryContent::Poses(poses) => poses.is_empty(),
            SubCategoryContent::SubCategories(groups) => groups.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub practice_time_minutes: u32,
    #[serde(flatten)]
    pub content: SubCategoryContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub practice_time_minutes: u32,
    pub sub_categories: Vec<SubCategory>,
}

//
// ─── INCREMENT ─────────────────────────────────────────────────────────────────
//

/// Id path from a category down to one pose.
///
/// `sub_sub_category_id` selects the 4-level shape; when it is `None` the
/// subcategory must hold its poses directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PosePath {
    pub category_id: NodeId,
    pub sub_category_id: NodeId,
    pub sub_sub_category_id: Option<NodeId>,
    pub pose_id: NodeId,
}

impl PosePath {
    #[must_use]
    pub fn new(category_id: NodeId, sub_category_id: NodeId, pose_id: NodeId) -> Self {
        Self {
            category_id,
            sub_category_id,
            sub_sub_category_id: None,
            pose_id,
        }
    }

    #[must_use]
    pub fn within(mut self, sub_sub_category_id: NodeId) -> Self {
        self.sub_sub_category_id = Some(sub_sub_category_id);
        self
    }

    /// Build a path from raw request fields.
    ///
    /// A blank `sub_sub_category_id` counts as absent.
    ///
    /// # Errors
    ///
    /// Returns `PathError::MissingField` naming the first required field that
    /// is absent or blank.
    pub fn parse(
        category_id: Option<&str>,
        sub_category_id: Option<&str>,
        sub_sub_category_id: Option<&str>,
        pose_id: Option<&str>,
    ) -> Result<Self, PathError> {
        let pose_id = required(pose_id, "poseId")?;
        let category_id = required(category_id, "categoryId")?;
        let sub_category_id = required(sub_category_id, "subCategoryId")?;
        let sub_sub_category_id = sub_sub_category_id.and_then(|raw| NodeId::new(raw).ok());

        Ok(Self {
            category_id,
            sub_category_id,
            sub_sub_category_id,
            pose_id,
        })
    }
}

fn required(raw: Option<&str>, field: &'static str) -> Result<NodeId, PathError> {
    raw.and_then(|value| NodeId::new(value).ok())
        .ok_or(PathError::MissingField(field))
}

/// Result of recording one practice of a pose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncrementOutcome {
    pub pose_id: NodeId,
    pub added_minutes: u32,
    pub frequency: u32,
    pub practice_time_minutes: u32,
}

fn bump(current: u32, delta: u32, pose_id: &NodeId) -> Result<u32, TreeError> {
    current
        .checked_add(delta)
        .ok_or_else(|| TreeError::CounterOverflow(pose_id.clone()))
}

fn find_pose<'a>(poses: &'a mut [Pose], pose_id: &NodeId) -> Result<&'a mut Pose, TreeError> {
    poses
        .iter_mut()
        .find(|pose| pose.id == *pose_id)
        .ok_or(TreeError::PathNotFound)
}

impl Category {
    fn increment(&mut self, path: &PosePath) -> Result<IncrementOutcome, TreeError> {
        let sub = self
            .sub_categories
            .iter_mut()
            .find(|sub| sub.id == path.sub_category_id)
            .ok_or(TreeError::PathNotFound)?;

        let (pose, group_minutes) = match (&mut sub.content, path.sub_sub_category_id.as_ref()) {
            (SubCategoryContent::Poses(poses), None) => (find_pose(poses, &path.pose_id)?, None),
            (SubCategoryContent::SubCategories(groups), Some(group_id)) => {
                let group = groups
                    .iter_mut()
                    .find(|group| group.id == *group_id)
                    .ok_or(TreeError::PathNotFound)?;
                (
                    find_pose(&mut group.poses, &path.pose_id)?,
                    Some(&mut group.practice_time_minutes),
                )
            }
            _ => return Err(TreeError::PathNotFound),
        };

        let minutes = pose.session_minutes();
        pose.frequency = bump(pose.frequency, 1, &pose.id)?;
        pose.practice_time_minutes = bump(pose.practice_time_minutes, minutes, &pose.id)?;
        let outcome = IncrementOutcome {
            pose_id: pose.id.clone(),
            added_minutes: minutes,
            frequency: pose.frequency,
            practice_time_minutes: pose.practice_time_minutes,
        };

        if let Some(total) = group_minutes {
            *total = bump(*total, minutes, &outcome.pose_id)?;
        }
        sub.practice_time_minutes = bump(sub.practice_time_minutes, minutes, &outcome.pose_id)?;
        self.practice_time_minutes = bump(self.practice_time_minutes, minutes, &outcome.pose_id)?;

        Ok(outcome)
    }
}

//
// ─── TREE ──────────────────────────────────────────────────────────────────────
//

/// Raw document shape of a practice tree, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeTreeDocument {
    pub user_id: UserId,
    pub categories: Vec<Category>,
    pub last_updated: DateTime<Utc>,
}

/// A user's yoga taxonomy with cumulative practice counters.
///
/// Construction validates the tree, so a value of this type always has unique
/// pose ids, non-empty subcategories, positive pose durations and internal
/// minutes equal to the sum of their children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "PracticeTreeDocument")]
pub struct PracticeTree {
    user_id: UserId,
    categories: Vec<Category>,
    last_updated: DateTime<Utc>,
}

impl TryFrom<PracticeTreeDocument> for PracticeTree {
    type Error = TreeError;

    fn try_from(doc: PracticeTreeDocument) -> Result<Self, Self::Error> {
        Self::from_persisted(doc.user_id, doc.categories, doc.last_updated)
    }
}

impl PracticeTree {
    /// Rehydrate a tree whose counters are already consistent.
    ///
    /// # Errors
    ///
    /// Returns `TreeError` if the structure or any aggregate is invalid.
    pub fn from_persisted(
        user_id: UserId,
        categories: Vec<Category>,
        last_updated: DateTime<Utc>,
    ) -> Result<Self, TreeError> {
        let tree = Self {
            user_id,
            categories,
            last_updated,
        };
        tree.validate_structure()?;
        tree.verify_aggregates()?;
        Ok(tree)
    }

    /// Build a tree from leaf baselines, deriving every internal total.
    ///
    /// Whatever minutes the internal nodes carry on input are overwritten.
    ///
    /// # Errors
    ///
    /// Returns `TreeError` if the structure is invalid or a total overflows.
    pub fn from_baseline(
        user_id: UserId,
        mut categories: Vec<Category>,
        now: DateTime<Utc>,
    ) -> Result<Self, TreeError> {
        for category in &mut categories {
            derive_totals(category)?;
        }
        Self::from_persisted(user_id, categories, now)
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Sum of all category totals.
    #[must_use]
    pub fn total_minutes(&self) -> u64 {
        self.categories
            .iter()
            .map(|category| u64::from(category.practice_time_minutes))
            .sum()
    }

    /// Look up a pose anywhere in the tree.
    #[must_use]
    pub fn find_pose(&self, pose_id: &NodeId) -> Option<&Pose> {
        self.poses().find(|pose| pose.id == *pose_id)
    }

    /// Iterate over every pose in tree order.
    pub fn poses(&self) -> impl Iterator<Item = &Pose> {
        self.categories
            .iter()
            .flat_map(|category| category.sub_categories.iter())
            .flat_map(sub_category_poses)
    }

    /// Record one practice of the pose at `path`.
    ///
    /// The pose gains one frequency and its session minutes; every ancestor on
    /// the path gains the same minutes. Other branches are untouched. On error
    /// the tree is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::PathNotFound` if the ids do not resolve to a pose
    /// with the requested depth, or `TreeError::CounterOverflow` if a counter
    /// would overflow.
    pub fn increment(
        &mut self,
        path: &PosePath,
        now: DateTime<Utc>,
    ) -> Result<IncrementOutcome, TreeError> {
        let index = self
            .categories
            .iter()
            .position(|category| category.id == path.category_id)
            .ok_or(TreeError::PathNotFound)?;

        let mut category = self.categories[index].clone();
        let outcome = category.increment(path)?;
        self.categories[index] = category;
        self.last_updated = now;
        Ok(outcome)
    }

    /// Check that every internal node's minutes equal the sum of its children.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::AggregateMismatch` for the first inconsistent node.
    pub fn verify_aggregates(&self) -> Result<(), TreeError> {
        for category in &self.categories {
            let mut category_sum = 0_u64;
            for sub in &category.sub_categories {
                let sub_sum = match &sub.content {
                    SubCategoryContent::Poses(poses) => pose_sum(poses),
                    SubCategoryContent::SubCategories(groups) => {
                        let mut groups_sum = 0_u64;
                        for group in groups {
                            let group_sum = pose_sum(&group.poses);
                            expect_total(&group.id, group.practice_time_minutes, group_sum)?;
                            groups_sum += group_sum;
                        }
                        groups_sum
                    }
                };
                expect_total(&sub.id, sub.practice_time_minutes, sub_sum)?;
                category_sum += sub_sum;
            }
            expect_total(&category.id, category.practice_time_minutes, category_sum)?;
        }
        Ok(())
    }

    fn validate_structure(&self) -> Result<(), TreeError> {
        let mut pose_ids = HashSet::new();
        unique_siblings(self.categories.iter().map(|category| &category.id))?;

        for category in &self.categories {
            unique_siblings(category.sub_categories.iter().map(|sub| &sub.id))?;
            for sub in &category.sub_categories {
                if sub.content.is_empty() {
                    return Err(TreeError::EmptySubCategory(sub.id.clone()));
                }
                match &sub.content {
                    SubCategoryContent::Poses(poses) => check_poses(poses, &mut pose_ids)?,
                    SubCategoryContent::SubCategories(groups) => {
                        unique_siblings(groups.iter().map(|group| &group.id))?;
                        for group in groups {
                            check_poses(&group.poses, &mut pose_ids)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn sub_category_poses(sub: &SubCategory) -> Box<dyn Iterator<Item = &Pose> + '_> {
    match &sub.content {
        SubCategoryContent::Poses(poses) => Box::new(poses.iter()),
        SubCategoryContent::SubCategories(groups) => {
            Box::new(groups.iter().flat_map(|group| group.poses.iter()))
        }
    }
}

fn pose_sum(poses: &[Pose]) -> u64 {
    poses
        .iter()
        .map(|pose| u64::from(pose.practice_time_minutes))
        .sum()
}

fn expect_total(id: &NodeId, actual: u32, expected: u64) -> Result<(), TreeError> {
    if u64::from(actual) == expected {
        Ok(())
    } else {
        Err(TreeError::AggregateMismatch {
            id: id.clone(),
            expected,
            actual: u64::from(actual),
        })
    }
}

fn unique_siblings<'a>(ids: impl Iterator<Item = &'a NodeId>) -> Result<(), TreeError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(TreeError::DuplicateSiblingId(id.clone()));
        }
    }
    Ok(())
}

fn check_poses<'a>(poses: &'a [Pose], seen: &mut HashSet<&'a NodeId>) -> Result<(), TreeError> {
    for pose in poses {
        if pose.duration_in_seconds == 0 {
            return Err(TreeError::ZeroDuration(pose.id.clone()));
        }
        if !seen.insert(&pose.id) {
            return Err(TreeError::DuplicatePoseId(pose.id.clone()));
        }
    }
    Ok(())
}

fn derive_totals(category: &mut Category) -> Result<(), TreeError> {
    let mut category_sum = 0_u64;
    for sub in &mut category.sub_categories {
        let sub_sum = match &mut sub.content {
            SubCategoryContent::Poses(poses) => pose_sum(poses),
            SubCategoryContent::SubCategories(groups) => {
                let mut groups_sum = 0_u64;
                for group in groups {
                    let group_sum = pose_sum(&group.poses);
                    group.practice_time_minutes = narrow(group_sum, &group.id)?;
                    groups_sum += group_sum;
                }
                groups_sum
            }
        };
        sub.practice_time_minutes = narrow(sub_sum, &sub.id)?;
        category_sum += sub_sum;
    }
    category.practice_time_minutes = narrow(category_sum, &category.id)?;
    Ok(())
}

fn narrow(total: u64, id: &NodeId) -> Result<u32, TreeError> {
    u32::try_from(total).map_err(|_| TreeError::CounterOverflow(id.clone()))
}
