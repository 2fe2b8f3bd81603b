//! Default yoga taxonomy every new practice tree starts from.
//!
//! Only leaf minutes are listed; category and subcategory totals are derived
//! when the tree is built. Every frequency starts at zero.

use chrono::{DateTime, Utc};

use crate::model::{
    Category, Difficulty, NodeId, Pose, PoseName, PracticeTree, SubCategory, SubCategoryContent,
    SubSubCategory, TreeError, UserId,
};

struct CatalogPose {
    sanskrit: &'static str,
    english: &'static str,
    difficulty: Difficulty,
    duration_seconds: u32,
    benefits: &'static [&'static str],
    baseline_minutes: u32,
}

struct CatalogGroup {
    name: &'static str,
    description: &'static str,
    poses: &'static [CatalogPose],
}

enum CatalogContent {
    Poses(&'static [CatalogPose]),
    Groups(&'static [CatalogGroup]),
}

struct CatalogSubCategory {
    name: &'static str,
    description: &'static str,
    content: CatalogContent,
}

struct CatalogCategory {
    name: &'static str,
    description: &'static str,
    sub_categories: &'static [CatalogSubCategory],
}

const CATALOG: &[CatalogCategory] = &[
    CatalogCategory {
        name: "Hatha",
        description: "Traditional form focusing on posture and breath control",
        sub_categories: &[
            CatalogSubCategory {
                name: "Strength",
                description: "Poses that build strength and stability",
                content: CatalogContent::Groups(&[
                    CatalogGroup {
                        name: "Upper Body",
                        description: "Poses focusing on arm and shoulder strength",
                        poses: &[
                            CatalogPose {
                                sanskrit: "Chaturanga Dandasana",
                                english: "Four-Limbed Staff Pose",
                                difficulty: Difficulty::Intermediate,
                                duration_seconds: 120,
                                benefits: &["Builds upper body strength", "Strengthens core", "Improves posture"],
                                baseline_minutes: 100,
                            },
                            CatalogPose {
                                sanskrit: "Phalakasana",
                                english: "Plank Pose",
                                difficulty: Difficulty::Beginner,
                                duration_seconds: 90,
                                benefits: &["Strengthens arms", "Builds core stability", "Improves balance"],
                                baseline_minutes: 100,
                            },
                        ],
                    },
                    CatalogGroup {
                        name: "Core",
                        description: "Poses targeting abdominal and core strength",
                        poses: &[
                            CatalogPose {
                                sanskrit: "Navasana",
                                english: "Boat Pose",
                                difficulty: Difficulty::Intermediate,
                                duration_seconds: 90,
                                benefits: &["Strengthens core", "Improves balance", "Builds focus"],
                                baseline_minutes: 100,
                            },
                            CatalogPose {
                                sanskrit: "Ardha Navasana",
                                english: "Half Boat Pose",
                                difficulty: Difficulty::Beginner,
                                duration_seconds: 60,
                                benefits: &["Strengthens lower abdomen", "Improves core stability", "Enhances focus"],
                                baseline_minutes: 100,
                            },
                        ],
                    },
                ]),
            },
            CatalogSubCategory {
                name: "Flexibility",
                description: "Poses that enhance flexibility",
                content: CatalogContent::Groups(&[CatalogGroup {
                    name: "Spine",
                    description: "Poses focusing on spinal mobility",
                    poses: &[
                        CatalogPose {
                            sanskrit: "Uttanasana",
                            english: "Forward Fold",
                            difficulty: Difficulty::Beginner,
                            duration_seconds: 60,
                            benefits: &["Stretches spine", "Calms mind", "Relieves stress"],
                            baseline_minutes: 100,
                        },
                        CatalogPose {
                            sanskrit: "Matsyendrasana",
                            english: "Seated Twist",
                            difficulty: Difficulty::Intermediate,
                            duration_seconds: 90,
                            benefits: &["Improves spinal mobility", "Aids digestion", "Releases tension"],
                            baseline_minutes: 100,
                        },
                    ],
                }]),
            },
        ],
    },
    CatalogCategory {
        name: "Vinyasa",
        description: "Dynamic practice synchronizing breath with movement",
        sub_categories: &[CatalogSubCategory {
            name: "Balance",
            description: "Dynamic balance poses",
            content: CatalogContent::Groups(&[CatalogGroup {
                name: "Standing Poses",
                description: "Balance poses performed from standing position",
                poses: &[
                    CatalogPose {
                        sanskrit: "Vrksasana",
                        english: "Tree Pose",
                        difficulty: Difficulty::Beginner,
                        duration_seconds: 60,
                        benefits: &["Improves balance", "Strengthens legs", "Enhances focus"],
                        baseline_minutes: 75,
                    },
                    CatalogPose {
                        sanskrit: "Virabhadrasana",
                        english: "Warrior Series",
                        difficulty: Difficulty::Intermediate,
                        duration_seconds: 120,
                        benefits: &["Builds strength", "Improves stability", "Enhances focus"],
                        baseline_minutes: 75,
                    },
                ],
            }]),
        }],
    },
    CatalogCategory {
        name: "Yin",
        description: "Slow-paced style holding poses for longer periods",
        sub_categories: &[CatalogSubCategory {
            name: "Recovery",
            description: "Restorative poses for deep relaxation",
            content: CatalogContent::Groups(&[CatalogGroup {
                name: "Joints",
                description: "Poses targeting joint mobility and health",
                poses: &[
                    CatalogPose {
                        sanskrit: "Baddha Konasana",
                        english: "Hip Opener",
                        difficulty: Difficulty::Beginner,
                        duration_seconds: 300,
                        benefits: &["Opens hips", "Releases tension", "Promotes relaxation"],
                        baseline_minutes: 50,
                    },
                    CatalogPose {
                        sanskrit: "Garudasana",
                        english: "Shoulder Release",
                        difficulty: Difficulty::Intermediate,
                        duration_seconds: 240,
                        benefits: &["Relieves shoulder tension", "Improves posture", "Enhances focus"],
                        baseline_minutes: 50,
                    },
                ],
            }]),
        }],
    },
    CatalogCategory {
        name: "Restorative",
        description: "Supported, passive poses for rest and recovery",
        sub_categories: &[CatalogSubCategory {
            name: "Relaxation",
            description: "Fully supported resting poses",
            content: CatalogContent::Poses(&[
                CatalogPose {
                    sanskrit: "Savasana",
                    english: "Corpse Pose",
                    difficulty: Difficulty::Beginner,
                    duration_seconds: 600,
                    benefits: &["Calms the nervous system", "Reduces fatigue", "Integrates practice"],
                    baseline_minutes: 40,
                },
                CatalogPose {
                    sanskrit: "Balasana",
                    english: "Child's Pose",
                    difficulty: Difficulty::Beginner,
                    duration_seconds: 180,
                    benefits: &["Releases lower back", "Calms mind", "Gently stretches hips"],
                    baseline_minutes: 40,
                },
            ]),
        }],
    },
];

/// Build the default practice tree for `user_id`.
///
/// `next_id` supplies node ids in tree order; pass `NodeId::generate` outside tests.
///
/// # Errors
///
/// Returns `TreeError` if `next_id` yields duplicate ids.
pub fn default_tree(
    user_id: UserId,
    now: DateTime<Utc>,
    mut next_id: impl FnMut() -> NodeId,
) -> Result<PracticeTree, TreeError> {
    let categories = CATALOG
        .iter()
        .map(|category| build_category(category, &mut next_id))
        .collect();
    PracticeTree::from_baseline(user_id, categories, now)
}

fn build_category(category: &CatalogCategory, next_id: &mut impl FnMut() -> NodeId) -> Category {
    Category {
        id: next_id(),
        name: category.name.to_owned(),
        description: category.description.to_owned(),
        practice_time_minutes: 0,
        sub_categories: category
            .sub_categories
            .iter()
            .map(|sub| build_sub_category(sub, next_id))
            .collect(),
    }
}

fn build_sub_category(
    sub: &CatalogSubCategory,
    next_id: &mut impl FnMut() -> NodeId,
) -> SubCategory {
    let id = next_id();
    let content = match &sub.content {
        CatalogContent::Poses(poses) => SubCategoryContent::Poses(build_poses(poses, next_id)),
        CatalogContent::Groups(groups) => SubCategoryContent::SubCategories(
            groups
                .iter()
                .map(|group| SubSubCategory {
                    id: next_id(),
                    name: group.name.to_owned(),
                    description: group.description.to_owned(),
                    practice_time_minutes: 0,
                    poses: build_poses(group.poses, next_id),
                })
                .collect(),
        ),
    };
    SubCategory {
        id,
        name: sub.name.to_owned(),
        description: sub.description.to_owned(),
        practice_time_minutes: 0,
        content,
    }
}

fn build_poses(poses: &[CatalogPose], next_id: &mut impl FnMut() -> NodeId) -> Vec<Pose> {
    poses
        .iter()
        .map(|pose| Pose {
            id: next_id(),
            name: PoseName {
                sanskrit: pose.sanskrit.to_owned(),
                english: pose.english.to_owned(),
            },
            difficulty: pose.difficulty,
            duration_in_seconds: pose.duration_seconds,
            benefits: pose.benefits.iter().map(|b| (*b).to_owned()).collect(),
            frequency: 0,
            practice_time_minutes: pose.baseline_minutes,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn sequential() -> impl FnMut() -> NodeId {
        let mut next = 0_u32;
        move || {
            next += 1;
            NodeId::new(format!("id-{next}")).unwrap()
        }
    }

    #[test]
    fn default_tree_is_consistent_and_unpracticed() {
        let tree = default_tree(UserId::new(3), fixed_now(), sequential()).unwrap();

        tree.verify_aggregates().unwrap();
        assert_eq!(tree.user_id(), UserId::new(3));
        assert!(tree.poses().all(|pose| pose.frequency == 0));
        assert_eq!(tree.poses().count(), 12);
    }

    #[test]
    fn default_tree_totals_come_from_leaves() {
        let tree = default_tree(UserId::new(3), fixed_now(), sequential()).unwrap();
        let totals: Vec<(&str, u32)> = tree
            .categories()
            .iter()
            .map(|c| (c.name.as_str(), c.practice_time_minutes))
            .collect();
        assert_eq!(
            totals,
            vec![("Hatha", 600), ("Vinyasa", 150), ("Yin", 100), ("Restorative", 80)]
        );
    }

    #[test]
    fn default_tree_mixes_three_and_four_level_branches() {
        let tree = default_tree(UserId::new(3), fixed_now(), sequential()).unwrap();
        let restorative = &tree.categories()[3].sub_categories[0];
        assert!(matches!(restorative.content, SubCategoryContent::Poses(_)));
        let strength = &tree.categories()[0].sub_categories[0];
        assert!(matches!(strength.content, SubCategoryContent::SubCategories(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let fixed = NodeId::new("same").unwrap();
        let err = default_tree(UserId::new(3), fixed_now(), || fixed.clone()).unwrap_err();
        assert_eq!(err, TreeError::DuplicateSiblingId(NodeId::new("same").unwrap()));
    }
}
