use serde::{Deserialize, Serialize};

use crate::model::practice::{
    Category, Pose, PracticeTree, SubCategory, SubCategoryContent, SubSubCategory,
};

/// Name of the root node of every projection.
pub const SUNBURST_ROOT_NAME: &str = "Yoga Practice";

/// Display-only projection of a practice tree for radial charts.
///
/// Carries names and minutes only; ids, descriptions and frequencies are
/// dropped. The root has no value of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunburstNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SunburstNode>,
}

impl SunburstNode {
    #[must_use]
    pub fn leaf(name: impl Into<String>, value: u32) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            children: Vec::new(),
        }
    }

    /// Derive the projection of `tree`, preserving child order.
    #[must_use]
    pub fn from_tree(tree: &PracticeTree) -> Self {
        Self {
            name: SUNBURST_ROOT_NAME.to_owned(),
            value: None,
            children: tree.categories().iter().map(category_node).collect(),
        }
    }

    /// Find the first node with the given name, depth first.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&SunburstNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }
}

impl From<&PracticeTree> for SunburstNode {
    fn from(tree: &PracticeTree) -> Self {
        Self::from_tree(tree)
    }
}

fn category_node(category: &Category) -> SunburstNode {
    SunburstNode {
        name: category.name.clone(),
        value: Some(category.practice_time_minutes),
        children: category.sub_categories.iter().map(sub_category_node).collect(),
    }
}

fn sub_category_node(sub: &SubCategory) -> SunburstNode {
    let children = match &sub.content {
        SubCategoryContent::SubCategories(groups) => groups.iter().map(group_node).collect(),
        SubCategoryContent::Poses(poses) => poses.iter().map(pose_node).collect(),
    };
    SunburstNode {
        name: sub.name.clone(),
        value: Some(sub.practice_time_minutes),
        children,
    }
}

fn group_node(group: &SubSubCategory) -> SunburstNode {
    SunburstNode {
        name: group.name.clone(),
        value: Some(group.practice_time_minutes),
        children: group.poses.iter().map(pose_node).collect(),
    }
}

fn pose_node(pose: &Pose) -> SunburstNode {
    SunburstNode::leaf(pose.name.english.clone(), pose.practice_time_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_tree;
    use crate::model::{NodeId, PosePath, UserId};
    use crate::time::fixed_now;

    fn counter_ids() -> impl FnMut() -> NodeId {
        let mut next = 0_u32;
        move || {
            next += 1;
            NodeId::new(format!("n{next}")).unwrap()
        }
    }

    fn tree() -> PracticeTree {
        default_tree(UserId::new(7), fixed_now(), counter_ids()).unwrap()
    }

    #[test]
    fn projection_mirrors_tree_shape() {
        let tree = tree();
        let node = SunburstNode::from_tree(&tree);

        assert_eq!(node.name, SUNBURST_ROOT_NAME);
        assert_eq!(node.value, None);
        assert_eq!(node.children.len(), tree.categories().len());

        let hatha = node.find("Hatha").unwrap();
        assert_eq!(hatha.value, Some(tree.categories()[0].practice_time_minutes));
        let upper = node.find("Upper Body").unwrap();
        assert_eq!(upper.children.len(), 2);
        assert_eq!(upper.children[1].name, "Plank Pose");
        assert!(upper.children[1].children.is_empty());
    }

    #[test]
    fn three_level_subcategory_maps_poses_directly() {
        let node = SunburstNode::from_tree(&tree());
        let relaxation = node.find("Relaxation").unwrap();
        assert_eq!(relaxation.children[0].name, "Corpse Pose");
        assert_eq!(relaxation.children[0].value, Some(40));
    }

    #[test]
    fn projection_is_deterministic() {
        let tree = tree();
        let first = serde_json::to_string(&SunburstNode::from_tree(&tree)).unwrap();
        let second = serde_json::to_string(&SunburstNode::from_tree(&tree)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn projection_reflects_increment() {
        let mut tree = tree();
        let plank = tree.poses().find(|p| p.name.english == "Plank Pose").unwrap().clone();
        let hatha = &tree.categories()[0];
        let strength = &hatha.sub_categories[0];
        let SubCategoryContent::SubCategories(groups) = &strength.content else {
            panic!("strength is a 4-level branch");
        };
        let path = PosePath::new(hatha.id.clone(), strength.id.clone(), plank.id.clone())
            .within(groups[0].id.clone());

        tree.increment(&path, fixed_now()).unwrap();
        let node = SunburstNode::from_tree(&tree);

        let plank_node = node.find("Plank Pose").unwrap();
        assert_eq!(
            plank_node.value,
            Some(plank.practice_time_minutes + plank.session_minutes())
        );
    }

    #[test]
    fn serialized_leaves_omit_children() {
        let json = serde_json::to_value(SunburstNode::leaf("Tree Pose", 75)).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "Tree Pose", "value": 75 }));
    }
}
