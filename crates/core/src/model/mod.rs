mod ids;
pub mod practice;
pub mod sunburst;
pub mod timeline;
pub mod user;

pub use ids::{NodeId, ParseIdError, UserId};

pub use practice::{
    Category, Difficulty, IncrementOutcome, PathError, Pose, PoseName, PosePath, PracticeTree,
    PracticeTreeDocument, SubCategory, SubCategoryContent, SubSubCategory, TreeError,
};
pub use sunburst::{SUNBURST_ROOT_NAME, SunburstNode};
pub use timeline::{
    Focus, Intensity, PracticeEntry, Prop, TimeRange, TimelineError, TimelineSummary, YogaStyle,
};
pub use user::{User, UserError, normalize_email};
