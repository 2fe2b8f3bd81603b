use thiserror::Error;

use crate::model::{ParseIdError, PathError, TimelineError, TreeError, UserError};

/// Any domain validation failure, for callers that do not care which model raised it.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Timeline(#[from] TimelineError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_model_errors_transparently() {
        let err: Error = PathError::MissingField("poseId").into();
        assert_eq!(err.to_string(), "missing required field: poseId");
        assert!(matches!(Error::from(TreeError::PathNotFound), Error::Tree(_)));
    }
}
