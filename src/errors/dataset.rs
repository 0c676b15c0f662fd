//! Dataset lifecycle and schema registry error types.

use thiserror::Error;

/// Dataset operation errors
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Dataset not found by ID
    #[error("Dataset {0} not found")]
    NotFound(i32),

    /// Workspace not found by ID
    #[error("Workspace {0} not found")]
    WorkspaceNotFound(i32),

    /// Publish requires at least one field
    #[error("Dataset cannot be published without fields")]
    PublishWithoutFields,

    /// Publish requires at least one question
    #[error("Dataset cannot be published without questions")]
    PublishWithoutQuestions,

    /// Publish called on a dataset that is already ready
    #[error("Dataset {0} has already been published")]
    AlreadyPublished(i32),

    /// Structural children are frozen once the dataset is published
    #[error("{kind} cannot be created for a published dataset")]
    PublishedSchemaChange { kind: &'static str },

    /// Dataset name uniqueness within a workspace violated
    #[error("Dataset with name '{name}' already exists in workspace {workspace_id}")]
    DatasetAlreadyExists { name: String, workspace_id: i32 },

    /// Per-dataset name uniqueness violated
    #[error("{kind} with name '{name}' already exists for dataset {dataset_id}")]
    DuplicateName {
        kind: &'static str,
        name: String,
        dataset_id: i32,
    },

    /// Settings payload failed self-validation
    #[error("Invalid {kind} settings: {reason}")]
    InvalidSettings { kind: &'static str, reason: String },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl DatasetError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DatasetError::NotFound(_) | DatasetError::WorkspaceNotFound(_)
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DatasetError::DuplicateName { .. }
                | DatasetError::DatasetAlreadyExists { .. }
                | DatasetError::AlreadyPublished(_)
        )
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            DatasetError::NotFound(_) | DatasetError::WorkspaceNotFound(_) => 404,
            DatasetError::DuplicateName { .. }
            | DatasetError::DatasetAlreadyExists { .. }
            | DatasetError::AlreadyPublished(_) => 409,
            DatasetError::PublishWithoutFields
            | DatasetError::PublishWithoutQuestions
            | DatasetError::PublishedSchemaChange { .. }
            | DatasetError::InvalidSettings { .. } => 422,
            DatasetError::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        let err = DatasetError::NotFound(42);
        assert_eq!(err.to_string(), "Dataset 42 not found");
        assert!(err.is_not_found());
        assert_eq!(err.http_status_code(), 404);
    }

    #[test]
    fn test_publish_without_fields() {
        let err = DatasetError::PublishWithoutFields;
        assert_eq!(err.to_string(), "Dataset cannot be published without fields");
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn test_duplicate_name() {
        let err = DatasetError::DuplicateName {
            kind: "Question",
            name: "quality".to_string(),
            dataset_id: 7,
        };
        assert_eq!(
            err.to_string(),
            "Question with name 'quality' already exists for dataset 7"
        );
        assert!(err.is_conflict());
        assert_eq!(err.http_status_code(), 409);
    }
}
