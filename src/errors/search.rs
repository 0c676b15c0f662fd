//! Search query validation and execution error types.

use std::fmt;
use thiserror::Error;

/// Whether the failing clause was a filter or a sort.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryContext {
    Filtering,
    Sorting,
}

impl fmt::Display for QueryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryContext::Filtering => write!(f, "filtering"),
            QueryContext::Sorting => write!(f, "sorting"),
        }
    }
}

/// Search operation errors
#[derive(Error, Debug)]
pub enum SearchError {
    /// A filter/sort scope named a question the dataset does not have
    #[error("Question not found {context} by name={name}, dataset_id={dataset_id}")]
    QuestionNotFound {
        name: String,
        dataset_id: i32,
        context: QueryContext,
    },

    /// A metadata scope named an unregistered metadata property
    #[error("MetadataProperty not found {context} by name={name}, dataset_id={dataset_id}")]
    MetadataPropertyNotFound {
        name: String,
        dataset_id: i32,
        context: QueryContext,
    },

    /// A metadata scope without a property name is meaningless
    #[error("Metadata {context} clauses must name a metadata property")]
    MissingMetadataProperty { context: QueryContext },

    /// The engine rejected or failed the query
    #[error("Search engine error: {0}")]
    Engine(String),

    /// Database operation failed during hydration
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl SearchError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SearchError::QuestionNotFound { .. } | SearchError::MetadataPropertyNotFound { .. }
        )
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            SearchError::QuestionNotFound { .. } | SearchError::MetadataPropertyNotFound { .. } => {
                404
            }
            SearchError::MissingMetadataProperty { .. } => 422,
            SearchError::Engine(_) => 503,
            SearchError::Database(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_not_found_message() {
        let err = SearchError::QuestionNotFound {
            name: "quality".to_string(),
            dataset_id: 12,
            context: QueryContext::Filtering,
        };
        assert_eq!(
            err.to_string(),
            "Question not found filtering by name=quality, dataset_id=12"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_metadata_property_not_found_message() {
        let err = SearchError::MetadataPropertyNotFound {
            name: "split".to_string(),
            dataset_id: 12,
            context: QueryContext::Sorting,
        };
        assert_eq!(
            err.to_string(),
            "MetadataProperty not found sorting by name=split, dataset_id=12"
        );
    }
}
