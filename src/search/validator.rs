use crate::errors::{QueryContext, SearchError};
use crate::schema::DatasetSchema;

use super::query::{Filter, Scope, SearchQuery, SortClause};

/// Validates a structured query's schema references before execution.
///
/// The check is purely referential: question and metadata-property names in
/// filter/sort scopes must exist on the dataset. Value domains are not
/// checked here; that happens in the write-time validators. A query that
/// passes is handed to the engine unchanged.
pub struct SearchQueryValidator;

impl SearchQueryValidator {
    pub fn validate(schema: &DatasetSchema, query: &SearchQuery) -> Result<(), SearchError> {
        if let Some(filter) = &query.filters {
            Self::validate_filter(schema, filter)?;
        }
        for clause in &query.sort {
            Self::validate_sort(schema, clause)?;
        }
        Ok(())
    }

    fn validate_filter(schema: &DatasetSchema, filter: &Filter) -> Result<(), SearchError> {
        match filter {
            Filter::And { and } => {
                for child in and {
                    Self::validate_filter(schema, child)?;
                }
                Ok(())
            }
            Filter::Terms { scope, .. } | Filter::Range { scope, .. } => {
                Self::validate_scope(schema, scope, QueryContext::Filtering)
            }
        }
    }

    fn validate_sort(schema: &DatasetSchema, clause: &SortClause) -> Result<(), SearchError> {
        Self::validate_scope(schema, &clause.scope, QueryContext::Sorting)
    }

    fn validate_scope(
        schema: &DatasetSchema,
        scope: &Scope,
        context: QueryContext,
    ) -> Result<(), SearchError> {
        match scope {
            // Record properties are fixed; nothing to look up.
            Scope::Record { .. } => Ok(()),
            Scope::Response { question, .. } | Scope::Suggestion { question, .. } => {
                match question {
                    Some(name) if schema.question(name).is_none() => {
                        Err(SearchError::QuestionNotFound {
                            name: name.clone(),
                            dataset_id: schema.dataset_id(),
                            context,
                        })
                    }
                    // A scope without a question applies across all
                    // questions and always passes.
                    _ => Ok(()),
                }
            }
            Scope::Metadata { metadata_property } => match metadata_property {
                None => Err(SearchError::MissingMetadataProperty { context }),
                Some(name) if schema.metadata_property(name).is_none() => {
                    Err(SearchError::MetadataPropertyNotFound {
                        name: name.clone(),
                        dataset_id: schema.dataset_id(),
                        context,
                    })
                }
                Some(_) => Ok(()),
            },
        }
    }
}
