use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::entities::common_types::ResponseStatus;
use crate::schema::DatasetSchema;

/// One answered question inside a response payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseValue {
    pub value: Value,
}

/// A response payload nested inside a bulk record item, keyed by the
/// answering user. `values` maps question names to submitted values.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResponseCreate {
    pub user_id: i32,
    #[serde(default)]
    pub values: IndexMap<String, ResponseValue>,
    pub status: ResponseStatus,
}

/// Check a response against the schema: every answered question must exist,
/// every value must match its question's settings, and a submitted response
/// must answer all required questions.
pub fn validate_response(
    candidate: &ResponseCreate,
    schema: &DatasetSchema,
    record_fields: Option<&serde_json::Map<String, Value>>,
) -> Result<(), String> {
    for (name, answer) in &candidate.values {
        let question = schema
            .question(name)
            .ok_or_else(|| format!("missing question with name={}", name))?;
        question
            .settings
            .validate_value(&answer.value, record_fields)
            .map_err(|reason| format!("value for question '{}' is not valid: {}", name, reason))?;
    }

    if candidate.status == ResponseStatus::Submitted {
        for question in schema.required_questions() {
            if !candidate.values.contains_key(&question.model.name) {
                return Err(format!(
                    "missing value for required question with name={}",
                    question.model.name
                ));
            }
        }
    }

    Ok(())
}
