use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{SUGGESTION_SCORE_MAX, SUGGESTION_SCORE_MIN};
use crate::database::entities::common_types::SuggestionKind;
use crate::schema::DatasetSchema;

/// A suggestion payload nested inside a bulk record item, referencing its
/// question by name.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuggestionCreate {
    pub question: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SuggestionKind>,
}

/// Check one suggestion against the schema: the question must exist and the
/// value's shape must match the question's settings variant. `record_fields`
/// carries the record's field payload for span questions.
pub fn validate_suggestion(
    candidate: &SuggestionCreate,
    schema: &DatasetSchema,
    record_fields: Option<&serde_json::Map<String, Value>>,
) -> Result<(), String> {
    let question = schema.question(&candidate.question).ok_or_else(|| {
        format!("question with name={} does not exist", candidate.question)
    })?;

    if let Some(score) = candidate.score {
        if !(SUGGESTION_SCORE_MIN..=SUGGESTION_SCORE_MAX).contains(&score) {
            return Err(format!(
                "suggestion for question '{}' has score {} outside [{}, {}]",
                candidate.question, score, SUGGESTION_SCORE_MIN, SUGGESTION_SCORE_MAX
            ));
        }
    }

    question
        .settings
        .validate_value(&candidate.value, record_fields)
        .map_err(|reason| {
            format!(
                "suggestion for question '{}' is not valid: {}",
                candidate.question, reason
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::questions;
    use crate::schema::DatasetSchema;
    use serde_json::json;

    fn schema_with_rating_question() -> DatasetSchema {
        let question = questions::Model {
            id: 1,
            dataset_id: 1,
            name: "quality".to_string(),
            title: "Quality".to_string(),
            description: None,
            required: true,
            settings: json!({"type": "rating", "options": [
                {"value": 1}, {"value": 2}, {"value": 3}
            ]}),
            inserted_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        DatasetSchema::from_models(1, vec![], vec![question], vec![], vec![]).unwrap()
    }

    #[test]
    fn test_unknown_question() {
        let schema = schema_with_rating_question();
        let candidate = SuggestionCreate {
            question: "sentiment".to_string(),
            value: json!(1),
            score: None,
            agent: None,
            kind: None,
        };
        let err = validate_suggestion(&candidate, &schema, None).unwrap_err();
        assert_eq!(err, "question with name=sentiment does not exist");
    }

    #[test]
    fn test_value_outside_options() {
        let schema = schema_with_rating_question();
        let candidate = SuggestionCreate {
            question: "quality".to_string(),
            value: json!(99),
            score: None,
            agent: None,
            kind: None,
        };
        let err = validate_suggestion(&candidate, &schema, None).unwrap_err();
        assert!(err.contains("quality"));
        assert!(err.contains("99"));
    }

    #[test]
    fn test_score_bounds() {
        let schema = schema_with_rating_question();
        let candidate = SuggestionCreate {
            question: "quality".to_string(),
            value: json!(2),
            score: Some(1.5),
            agent: Some("gpt-x".to_string()),
            kind: Some(SuggestionKind::Model),
        };
        assert!(validate_suggestion(&candidate, &schema, None).is_err());

        let candidate = SuggestionCreate {
            score: Some(0.9),
            ..candidate
        };
        assert!(validate_suggestion(&candidate, &schema, None).is_ok());
    }
}
