//! Batch validation for record ingestion.
//!
//! Validation is strictly per item: one invalid record must not abort
//! validation for its siblings, and every failure is tagged with the item's
//! 0-based position so callers can map errors back to input rows.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::common::Patch;
use crate::config::AppConfig;
use crate::database::entities::{records, users};
use crate::errors::BulkItemError;
use crate::schema::DatasetSchema;

use super::{validate_response, validate_suggestion, validate_vector, ResponseCreate, SuggestionCreate};

/// One item of a bulk create request.
#[derive(Clone, Debug, Deserialize)]
pub struct RecordCreate {
    pub fields: Map<String, Value>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<SuggestionCreate>,
    #[serde(default)]
    pub responses: Vec<ResponseCreate>,
    #[serde(default)]
    pub vectors: IndexMap<String, Vec<f64>>,
}

/// One item of a bulk upsert request. Children and metadata are partial:
/// only what is explicitly present in the payload is touched, with the
/// tri-state [`Patch`] keeping "omitted" distinct from "set to null".
#[derive(Clone, Debug, Deserialize)]
pub struct RecordUpsert {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub fields: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Patch<Map<String, Value>>,
    #[serde(default)]
    pub suggestions: Option<Vec<SuggestionCreate>>,
    #[serde(default)]
    pub responses: Option<Vec<ResponseCreate>>,
    #[serde(default)]
    pub vectors: Option<IndexMap<String, Vec<f64>>>,
}

/// Shared lookups for validating a create batch, fetched once per call.
pub struct CreateContext<'a> {
    pub schema: &'a DatasetSchema,
    pub config: &'a AppConfig,
    pub allow_extra_metadata: bool,
    /// External ids already present in the dataset.
    pub existing_external_ids: &'a HashSet<String>,
    /// Users referenced by any response in the batch.
    pub users: &'a HashMap<i32, users::Model>,
}

/// Shared lookups for validating an upsert batch. The existing-record maps
/// let the validator decide insert-vs-update without another round-trip.
pub struct UpsertContext<'a> {
    pub schema: &'a DatasetSchema,
    pub config: &'a AppConfig,
    pub allow_extra_metadata: bool,
    pub existing_by_id: &'a HashMap<i32, records::Model>,
    pub existing_by_external_id: &'a HashMap<String, records::Model>,
    pub users: &'a HashMap<i32, users::Model>,
}

/// How one upsert item resolved against the existing records.
#[derive(Clone, Debug)]
pub enum ItemResolution {
    Insert,
    Update(records::Model),
}

/// The validated shape of an upsert batch: a resolution per item (None when
/// the item failed validation) plus the aggregated errors.
pub struct UpsertPlan {
    pub resolutions: Vec<Option<ItemResolution>>,
    pub errors: Vec<BulkItemError>,
}

/// Per-item violation buckets, composed into one position-tagged message.
#[derive(Default)]
struct ItemViolations {
    general: Vec<String>,
    metadata: Vec<String>,
    suggestions: Vec<String>,
    responses: Vec<String>,
    vectors: Vec<String>,
}

impl ItemViolations {
    fn is_empty(&self) -> bool {
        self.general.is_empty()
            && self.metadata.is_empty()
            && self.suggestions.is_empty()
            && self.responses.is_empty()
            && self.vectors.is_empty()
    }

    fn into_error(self, position: usize) -> BulkItemError {
        let mut segments = Vec::new();
        if !self.general.is_empty() {
            segments.push(format!("is not valid because {}", self.general.join("; ")));
        }
        if !self.metadata.is_empty() {
            segments.push(format!(
                "does not have valid metadata because {}",
                self.metadata.join("; ")
            ));
        }
        if !self.suggestions.is_empty() {
            segments.push(format!(
                "does not have valid suggestions because {}",
                self.suggestions.join("; ")
            ));
        }
        if !self.responses.is_empty() {
            segments.push(format!(
                "does not have valid responses because {}",
                self.responses.join("; ")
            ));
        }
        if !self.vectors.is_empty() {
            segments.push(format!(
                "does not have valid vectors because {}",
                self.vectors.join("; ")
            ));
        }

        BulkItemError {
            position,
            message: format!("Record at position {} {}", position, segments.join("; ")),
        }
    }
}

/// Validate a create batch. Returns one aggregated error per failing item;
/// an empty vec means every item may be persisted.
pub fn validate_create_batch(items: &[RecordCreate], ctx: &CreateContext) -> Vec<BulkItemError> {
    let mut seen_external_ids: HashSet<&str> = HashSet::new();
    let mut errors = Vec::new();

    for (position, item) in items.iter().enumerate() {
        let mut violations = ItemViolations::default();

        violations.general.extend(validate_fields(&item.fields, ctx.schema));

        if let Some(external_id) = &item.external_id {
            if !seen_external_ids.insert(external_id.as_str()) {
                violations.general.push(format!(
                    "external_id={} is duplicated in the batch",
                    external_id
                ));
            }
            if ctx.existing_external_ids.contains(external_id) {
                violations.general.push(format!(
                    "a record with external_id={} already exists in dataset {}",
                    external_id,
                    ctx.schema.dataset_id()
                ));
            }
        }

        if let Some(metadata) = &item.metadata {
            violations.metadata.extend(validate_metadata(
                metadata,
                ctx.schema,
                ctx.allow_extra_metadata,
                ctx.config,
            ));
        }

        validate_children(
            &mut violations,
            &item.suggestions,
            &item.responses,
            &item.vectors,
            ctx.schema,
            ctx.users,
            Some(&item.fields),
        );

        if !violations.is_empty() {
            errors.push(violations.into_error(position));
        }
    }

    errors
}

/// Validate an upsert batch and resolve each item to an insert or an update.
///
/// External id takes priority over internal id: an item matched by
/// external_id is never re-matched by id, even if both are supplied and
/// point at different rows.
pub fn validate_upsert_batch(items: &[RecordUpsert], ctx: &UpsertContext) -> UpsertPlan {
    let mut seen_external_ids: HashSet<&str> = HashSet::new();
    let mut resolutions = Vec::with_capacity(items.len());
    let mut errors = Vec::new();

    for (position, item) in items.iter().enumerate() {
        let mut violations = ItemViolations::default();

        if let Some(external_id) = &item.external_id {
            if !seen_external_ids.insert(external_id.as_str()) {
                violations.general.push(format!(
                    "external_id={} is duplicated in the batch",
                    external_id
                ));
            }
        }

        let resolution = resolve_item(item, ctx, &mut violations);

        // Span validation needs the record's field text: the payload's for
        // inserts, the stored one for updates (fields are immutable there).
        let stored_fields;
        let record_fields: Option<&Map<String, Value>> = match &resolution {
            Some(ItemResolution::Insert) => item.fields.as_ref(),
            Some(ItemResolution::Update(existing)) => {
                stored_fields = existing.fields.as_object().cloned().unwrap_or_default();
                Some(&stored_fields)
            }
            None => None,
        };

        match &resolution {
            Some(ItemResolution::Insert) => match &item.fields {
                Some(fields) => violations.general.extend(validate_fields(fields, ctx.schema)),
                None => violations
                    .general
                    .push("fields are required to create a new record".to_string()),
            },
            Some(ItemResolution::Update(_)) | None => {}
        }

        if let Patch::Value(metadata) = &item.metadata {
            violations.metadata.extend(validate_metadata(
                metadata,
                ctx.schema,
                ctx.allow_extra_metadata,
                ctx.config,
            ));
        }

        let empty_vectors = IndexMap::new();
        validate_children(
            &mut violations,
            item.suggestions.as_deref().unwrap_or(&[]),
            item.responses.as_deref().unwrap_or(&[]),
            item.vectors.as_ref().unwrap_or(&empty_vectors),
            ctx.schema,
            ctx.users,
            record_fields,
        );

        if violations.is_empty() {
            resolutions.push(resolution);
        } else {
            errors.push(violations.into_error(position));
            resolutions.push(None);
        }
    }

    UpsertPlan {
        resolutions,
        errors,
    }
}

fn resolve_item(
    item: &RecordUpsert,
    ctx: &UpsertContext,
    violations: &mut ItemViolations,
) -> Option<ItemResolution> {
    if let Some(external_id) = &item.external_id {
        if let Some(existing) = ctx.existing_by_external_id.get(external_id) {
            return Some(ItemResolution::Update(existing.clone()));
        }
        return Some(ItemResolution::Insert);
    }

    if let Some(id) = item.id {
        return match ctx.existing_by_id.get(&id) {
            Some(existing) => Some(ItemResolution::Update(existing.clone())),
            None => {
                violations
                    .general
                    .push(format!("record with id={} does not exist", id));
                None
            }
        };
    }

    Some(ItemResolution::Insert)
}

fn validate_fields(fields: &Map<String, Value>, schema: &DatasetSchema) -> Vec<String> {
    let mut reasons = Vec::new();

    for field in schema.required_fields() {
        match fields.get(&field.model.name) {
            Some(value) if !value.is_null() => {}
            _ => reasons.push(format!(
                "missing required field with name={}",
                field.model.name
            )),
        }
    }

    for (name, value) in fields {
        match schema.field(name) {
            None => reasons.push(format!("field with name={} does not exist", name)),
            Some(_) => {
                if !value.is_null() && !value.is_string() {
                    reasons.push(format!("field '{}' value must be a string", name));
                }
            }
        }
    }

    reasons
}

fn validate_metadata(
    metadata: &Map<String, Value>,
    schema: &DatasetSchema,
    allow_extra_metadata: bool,
    config: &AppConfig,
) -> Vec<String> {
    let mut reasons = Vec::new();

    for (name, value) in metadata {
        let serialized_len = serde_json::to_string(value).map(|s| s.len()).unwrap_or(0);
        if serialized_len > config.max_metadata_value_length {
            reasons.push(format!(
                "metadata value for '{}' exceeds the configured maximum length of {}",
                name, config.max_metadata_value_length
            ));
            continue;
        }

        match schema.metadata_property(name) {
            Some(property) => {
                if let Err(reason) = property.settings.validate_value(value) {
                    reasons.push(format!("metadata value for '{}' is not valid: {}", name, reason));
                }
            }
            None if !allow_extra_metadata => {
                reasons.push(format!("metadata property with name={} does not exist", name));
            }
            None => {}
        }
    }

    reasons
}

fn validate_children(
    violations: &mut ItemViolations,
    suggestions: &[SuggestionCreate],
    responses: &[ResponseCreate],
    vectors: &IndexMap<String, Vec<f64>>,
    schema: &DatasetSchema,
    users: &HashMap<i32, users::Model>,
    record_fields: Option<&Map<String, Value>>,
) {
    let mut suggested_questions: HashSet<&str> = HashSet::new();
    for suggestion in suggestions {
        if !suggested_questions.insert(suggestion.question.as_str()) {
            violations.suggestions.push(format!(
                "question with name={} has more than one suggestion",
                suggestion.question
            ));
            continue;
        }
        if let Err(reason) = validate_suggestion(suggestion, schema, record_fields) {
            violations.suggestions.push(reason);
        }
    }

    let mut responding_users: HashSet<i32> = HashSet::new();
    for response in responses {
        if !responding_users.insert(response.user_id) {
            violations.responses.push(format!(
                "user with id={} has more than one response",
                response.user_id
            ));
            continue;
        }
        if !users.contains_key(&response.user_id) {
            violations.responses.push(format!(
                "user with id={} does not exist",
                response.user_id
            ));
            continue;
        }
        if let Err(reason) = validate_response(response, schema, record_fields) {
            violations.responses.push(reason);
        }
    }

    for (name, values) in vectors {
        if let Err(reason) = validate_vector(name, values, schema) {
            violations.vectors.push(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::{fields, questions};
    use serde_json::json;

    fn schema() -> DatasetSchema {
        let now = chrono::Utc::now();
        let prompt = fields::Model {
            id: 1,
            dataset_id: 1,
            name: "prompt".to_string(),
            title: "Prompt".to_string(),
            required: true,
            settings: json!({"type": "text"}),
            inserted_at: now,
            updated_at: now,
        };
        let quality = questions::Model {
            id: 1,
            dataset_id: 1,
            name: "quality".to_string(),
            title: "Quality".to_string(),
            description: None,
            required: true,
            settings: json!({"type": "rating", "options": [
                {"value": 1}, {"value": 2}, {"value": 3}
            ]}),
            inserted_at: now,
            updated_at: now,
        };
        DatasetSchema::from_models(1, vec![prompt], vec![quality], vec![], vec![]).unwrap()
    }

    fn create_item(fields: Map<String, Value>) -> RecordCreate {
        RecordCreate {
            fields,
            metadata: None,
            external_id: None,
            suggestions: vec![],
            responses: vec![],
            vectors: IndexMap::new(),
        }
    }

    fn fields_with_prompt() -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("prompt".to_string(), json!("hello"));
        fields
    }

    fn empty_users() -> HashMap<i32, users::Model> {
        HashMap::new()
    }

    #[test]
    fn test_invalid_item_does_not_abort_siblings() {
        let schema = schema();
        let config = AppConfig::default();
        let users = empty_users();
        let existing = HashSet::new();
        let ctx = CreateContext {
            schema: &schema,
            config: &config,
            allow_extra_metadata: true,
            existing_external_ids: &existing,
            users: &users,
        };

        let valid = create_item(fields_with_prompt());
        let mut invalid = create_item(fields_with_prompt());
        invalid.suggestions.push(SuggestionCreate {
            question: "quality".to_string(),
            value: json!(99),
            score: None,
            agent: None,
            kind: None,
        });
        let also_valid = create_item(fields_with_prompt());

        let errors = validate_create_batch(&[valid, invalid, also_valid], &ctx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].position, 1);
        assert!(errors[0].message.contains("Record at position 1"));
        assert!(errors[0].message.contains("quality"));
    }

    #[test]
    fn test_missing_required_field() {
        let schema = schema();
        let config = AppConfig::default();
        let users = empty_users();
        let existing = HashSet::new();
        let ctx = CreateContext {
            schema: &schema,
            config: &config,
            allow_extra_metadata: true,
            existing_external_ids: &existing,
            users: &users,
        };

        let errors = validate_create_batch(&[create_item(Map::new())], &ctx);
        assert_eq!(errors.len(), 1);
        assert!(errors[0]
            .message
            .contains("missing required field with name=prompt"));
    }

    #[test]
    fn test_duplicate_external_id_in_batch() {
        let schema = schema();
        let config = AppConfig::default();
        let users = empty_users();
        let existing = HashSet::new();
        let ctx = CreateContext {
            schema: &schema,
            config: &config,
            allow_extra_metadata: true,
            existing_external_ids: &existing,
            users: &users,
        };

        let mut first = create_item(fields_with_prompt());
        first.external_id = Some("ext-1".to_string());
        let mut second = create_item(fields_with_prompt());
        second.external_id = Some("ext-1".to_string());

        let errors = validate_create_batch(&[first, second], &ctx);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].position, 1);
        assert!(errors[0].message.contains("duplicated in the batch"));
    }

    #[test]
    fn test_external_id_already_in_dataset() {
        let schema = schema();
        let config = AppConfig::default();
        let users = empty_users();
        let existing: HashSet<String> = ["ext-1".to_string()].into_iter().collect();
        let ctx = CreateContext {
            schema: &schema,
            config: &config,
            allow_extra_metadata: true,
            existing_external_ids: &existing,
            users: &users,
        };

        let mut item = create_item(fields_with_prompt());
        item.external_id = Some("ext-1".to_string());
        let errors = validate_create_batch(&[item], &ctx);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("already exists in dataset 1"));
    }

    #[test]
    fn test_upsert_external_id_wins_over_id() {
        let schema = schema();
        let config = AppConfig::default();
        let users = empty_users();
        let now = chrono::Utc::now();

        let by_external = records::Model {
            id: 10,
            dataset_id: 1,
            fields: json!({"prompt": "stored"}),
            metadata: None,
            external_id: Some("ext-1".to_string()),
            status: "pending".to_string(),
            inserted_at: now,
            updated_at: now,
        };
        let by_id = records::Model {
            id: 20,
            external_id: None,
            ..by_external.clone()
        };

        let existing_by_id: HashMap<i32, records::Model> =
            [(20, by_id)].into_iter().collect();
        let existing_by_external_id: HashMap<String, records::Model> =
            [("ext-1".to_string(), by_external)].into_iter().collect();

        let ctx = UpsertContext {
            schema: &schema,
            config: &config,
            allow_extra_metadata: true,
            existing_by_id: &existing_by_id,
            existing_by_external_id: &existing_by_external_id,
            users: &users,
        };

        // Both keys supplied, pointing at different rows: external_id wins.
        let item = RecordUpsert {
            id: Some(20),
            external_id: Some("ext-1".to_string()),
            fields: None,
            metadata: Patch::Absent,
            suggestions: None,
            responses: None,
            vectors: None,
        };

        let plan = validate_upsert_batch(&[item], &ctx);
        assert!(plan.errors.is_empty());
        match &plan.resolutions[0] {
            Some(ItemResolution::Update(model)) => assert_eq!(model.id, 10),
            other => panic!("expected update resolution, got {:?}", other),
        }
    }

    #[test]
    fn test_upsert_unknown_id_is_a_violation() {
        let schema = schema();
        let config = AppConfig::default();
        let users = empty_users();
        let existing_by_id = HashMap::new();
        let existing_by_external_id = HashMap::new();
        let ctx = UpsertContext {
            schema: &schema,
            config: &config,
            allow_extra_metadata: true,
            existing_by_id: &existing_by_id,
            existing_by_external_id: &existing_by_external_id,
            users: &users,
        };

        let item = RecordUpsert {
            id: Some(99),
            external_id: None,
            fields: None,
            metadata: Patch::Absent,
            suggestions: None,
            responses: None,
            vectors: None,
        };

        let plan = validate_upsert_batch(&[item], &ctx);
        assert_eq!(plan.errors.len(), 1);
        assert!(plan.errors[0].message.contains("record with id=99 does not exist"));
        assert!(plan.resolutions[0].is_none());
    }

    #[test]
    fn test_upsert_insert_requires_fields() {
        let schema = schema();
        let config = AppConfig::default();
        let users = empty_users();
        let existing_by_id = HashMap::new();
        let existing_by_external_id = HashMap::new();
        let ctx = UpsertContext {
            schema: &schema,
            config: &config,
            allow_extra_metadata: true,
            existing_by_id: &existing_by_id,
            existing_by_external_id: &existing_by_external_id,
            users: &users,
        };

        let item = RecordUpsert {
            id: None,
            external_id: Some("fresh".to_string()),
            fields: None,
            metadata: Patch::Absent,
            suggestions: None,
            responses: None,
            vectors: None,
        };

        let plan = validate_upsert_batch(&[item], &ctx);
        assert_eq!(plan.errors.len(), 1);
        assert!(plan.errors[0]
            .message
            .contains("fields are required to create a new record"));
    }
}
