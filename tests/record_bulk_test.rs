use std::sync::Arc;

use sea_orm::{ColumnTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use sea_orm_migration::MigratorTrait;
use serde_json::json;

use labelstack::config::AppConfig;
use labelstack::database::entities::{datasets, records, responses, suggestions, users, vectors};
use labelstack::database::migrations::Migrator;
use labelstack::errors::RecordError;
use labelstack::search::InMemorySearchEngine;
use labelstack::services::dataset_service::{
    DatasetCreate, FieldCreate, MetadataPropertyCreate, QuestionCreate, VectorSettingsCreate,
};
use labelstack::services::{DatasetService, RecordsBulkService, ResponseService};
use labelstack::validators::{RecordCreate, RecordUpsert, ResponseCreate};

struct TestEnv {
    db: DatabaseConnection,
    engine: Arc<InMemorySearchEngine>,
    config: AppConfig,
    dataset: datasets::Model,
    user: users::Model,
}

impl TestEnv {
    fn bulk_service(&self) -> RecordsBulkService {
        RecordsBulkService::new(self.db.clone(), self.engine.clone(), self.config.clone())
    }

    fn response_service(&self) -> ResponseService {
        ResponseService::new(self.db.clone(), self.engine.clone())
    }

    async fn record_count(&self) -> u64 {
        records::Entity::find()
            .filter(records::Column::DatasetId.eq(self.dataset.id))
            .count(&self.db)
            .await
            .unwrap()
    }
}

async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

/// Workspace + user + published dataset with one required text field
/// "prompt", one required rating question "quality" (options 1..3), a
/// "split" terms metadata property and a 4-dimensional "embedding" vector.
async fn setup_env() -> TestEnv {
    let db = setup_test_db().await;
    let config = AppConfig::default();
    let engine = Arc::new(InMemorySearchEngine::new());

    let now = chrono::Utc::now();
    let workspace = labelstack::database::entities::workspaces::ActiveModel {
        name: sea_orm::ActiveValue::Set(format!("ws-{}", uuid::Uuid::new_v4())),
        inserted_at: sea_orm::ActiveValue::Set(now),
        updated_at: sea_orm::ActiveValue::Set(now),
        ..Default::default()
    };
    use sea_orm::ActiveModelTrait;
    let workspace = workspace.insert(&db).await.unwrap();

    let user = users::ActiveModel {
        username: sea_orm::ActiveValue::Set(format!("annotator-{}", uuid::Uuid::new_v4())),
        inserted_at: sea_orm::ActiveValue::Set(now),
        updated_at: sea_orm::ActiveValue::Set(now),
        ..Default::default()
    }
    .insert(&db)
    .await
    .unwrap();

    let service = DatasetService::new(db.clone(), config.clone());
    let dataset = service
        .create_dataset(DatasetCreate {
            workspace_id: workspace.id,
            name: "test-dataset".to_string(),
            guidelines: None,
            allow_extra_metadata: true,
        })
        .await
        .unwrap();

    service
        .create_field(
            dataset.id,
            serde_json::from_value::<FieldCreate>(json!({
                "name": "prompt",
                "title": "Prompt",
                "required": true,
                "settings": {"type": "text"}
            }))
            .unwrap(),
        )
        .await
        .unwrap();

    service
        .create_question(
            dataset.id,
            serde_json::from_value::<QuestionCreate>(json!({
                "name": "quality",
                "title": "Quality",
                "required": true,
                "settings": {"type": "rating", "options": [
                    {"value": 1}, {"value": 2}, {"value": 3}
                ]}
            }))
            .unwrap(),
        )
        .await
        .unwrap();

    service
        .create_metadata_property(
            dataset.id,
            serde_json::from_value::<MetadataPropertyCreate>(json!({
                "name": "split",
                "title": "Split",
                "settings": {"type": "terms", "values": ["train", "test"]}
            }))
            .unwrap(),
        )
        .await
        .unwrap();

    service
        .create_vector_settings(
            dataset.id,
            serde_json::from_value::<VectorSettingsCreate>(json!({
                "name": "embedding",
                "title": "Embedding",
                "dimensions": 4
            }))
            .unwrap(),
        )
        .await
        .unwrap();

    let dataset = service.publish_dataset(dataset.id).await.unwrap();

    TestEnv {
        db,
        engine,
        config,
        dataset,
        user,
    }
}

fn create_item(prompt: &str) -> RecordCreate {
    serde_json::from_value(json!({"fields": {"prompt": prompt}})).unwrap()
}

#[tokio::test]
async fn test_create_records_bulk_persists_and_indexes_all_items() {
    let env = setup_env().await;
    let items = vec![create_item("one"), create_item("two"), create_item("three")];

    let result = env
        .bulk_service()
        .create_records_bulk(&env.dataset, items)
        .await
        .unwrap();

    assert_eq!(result.records.len(), 3);
    assert!(result.errors.is_empty());
    assert!(result.updated_ids.is_empty());
    assert_eq!(env.record_count().await, 3);
    // The index receives exactly the persisted records.
    assert_eq!(env.engine.indexed_count(env.dataset.id), 3);
}

#[tokio::test]
async fn test_invalid_item_is_isolated_from_valid_siblings() {
    let env = setup_env().await;

    let valid = create_item("fine");
    let invalid: RecordCreate = serde_json::from_value(json!({
        "fields": {"prompt": "bad"},
        "suggestions": [{"question": "quality", "value": 99}]
    }))
    .unwrap();

    let result = env
        .bulk_service()
        .create_records_bulk(&env.dataset, vec![valid, invalid])
        .await
        .unwrap();

    // Item 0 persisted, item 1 rejected with exactly one error naming the
    // question and the item's position.
    assert_eq!(result.records.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].position, 1);
    assert!(result.errors[0].message.contains("Record at position 1"));
    assert!(result.errors[0].message.contains("quality"));

    assert_eq!(env.record_count().await, 1);
    assert_eq!(env.engine.indexed_count(env.dataset.id), 1);
}

#[tokio::test]
async fn test_fully_invalid_batch_fails_without_writes() {
    let env = setup_env().await;

    let missing_field: RecordCreate = serde_json::from_value(json!({"fields": {}})).unwrap();
    let err = env
        .bulk_service()
        .create_records_bulk(&env.dataset, vec![missing_field.clone(), missing_field])
        .await
        .unwrap_err();

    match err {
        RecordError::Unprocessable(errors) => {
            assert_eq!(errors.len(), 2);
            assert_eq!(errors[0].position, 0);
            assert_eq!(errors[1].position, 1);
        }
        other => panic!("expected unprocessable error, got {:?}", other),
    }

    assert_eq!(env.record_count().await, 0);
    assert_eq!(env.engine.indexed_count(env.dataset.id), 0);
}

#[tokio::test]
async fn test_records_cannot_be_created_for_draft_dataset() {
    let env = setup_env().await;
    let service = DatasetService::new(env.db.clone(), env.config.clone());
    let draft = service
        .create_dataset(DatasetCreate {
            workspace_id: env.dataset.workspace_id,
            name: "still-draft".to_string(),
            guidelines: None,
            allow_extra_metadata: true,
        })
        .await
        .unwrap();

    let err = env
        .bulk_service()
        .create_records_bulk(&draft, vec![create_item("x")])
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::DatasetNotReady(_)));
}

#[tokio::test]
async fn test_batch_size_ceiling_rejected_before_processing() {
    let env = setup_env().await;
    let config = AppConfig {
        max_bulk_records: 2,
        ..AppConfig::default()
    };
    let service = RecordsBulkService::new(env.db.clone(), env.engine.clone(), config);

    let err = service
        .create_records_bulk(
            &env.dataset,
            vec![create_item("a"), create_item("b"), create_item("c")],
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RecordError::TooManyItems { given: 3, max: 2 }
    ));
    assert_eq!(env.record_count().await, 0);
}

#[tokio::test]
async fn test_duplicate_external_id_within_batch() {
    let env = setup_env().await;

    let first: RecordCreate =
        serde_json::from_value(json!({"fields": {"prompt": "a"}, "external_id": "ext-1"}))
            .unwrap();
    let second: RecordCreate =
        serde_json::from_value(json!({"fields": {"prompt": "b"}, "external_id": "ext-1"}))
            .unwrap();

    let result = env
        .bulk_service()
        .create_records_bulk(&env.dataset, vec![first, second])
        .await
        .unwrap();

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.contains("duplicated in the batch"));
}

#[tokio::test]
async fn test_upsert_matched_by_external_id_is_never_a_duplicate_insert() {
    let env = setup_env().await;

    let create: RecordUpsert = serde_json::from_value(json!({
        "external_id": "ext-1",
        "fields": {"prompt": "hello"},
        "metadata": {"split": "train"}
    }))
    .unwrap();
    let first = env
        .bulk_service()
        .upsert_records_bulk(&env.dataset, vec![create])
        .await
        .unwrap();
    assert!(first.updated_ids.is_empty());
    assert_eq!(env.record_count().await, 1);

    let update: RecordUpsert = serde_json::from_value(json!({
        "external_id": "ext-1",
        "metadata": {"split": "test"}
    }))
    .unwrap();
    let second = env
        .bulk_service()
        .upsert_records_bulk(&env.dataset, vec![update])
        .await
        .unwrap();

    // Exactly one row, carrying the latest metadata.
    assert_eq!(second.updated_ids.len(), 1);
    assert_eq!(env.record_count().await, 1);
    let record = &second.records[0].record;
    assert_eq!(record.metadata, Some(json!({"split": "test"})));
}

#[tokio::test]
async fn test_upsert_unchanged_payload_is_idempotent() {
    let env = setup_env().await;

    let payload = json!({
        "external_id": "ext-1",
        "fields": {"prompt": "hello"},
        "metadata": {"split": "train"}
    });

    let first = env
        .bulk_service()
        .upsert_records_bulk(
            &env.dataset,
            vec![serde_json::from_value(payload.clone()).unwrap()],
        )
        .await
        .unwrap();
    let before = first.records[0].record.clone();

    let second = env
        .bulk_service()
        .upsert_records_bulk(
            &env.dataset,
            vec![serde_json::from_value(payload).unwrap()],
        )
        .await
        .unwrap();
    let after = second.records[0].record.clone();

    assert_eq!(env.record_count().await, 1);
    assert_eq!(before.fields, after.fields);
    assert_eq!(before.metadata, after.metadata);
    assert_eq!(before.external_id, after.external_id);
    assert_eq!(before.status, after.status);
}

#[tokio::test]
async fn test_upsert_metadata_patch_distinguishes_absent_from_null() {
    let env = setup_env().await;

    env.bulk_service()
        .upsert_records_bulk(
            &env.dataset,
            vec![serde_json::from_value(json!({
                "external_id": "ext-1",
                "fields": {"prompt": "hello"},
                "metadata": {"split": "train"}
            }))
            .unwrap()],
        )
        .await
        .unwrap();

    // Metadata omitted: the stored value is untouched.
    let omitted = env
        .bulk_service()
        .upsert_records_bulk(
            &env.dataset,
            vec![serde_json::from_value(json!({"external_id": "ext-1"})).unwrap()],
        )
        .await
        .unwrap();
    assert_eq!(
        omitted.records[0].record.metadata,
        Some(json!({"split": "train"}))
    );

    // Metadata explicitly null: the stored value is cleared.
    let nulled = env
        .bulk_service()
        .upsert_records_bulk(
            &env.dataset,
            vec![
                serde_json::from_value(json!({"external_id": "ext-1", "metadata": null}))
                    .unwrap(),
            ],
        )
        .await
        .unwrap();
    assert_eq!(nulled.records[0].record.metadata, None);
}

#[tokio::test]
async fn test_child_upserts_overwrite_instead_of_duplicating() {
    let env = setup_env().await;

    env.bulk_service()
        .upsert_records_bulk(
            &env.dataset,
            vec![serde_json::from_value(json!({
                "external_id": "ext-1",
                "fields": {"prompt": "hello"},
                "suggestions": [{"question": "quality", "value": 1, "score": 0.4}]
            }))
            .unwrap()],
        )
        .await
        .unwrap();

    let result = env
        .bulk_service()
        .upsert_records_bulk(
            &env.dataset,
            vec![serde_json::from_value(json!({
                "external_id": "ext-1",
                "suggestions": [{"question": "quality", "value": 2, "score": 0.9}]
            }))
            .unwrap()],
        )
        .await
        .unwrap();

    let record_id = result.records[0].record.id;
    let stored = suggestions::Entity::find()
        .filter(suggestions::Column::RecordId.eq(record_id))
        .all(&env.db)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].value, json!(2));
    assert_eq!(stored[0].score, Some(0.9));
}

#[tokio::test]
async fn test_vector_length_must_match_dimensions() {
    let env = setup_env().await;

    let wrong_length: RecordCreate = serde_json::from_value(json!({
        "fields": {"prompt": "a"},
        "vectors": {"embedding": [0.1, 0.2]}
    }))
    .unwrap();
    let err = env
        .bulk_service()
        .create_records_bulk(&env.dataset, vec![wrong_length])
        .await
        .unwrap_err();
    match err {
        RecordError::Unprocessable(errors) => {
            assert!(errors[0]
                .message
                .contains("vector with name=embedding must have 4 elements, got 2"));
        }
        other => panic!("expected unprocessable error, got {:?}", other),
    }

    let unknown: RecordCreate = serde_json::from_value(json!({
        "fields": {"prompt": "a"},
        "vectors": {"missing": [0.1, 0.2, 0.3, 0.4]}
    }))
    .unwrap();
    let err = env
        .bulk_service()
        .create_records_bulk(&env.dataset, vec![unknown])
        .await
        .unwrap_err();
    match err {
        RecordError::Unprocessable(errors) => {
            assert!(errors[0].message.contains(&format!(
                "vector with name=missing does not exist for dataset_id={}",
                env.dataset.id
            )));
        }
        other => panic!("expected unprocessable error, got {:?}", other),
    }

    let valid: RecordCreate = serde_json::from_value(json!({
        "fields": {"prompt": "a"},
        "vectors": {"embedding": [0.1, 0.2, 0.3, 0.4]}
    }))
    .unwrap();
    let result = env
        .bulk_service()
        .create_records_bulk(&env.dataset, vec![valid])
        .await
        .unwrap();
    let record_id = result.records[0].record.id;
    let stored = vectors::Entity::find()
        .filter(vectors::Column::RecordId.eq(record_id))
        .all(&env.db)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].as_floats(), vec![0.1, 0.2, 0.3, 0.4]);
}

#[tokio::test]
async fn test_record_status_is_derived_from_responses() {
    let env = setup_env().await;

    let with_submitted: RecordCreate = serde_json::from_value(json!({
        "fields": {"prompt": "answered"},
        "responses": [{
            "user_id": env.user.id,
            "values": {"quality": {"value": 3}},
            "status": "submitted"
        }]
    }))
    .unwrap();
    let without: RecordCreate = serde_json::from_value(json!({"fields": {"prompt": "bare"}})).unwrap();

    let result = env
        .bulk_service()
        .create_records_bulk(&env.dataset, vec![with_submitted, without])
        .await
        .unwrap();

    assert_eq!(result.records[0].record.status, "completed");
    assert_eq!(result.records[1].record.status, "pending");
}

#[tokio::test]
async fn test_response_referencing_unknown_user_is_rejected() {
    let env = setup_env().await;

    let item: RecordCreate = serde_json::from_value(json!({
        "fields": {"prompt": "a"},
        "responses": [{
            "user_id": 9999,
            "values": {"quality": {"value": 1}},
            "status": "submitted"
        }]
    }))
    .unwrap();

    let err = env
        .bulk_service()
        .create_records_bulk(&env.dataset, vec![item])
        .await
        .unwrap_err();
    match err {
        RecordError::Unprocessable(errors) => {
            assert!(errors[0].message.contains("user with id=9999 does not exist"));
        }
        other => panic!("expected unprocessable error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_records_respects_cap_and_removes_rows() {
    let env = setup_env().await;

    let result = env
        .bulk_service()
        .create_records_bulk(
            &env.dataset,
            vec![create_item("a"), create_item("b"), create_item("c")],
        )
        .await
        .unwrap();
    let ids: Vec<i32> = result.records.iter().map(|r| r.record.id).collect();

    let config = AppConfig {
        max_delete_records: 2,
        ..AppConfig::default()
    };
    let capped = RecordsBulkService::new(env.db.clone(), env.engine.clone(), config);
    let err = capped.delete_records(&env.dataset, &ids).await.unwrap_err();
    assert!(matches!(err, RecordError::TooManyIds { given: 3, max: 2 }));
    assert_eq!(env.record_count().await, 3);

    let deleted = env
        .bulk_service()
        .delete_records(&env.dataset, &ids[..2])
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(env.record_count().await, 1);
    assert_eq!(env.engine.indexed_count(env.dataset.id), 1);
}

#[tokio::test]
async fn test_response_upsert_is_keyed_by_record_and_user() {
    let env = setup_env().await;

    let created = env
        .bulk_service()
        .create_records_bulk(&env.dataset, vec![create_item("a")])
        .await
        .unwrap();
    let record_id = created.records[0].record.id;

    let draft: ResponseCreate = serde_json::from_value(json!({
        "user_id": env.user.id,
        "values": {"quality": {"value": 1}},
        "status": "draft"
    }))
    .unwrap();
    env.response_service()
        .upsert_response(record_id, draft)
        .await
        .unwrap();

    let record = records::Entity::find_by_id(record_id)
        .one(&env.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, "pending");

    let submitted: ResponseCreate = serde_json::from_value(json!({
        "user_id": env.user.id,
        "values": {"quality": {"value": 2}},
        "status": "submitted"
    }))
    .unwrap();
    env.response_service()
        .upsert_response(record_id, submitted)
        .await
        .unwrap();

    let stored = responses::Entity::find()
        .filter(responses::Column::RecordId.eq(record_id))
        .all(&env.db)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, "submitted");

    let record = records::Entity::find_by_id(record_id)
        .one(&env.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, "completed");
}

#[tokio::test]
async fn test_response_with_unknown_question_name() {
    let env = setup_env().await;

    let created = env
        .bulk_service()
        .create_records_bulk(&env.dataset, vec![create_item("a")])
        .await
        .unwrap();
    let record_id = created.records[0].record.id;

    let bad: ResponseCreate = serde_json::from_value(json!({
        "user_id": env.user.id,
        "values": {"sentiment": {"value": 1}},
        "status": "draft"
    }))
    .unwrap();
    let err = env
        .response_service()
        .upsert_response(record_id, bad)
        .await
        .unwrap_err();
    assert!(err
        .to_string()
        .contains("missing question with name=sentiment"));
}
