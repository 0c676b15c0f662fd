use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use sea_orm_migration::MigratorTrait;
use serde_json::json;

use labelstack::config::AppConfig;
use labelstack::database::entities::{datasets, records};
use labelstack::database::migrations::Migrator;
use labelstack::errors::DatasetError;
use labelstack::services::dataset_service::{
    DatasetCreate, FieldCreate, QuestionCreate, VectorSettingsCreate,
};
use labelstack::services::DatasetService;

async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

async fn create_workspace(db: &DatabaseConnection) -> i32 {
    use sea_orm::ActiveModelTrait;
    let now = chrono::Utc::now();
    labelstack::database::entities::workspaces::ActiveModel {
        name: sea_orm::ActiveValue::Set(format!("ws-{}", uuid::Uuid::new_v4())),
        inserted_at: sea_orm::ActiveValue::Set(now),
        updated_at: sea_orm::ActiveValue::Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

fn field(name: &str) -> FieldCreate {
    serde_json::from_value(json!({
        "name": name,
        "title": name,
        "required": true,
        "settings": {"type": "text"}
    }))
    .unwrap()
}

fn question(name: &str) -> QuestionCreate {
    serde_json::from_value(json!({
        "name": name,
        "title": name,
        "settings": {"type": "rating", "options": [{"value": 1}, {"value": 2}]}
    }))
    .unwrap()
}

async fn create_dataset(service: &DatasetService, workspace_id: i32, name: &str) -> datasets::Model {
    service
        .create_dataset(DatasetCreate {
            workspace_id,
            name: name.to_string(),
            guidelines: None,
            allow_extra_metadata: true,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_publish_without_fields_fails_and_stays_draft() {
    let db = setup_test_db().await;
    let workspace_id = create_workspace(&db).await;
    let service = DatasetService::new(db.clone(), AppConfig::default());
    let dataset = create_dataset(&service, workspace_id, "empty").await;

    let err = service.publish_dataset(dataset.id).await.unwrap_err();
    assert_eq!(err.to_string(), "Dataset cannot be published without fields");

    let reloaded = service.get_dataset(dataset.id).await.unwrap();
    assert_eq!(reloaded.status, "draft");
}

#[tokio::test]
async fn test_publish_without_questions_fails() {
    let db = setup_test_db().await;
    let workspace_id = create_workspace(&db).await;
    let service = DatasetService::new(db.clone(), AppConfig::default());
    let dataset = create_dataset(&service, workspace_id, "fields-only").await;
    service.create_field(dataset.id, field("prompt")).await.unwrap();

    let err = service.publish_dataset(dataset.id).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Dataset cannot be published without questions"
    );
}

#[tokio::test]
async fn test_publish_freezes_schema() {
    let db = setup_test_db().await;
    let workspace_id = create_workspace(&db).await;
    let service = DatasetService::new(db.clone(), AppConfig::default());
    let dataset = create_dataset(&service, workspace_id, "publishable").await;
    service.create_field(dataset.id, field("prompt")).await.unwrap();
    service
        .create_question(dataset.id, question("quality"))
        .await
        .unwrap();

    let published = service.publish_dataset(dataset.id).await.unwrap();
    assert_eq!(published.status, "ready");

    // Publishing twice conflicts.
    let err = service.publish_dataset(dataset.id).await.unwrap_err();
    assert!(matches!(err, DatasetError::AlreadyPublished(_)));

    // Structural children are frozen once published; reads still work.
    let err = service.create_field(dataset.id, field("extra")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Field cannot be created for a published dataset"
    );
    let err = service
        .create_question(dataset.id, question("extra"))
        .await
        .unwrap_err();
    assert!(matches!(err, DatasetError::PublishedSchemaChange { .. }));
    assert!(service.get_dataset(dataset.id).await.is_ok());
}

#[tokio::test]
async fn test_duplicate_child_names_conflict() {
    let db = setup_test_db().await;
    let workspace_id = create_workspace(&db).await;
    let service = DatasetService::new(db.clone(), AppConfig::default());
    let dataset = create_dataset(&service, workspace_id, "dupes").await;

    service.create_field(dataset.id, field("prompt")).await.unwrap();
    let err = service.create_field(dataset.id, field("prompt")).await.unwrap_err();
    assert!(matches!(err, DatasetError::DuplicateName { .. }));
    assert_eq!(err.http_status_code(), 409);
}

#[tokio::test]
async fn test_question_settings_are_validated_on_creation() {
    let db = setup_test_db().await;
    let workspace_id = create_workspace(&db).await;
    let service = DatasetService::new(db.clone(), AppConfig::default());
    let dataset = create_dataset(&service, workspace_id, "settings").await;

    // A single rating option is below the configured minimum.
    let bad_rating: QuestionCreate = serde_json::from_value(json!({
        "name": "quality",
        "title": "Quality",
        "settings": {"type": "rating", "options": [{"value": 1}]}
    }))
    .unwrap();
    let err = service.create_question(dataset.id, bad_rating).await.unwrap_err();
    assert!(matches!(err, DatasetError::InvalidSettings { .. }));

    // visible_options beyond the option count.
    let bad_labels: QuestionCreate = serde_json::from_value(json!({
        "name": "topic",
        "title": "Topic",
        "settings": {"type": "label_selection",
                     "options": [{"value": "a"}, {"value": "b"}, {"value": "c"}],
                     "visible_options": 4}
    }))
    .unwrap();
    let err = service.create_question(dataset.id, bad_labels).await.unwrap_err();
    assert!(matches!(err, DatasetError::InvalidSettings { .. }));

    // Span questions must reference an existing field.
    let dangling_span: QuestionCreate = serde_json::from_value(json!({
        "name": "entities",
        "title": "Entities",
        "settings": {"type": "span", "field": "missing",
                     "options": [{"value": "person"}]}
    }))
    .unwrap();
    let err = service
        .create_question(dataset.id, dangling_span)
        .await
        .unwrap_err();
    match err {
        DatasetError::InvalidSettings { reason, .. } => {
            assert!(reason.contains("span field 'missing' does not exist"))
        }
        other => panic!("expected invalid settings, got {:?}", other),
    }
}

#[tokio::test]
async fn test_vector_settings_require_positive_dimensions() {
    let db = setup_test_db().await;
    let workspace_id = create_workspace(&db).await;
    let service = DatasetService::new(db.clone(), AppConfig::default());
    let dataset = create_dataset(&service, workspace_id, "vectors").await;

    let bad: VectorSettingsCreate = serde_json::from_value(json!({
        "name": "embedding",
        "title": "Embedding",
        "dimensions": 0
    }))
    .unwrap();
    let err = service.create_vector_settings(dataset.id, bad).await.unwrap_err();
    assert!(matches!(err, DatasetError::InvalidSettings { .. }));
}

#[tokio::test]
async fn test_delete_dataset_cascades_to_records() {
    use std::sync::Arc;

    use labelstack::search::InMemorySearchEngine;
    use labelstack::services::RecordsBulkService;
    use labelstack::validators::RecordCreate;

    let db = setup_test_db().await;
    let workspace_id = create_workspace(&db).await;
    let config = AppConfig::default();
    let service = DatasetService::new(db.clone(), config.clone());
    let dataset = create_dataset(&service, workspace_id, "cascades").await;
    service.create_field(dataset.id, field("prompt")).await.unwrap();
    service
        .create_question(dataset.id, question("quality"))
        .await
        .unwrap();
    let dataset = service.publish_dataset(dataset.id).await.unwrap();

    let engine = Arc::new(InMemorySearchEngine::new());
    let item: RecordCreate =
        serde_json::from_value(json!({"fields": {"prompt": "x"}})).unwrap();
    RecordsBulkService::new(db.clone(), engine, config)
        .create_records_bulk(&dataset, vec![item])
        .await
        .unwrap();
    assert_eq!(records::Entity::find().count(&db).await.unwrap(), 1);

    service.delete_dataset(dataset.id).await.unwrap();
    assert_eq!(records::Entity::find().count(&db).await.unwrap(), 0);

    let err = service.get_dataset(dataset.id).await.unwrap_err();
    assert!(matches!(err, DatasetError::NotFound(_)));
}
