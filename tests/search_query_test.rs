use std::sync::Arc;

use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use serde_json::json;

use labelstack::config::AppConfig;
use labelstack::database::entities::datasets;
use labelstack::database::migrations::Migrator;
use labelstack::search::{InMemorySearchEngine, SearchQuery};
use labelstack::services::dataset_service::{
    DatasetCreate, FieldCreate, MetadataPropertyCreate, QuestionCreate,
};
use labelstack::services::{DatasetService, RecordsBulkService, SearchService};
use labelstack::validators::RecordCreate;

async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

struct SearchEnv {
    db: DatabaseConnection,
    engine: Arc<InMemorySearchEngine>,
    dataset: datasets::Model,
}

impl SearchEnv {
    fn search_service(&self) -> SearchService {
        SearchService::new(self.db.clone(), self.engine.clone())
    }
}

/// Published dataset with three indexed records over a "prompt" field, a
/// rating question "quality" and a "split" metadata property.
async fn setup_env() -> SearchEnv {
    let db = setup_test_db().await;
    let config = AppConfig::default();
    let engine = Arc::new(InMemorySearchEngine::new());

    use sea_orm::ActiveModelTrait;
    let now = chrono::Utc::now();
    let workspace = labelstack::database::entities::workspaces::ActiveModel {
        name: sea_orm::ActiveValue::Set(format!("ws-{}", uuid::Uuid::new_v4())),
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
            name: "searchable".to_string(),
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

    let dataset = service.publish_dataset(dataset.id).await.unwrap();

    let items: Vec<RecordCreate> = vec![
        serde_json::from_value(json!({
            "fields": {"prompt": "the quick brown fox"},
            "metadata": {"split": "train"},
            "suggestions": [{"question": "quality", "value": 3, "score": 0.9}]
        }))
        .unwrap(),
        serde_json::from_value(json!({
            "fields": {"prompt": "a lazy dog"},
            "metadata": {"split": "test"},
            "suggestions": [{"question": "quality", "value": 1, "score": 0.2}]
        }))
        .unwrap(),
        serde_json::from_value(json!({
            "fields": {"prompt": "quick quick quick"},
            "metadata": {"split": "train"}
        }))
        .unwrap(),
    ];

    RecordsBulkService::new(db.clone(), engine.clone(), config)
        .create_records_bulk(&dataset, items)
        .await
        .unwrap();

    SearchEnv {
        db,
        engine,
        dataset,
    }
}

fn query(value: serde_json::Value) -> SearchQuery {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_filter_on_unknown_question_is_not_found() {
    let env = setup_env().await;

    let query = query(json!({
        "filters": {"type": "terms",
                    "scope": {"entity": "response", "question": "X"},
                    "values": [1]}
    }));

    let err = env
        .search_service()
        .search_records(&env.dataset, &query, 0, 10)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Question not found filtering by name=X, dataset_id={}",
            env.dataset.id
        )
    );
}

#[tokio::test]
async fn test_scope_wide_response_filter_never_fails_validation() {
    let env = setup_env().await;

    let query = query(json!({
        "filters": {"type": "terms",
                    "scope": {"entity": "response"},
                    "values": ["submitted"]}
    }));

    // No question name: validation passes regardless of the schema.
    let result = env
        .search_service()
        .search_records(&env.dataset, &query, 0, 10)
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_unknown_metadata_property_is_not_found() {
    let env = setup_env().await;

    let query = query(json!({
        "filters": {"type": "range",
                    "scope": {"entity": "metadata", "metadata_property": "loss"},
                    "ge": 0.5}
    }));

    let err = env
        .search_service()
        .search_records(&env.dataset, &query, 0, 10)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "MetadataProperty not found filtering by name=loss, dataset_id={}",
            env.dataset.id
        )
    );
}

#[tokio::test]
async fn test_text_search_ranks_and_hydrates() {
    let env = setup_env().await;

    let query = query(json!({"query": {"q": "quick"}}));
    let (items, total) = env
        .search_service()
        .search_records(&env.dataset, &query, 0, 10)
        .await
        .unwrap();

    assert_eq!(total, 2);
    assert_eq!(items.len(), 2);
    // Three occurrences beat one.
    assert!(items[0].score > items[1].score);
    assert_eq!(
        items[0].record.fields["prompt"],
        json!("quick quick quick")
    );
}

#[tokio::test]
async fn test_metadata_terms_filter_restricts_results() {
    let env = setup_env().await;

    let query = query(json!({
        "filters": {"type": "terms",
                    "scope": {"entity": "metadata", "metadata_property": "split"},
                    "values": ["train"]}
    }));
    let (items, total) = env
        .search_service()
        .search_records(&env.dataset, &query, 0, 10)
        .await
        .unwrap();

    assert_eq!(total, 2);
    for item in &items {
        assert_eq!(item.record.metadata.as_ref().unwrap()["split"], json!("train"));
    }
}

#[tokio::test]
async fn test_suggestion_score_range_filter() {
    let env = setup_env().await;

    let query = query(json!({
        "filters": {"type": "range",
                    "scope": {"entity": "suggestion", "question": "quality", "property": "score"},
                    "ge": 0.5}
    }));
    let (items, total) = env
        .search_service()
        .search_records(&env.dataset, &query, 0, 10)
        .await
        .unwrap();

    assert_eq!(total, 1);
    assert_eq!(items[0].record.fields["prompt"], json!("the quick brown fox"));
}

#[tokio::test]
async fn test_sort_by_inserted_at_desc_with_pagination() {
    let env = setup_env().await;

    let query = query(json!({
        "sort": [{"scope": {"entity": "record", "property": "inserted_at"},
                   "order": "desc"}]
    }));
    let (items, total) = env
        .search_service()
        .search_records(&env.dataset, &query, 0, 2)
        .await
        .unwrap();

    assert_eq!(total, 3);
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn test_empty_query_returns_everything() {
    let env = setup_env().await;

    let (items, total) = env
        .search_service()
        .search_records(&env.dataset, &SearchQuery::default(), 0, 10)
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(items.len(), 3);
}
