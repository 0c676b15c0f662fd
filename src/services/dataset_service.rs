use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use tracing::info;

use crate::config::AppConfig;
use crate::database::entities::common_types::DatasetStatus;
use crate::database::entities::{
    datasets, fields, metadata_properties, questions, vector_settings, workspaces,
};
use crate::errors::{DatasetError, DatasetResult};
use crate::schema::{DatasetSchema, FieldSettings, MetadataPropertySettings, QuestionSettings};

#[derive(Clone, Debug, Deserialize)]
pub struct DatasetCreate {
    pub workspace_id: i32,
    pub name: String,
    #[serde(default)]
    pub guidelines: Option<String>,
    #[serde(default = "default_allow_extra_metadata")]
    pub allow_extra_metadata: bool,
}

fn default_allow_extra_metadata() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
pub struct FieldCreate {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    pub settings: FieldSettings,
}

#[derive(Clone, Debug, Deserialize)]
pub struct QuestionCreate {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    pub settings: QuestionSettings,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MetadataPropertyCreate {
    pub name: String,
    pub title: String,
    pub settings: MetadataPropertySettings,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VectorSettingsCreate {
    pub name: String,
    pub title: String,
    pub dimensions: i32,
}

/// Dataset lifecycle and schema registry mutations.
///
/// Structural children can only be added while the dataset is draft; once
/// published the registry is frozen and only records/responses change.
pub struct DatasetService {
    db: DatabaseConnection,
    config: AppConfig,
}

impl DatasetService {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self { db, config }
    }

    pub async fn create_dataset(&self, input: DatasetCreate) -> DatasetResult<datasets::Model> {
        workspaces::Entity::find_by_id(input.workspace_id)
            .one(&self.db)
            .await?
            .ok_or(DatasetError::WorkspaceNotFound(input.workspace_id))?;

        let duplicate = datasets::Entity::find()
            .filter(datasets::Column::WorkspaceId.eq(input.workspace_id))
            .filter(datasets::Column::Name.eq(input.name.clone()))
            .one(&self.db)
            .await?;
        if duplicate.is_some() {
            return Err(DatasetError::DatasetAlreadyExists {
                name: input.name,
                workspace_id: input.workspace_id,
            });
        }

        let now = Utc::now();
        let dataset = datasets::ActiveModel {
            workspace_id: Set(input.workspace_id),
            name: Set(input.name),
            guidelines: Set(input.guidelines),
            allow_extra_metadata: Set(input.allow_extra_metadata),
            status: Set(DatasetStatus::Draft.to_string()),
            inserted_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!("Created dataset {} in workspace {}", dataset.id, dataset.workspace_id);
        Ok(dataset)
    }

    pub async fn get_dataset(&self, id: i32) -> DatasetResult<datasets::Model> {
        datasets::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(DatasetError::NotFound(id))
    }

    /// Publish a draft dataset, freezing its schema and opening it for
    /// record ingestion. Requires at least one field and one question.
    pub async fn publish_dataset(&self, id: i32) -> DatasetResult<datasets::Model> {
        let dataset = self.get_dataset(id).await?;
        if dataset.is_ready() {
            return Err(DatasetError::AlreadyPublished(id));
        }

        let schema = DatasetSchema::load(&self.db, id).await?;
        if !schema.has_fields() {
            return Err(DatasetError::PublishWithoutFields);
        }
        if !schema.has_questions() {
            return Err(DatasetError::PublishWithoutQuestions);
        }

        let mut active: datasets::ActiveModel = dataset.into();
        active.status = Set(DatasetStatus::Ready.to_string());
        active.updated_at = Set(Utc::now());
        let dataset = active.update(&self.db).await?;

        info!("Published dataset {}", dataset.id);
        Ok(dataset)
    }

    /// Delete a dataset and, through the store's cascades, everything it
    /// owns: schema children, records and their nested children.
    pub async fn delete_dataset(&self, id: i32) -> DatasetResult<()> {
        let dataset = self.get_dataset(id).await?;
        datasets::Entity::delete_by_id(dataset.id)
            .exec(&self.db)
            .await?;
        info!("Deleted dataset {}", id);
        Ok(())
    }

    pub async fn create_field(
        &self,
        dataset_id: i32,
        input: FieldCreate,
    ) -> DatasetResult<fields::Model> {
        let dataset = self.get_dataset(dataset_id).await?;
        self.ensure_draft(&dataset, "Field")?;
        self.ensure_unique_name::<fields::Entity>(
            fields::Column::DatasetId,
            fields::Column::Name,
            dataset_id,
            &input.name,
            "Field",
        )
        .await?;

        let settings = serde_json::to_value(&input.settings).map_err(|e| {
            DatasetError::InvalidSettings {
                kind: "field",
                reason: e.to_string(),
            }
        })?;

        let now = Utc::now();
        let field = fields::ActiveModel {
            dataset_id: Set(dataset_id),
            name: Set(input.name),
            title: Set(input.title),
            required: Set(input.required),
            settings: Set(settings),
            inserted_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(field)
    }

    pub async fn create_question(
        &self,
        dataset_id: i32,
        input: QuestionCreate,
    ) -> DatasetResult<questions::Model> {
        let dataset = self.get_dataset(dataset_id).await?;
        self.ensure_draft(&dataset, "Question")?;
        self.ensure_unique_name::<questions::Entity>(
            questions::Column::DatasetId,
            questions::Column::Name,
            dataset_id,
            &input.name,
            "Question",
        )
        .await?;

        input
            .settings
            .validate(&self.config)
            .map_err(|reason| DatasetError::InvalidSettings {
                kind: "question",
                reason,
            })?;

        // Span questions reference a field by name; the reference must
        // resolve against the dataset's own fields.
        if let QuestionSettings::Span { field, .. } = &input.settings {
            let schema = DatasetSchema::load(&self.db, dataset_id).await?;
            if schema.field(field).is_none() {
                return Err(DatasetError::InvalidSettings {
                    kind: "question",
                    reason: format!("span field '{}' does not exist in dataset {}", field, dataset_id),
                });
            }
        }

        let settings = serde_json::to_value(&input.settings).map_err(|e| {
            DatasetError::InvalidSettings {
                kind: "question",
                reason: e.to_string(),
            }
        })?;

        let now = Utc::now();
        let question = questions::ActiveModel {
            dataset_id: Set(dataset_id),
            name: Set(input.name),
            title: Set(input.title),
            description: Set(input.description),
            required: Set(input.required),
            settings: Set(settings),
            inserted_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(question)
    }

    pub async fn create_metadata_property(
        &self,
        dataset_id: i32,
        input: MetadataPropertyCreate,
    ) -> DatasetResult<metadata_properties::Model> {
        let dataset = self.get_dataset(dataset_id).await?;
        self.ensure_draft(&dataset, "MetadataProperty")?;
        self.ensure_unique_name::<metadata_properties::Entity>(
            metadata_properties::Column::DatasetId,
            metadata_properties::Column::Name,
            dataset_id,
            &input.name,
            "MetadataProperty",
        )
        .await?;

        input
            .settings
            .validate()
            .map_err(|reason| DatasetError::InvalidSettings {
                kind: "metadata property",
                reason,
            })?;

        let settings = serde_json::to_value(&input.settings).map_err(|e| {
            DatasetError::InvalidSettings {
                kind: "metadata property",
                reason: e.to_string(),
            }
        })?;

        let now = Utc::now();
        let property = metadata_properties::ActiveModel {
            dataset_id: Set(dataset_id),
            name: Set(input.name),
            title: Set(input.title),
            settings: Set(settings),
            inserted_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(property)
    }

    pub async fn create_vector_settings(
        &self,
        dataset_id: i32,
        input: VectorSettingsCreate,
    ) -> DatasetResult<vector_settings::Model> {
        let dataset = self.get_dataset(dataset_id).await?;
        self.ensure_draft(&dataset, "VectorSettings")?;
        self.ensure_unique_name::<vector_settings::Entity>(
            vector_settings::Column::DatasetId,
            vector_settings::Column::Name,
            dataset_id,
            &input.name,
            "VectorSettings",
        )
        .await?;

        if input.dimensions < 1 {
            return Err(DatasetError::InvalidSettings {
                kind: "vector settings",
                reason: format!("dimensions must be at least 1, got {}", input.dimensions),
            });
        }

        let now = Utc::now();
        let settings = vector_settings::ActiveModel {
            dataset_id: Set(dataset_id),
            name: Set(input.name),
            title: Set(input.title),
            dimensions: Set(input.dimensions),
            inserted_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(settings)
    }

    fn ensure_draft(&self, dataset: &datasets::Model, kind: &'static str) -> DatasetResult<()> {
        if dataset.is_ready() {
            return Err(DatasetError::PublishedSchemaChange { kind });
        }
        Ok(())
    }

    async fn ensure_unique_name<E>(
        &self,
        dataset_column: E::Column,
        name_column: E::Column,
        dataset_id: i32,
        name: &str,
        kind: &'static str,
    ) -> DatasetResult<()>
    where
        E: EntityTrait,
    {
        let existing = E::find()
            .filter(dataset_column.eq(dataset_id))
            .filter(name_column.eq(name))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(DatasetError::DuplicateName {
                kind,
                name: name.to_string(),
                dataset_id,
            });
        }
        Ok(())
    }
}
