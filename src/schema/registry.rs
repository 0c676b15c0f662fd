use indexmap::IndexMap;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};

use super::{FieldSettings, MetadataPropertySettings, QuestionSettings};
use crate::database::entities::{fields, metadata_properties, questions, vector_settings};

/// A field definition with its settings already resolved.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub model: fields::Model,
    pub settings: FieldSettings,
}

/// A question definition with its settings already resolved.
#[derive(Clone, Debug)]
pub struct QuestionDef {
    pub model: questions::Model,
    pub settings: QuestionSettings,
}

#[derive(Clone, Debug)]
pub struct MetadataPropertyDef {
    pub model: metadata_properties::Model,
    pub settings: MetadataPropertySettings,
}

#[derive(Clone, Debug)]
pub struct VectorSettingsDef {
    pub model: vector_settings::Model,
}

/// The live schema of one dataset, loaded in a single pass and keyed by
/// name in definition order. Validators and the search query validator only
/// ever consult this view; it is never copied into engine state.
#[derive(Clone, Debug)]
pub struct DatasetSchema {
    dataset_id: i32,
    fields: IndexMap<String, FieldDef>,
    questions: IndexMap<String, QuestionDef>,
    metadata_properties: IndexMap<String, MetadataPropertyDef>,
    vector_settings: IndexMap<String, VectorSettingsDef>,
}

impl DatasetSchema {
    pub async fn load<C: ConnectionTrait>(conn: &C, dataset_id: i32) -> Result<Self, DbErr> {
        let fields = fields::Entity::find()
            .filter(fields::Column::DatasetId.eq(dataset_id))
            .order_by_asc(fields::Column::Id)
            .all(conn)
            .await?;
        let questions = questions::Entity::find()
            .filter(questions::Column::DatasetId.eq(dataset_id))
            .order_by_asc(questions::Column::Id)
            .all(conn)
            .await?;
        let metadata_properties = metadata_properties::Entity::find()
            .filter(metadata_properties::Column::DatasetId.eq(dataset_id))
            .order_by_asc(metadata_properties::Column::Id)
            .all(conn)
            .await?;
        let vector_settings = vector_settings::Entity::find()
            .filter(vector_settings::Column::DatasetId.eq(dataset_id))
            .order_by_asc(vector_settings::Column::Id)
            .all(conn)
            .await?;

        Self::from_models(
            dataset_id,
            fields,
            questions,
            metadata_properties,
            vector_settings,
        )
        .map_err(DbErr::Custom)
    }

    /// Build the registry from already-fetched rows, resolving every stored
    /// settings payload into its typed variant. Fails on a settings payload
    /// that does not parse, which would mean a corrupted row.
    pub fn from_models(
        dataset_id: i32,
        fields: Vec<fields::Model>,
        questions: Vec<questions::Model>,
        metadata_properties: Vec<metadata_properties::Model>,
        vector_settings: Vec<vector_settings::Model>,
    ) -> Result<Self, String> {
        let mut field_map = IndexMap::new();
        for model in fields {
            let settings = model
                .parsed_settings()
                .map_err(|e| format!("field '{}' has invalid settings: {}", model.name, e))?;
            field_map.insert(model.name.clone(), FieldDef { model, settings });
        }

        let mut question_map = IndexMap::new();
        for model in questions {
            let settings = model
                .parsed_settings()
                .map_err(|e| format!("question '{}' has invalid settings: {}", model.name, e))?;
            question_map.insert(model.name.clone(), QuestionDef { model, settings });
        }

        let mut property_map = IndexMap::new();
        for model in metadata_properties {
            let settings = model.parsed_settings().map_err(|e| {
                format!("metadata property '{}' has invalid settings: {}", model.name, e)
            })?;
            property_map.insert(model.name.clone(), MetadataPropertyDef { model, settings });
        }

        let mut vector_map = IndexMap::new();
        for model in vector_settings {
            vector_map.insert(model.name.clone(), VectorSettingsDef { model });
        }

        Ok(Self {
            dataset_id,
            fields: field_map,
            questions: question_map,
            metadata_properties: property_map,
            vector_settings: vector_map,
        })
    }

    pub fn dataset_id(&self) -> i32 {
        self.dataset_id
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values()
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn questions(&self) -> impl Iterator<Item = &QuestionDef> {
        self.questions.values()
    }

    pub fn question(&self, name: &str) -> Option<&QuestionDef> {
        self.questions.get(name)
    }

    pub fn metadata_properties(&self) -> impl Iterator<Item = &MetadataPropertyDef> {
        self.metadata_properties.values()
    }

    pub fn metadata_property(&self, name: &str) -> Option<&MetadataPropertyDef> {
        self.metadata_properties.get(name)
    }

    pub fn vector_settings(&self) -> impl Iterator<Item = &VectorSettingsDef> {
        self.vector_settings.values()
    }

    pub fn vector_settings_by_name(&self, name: &str) -> Option<&VectorSettingsDef> {
        self.vector_settings.get(name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.values().filter(|f| f.model.required)
    }

    pub fn required_questions(&self) -> impl Iterator<Item = &QuestionDef> {
        self.questions.values().filter(|q| q.model.required)
    }

    pub fn has_fields(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn has_questions(&self) -> bool {
        !self.questions.is_empty()
    }
}
