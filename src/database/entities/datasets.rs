use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::common_types::DatasetStatus;

/// An annotation dataset: the unit teams define fields, questions, metadata
/// properties and vector settings on, then ingest records into.
///
/// Structural children (fields/questions/metadata properties/vector
/// settings) may only be created while the dataset is in `draft`; publishing
/// freezes the schema and opens the dataset for record ingestion.
///
/// Related entities:
/// - `workspaces`: the owning workspace
/// - `fields`, `questions`, `metadata_properties`, `vector_settings`: the
///   schema registry children
/// - `records`: ingested rows (cascade delete)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "datasets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub workspace_id: i32,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub guidelines: Option<String>,
    pub allow_extra_metadata: bool,
    pub status: String, // 'draft', 'ready'
    pub inserted_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::workspaces::Entity",
        from = "Column::WorkspaceId",
        to = "super::workspaces::Column::Id"
    )]
    Workspaces,
    #[sea_orm(has_many = "super::fields::Entity")]
    Fields,
    #[sea_orm(has_many = "super::questions::Entity")]
    Questions,
    #[sea_orm(has_many = "super::metadata_properties::Entity")]
    MetadataProperties,
    #[sea_orm(has_many = "super::vector_settings::Entity")]
    VectorSettings,
    #[sea_orm(has_many = "super::records::Entity")]
    Records,
}

impl Related<super::workspaces::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workspaces.def()
    }
}

impl Related<super::fields::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fields.def()
    }
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::metadata_properties::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MetadataProperties.def()
    }
}

impl Related<super::vector_settings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VectorSettings.def()
    }
}

impl Related<super::records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn get_status(&self) -> Option<DatasetStatus> {
        self.status.parse().ok()
    }

    /// Published datasets accept records; draft datasets accept schema changes.
    pub fn is_ready(&self) -> bool {
        self.get_status() == Some(DatasetStatus::Ready)
    }

    pub fn is_draft(&self) -> bool {
        self.get_status() == Some(DatasetStatus::Draft)
    }
}
