use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::common_types::RecordStatus;

/// An ingested record. `fields` must conform to the dataset's field set at
/// ingestion time; `external_id` is the primary upsert key and unique per
/// dataset; `status` is derived from the record's responses.
///
/// Related entities:
/// - `datasets`: the owning dataset
/// - `responses`, `suggestions`, `vectors`: nested children (cascade delete)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dataset_id: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub fields: Json,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,
    pub external_id: Option<String>,
    pub status: String, // 'pending', 'completed'
    pub inserted_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::datasets::Entity",
        from = "Column::DatasetId",
        to = "super::datasets::Column::Id"
    )]
    Datasets,
    #[sea_orm(has_many = "super::responses::Entity")]
    Responses,
    #[sea_orm(has_many = "super::suggestions::Entity")]
    Suggestions,
    #[sea_orm(has_many = "super::vectors::Entity")]
    Vectors,
}

impl Related<super::datasets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Datasets.def()
    }
}

impl Related<super::responses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Responses.def()
    }
}

impl Related<super::suggestions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suggestions.def()
    }
}

impl Related<super::vectors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vectors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn get_status(&self) -> Option<RecordStatus> {
        self.status.parse().ok()
    }
}
