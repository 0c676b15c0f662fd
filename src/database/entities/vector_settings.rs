use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Vector embedding settings: a named slot with fixed dimensionality.
/// Per-record vector payloads must match `dimensions` exactly.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vector_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dataset_id: i32,
    pub name: String,
    pub title: String,
    pub dimensions: i32,
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
    #[sea_orm(has_many = "super::vectors::Entity")]
    Vectors,
}

impl Related<super::datasets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Datasets.def()
    }
}

impl Related<super::vectors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vectors.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
