use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::MetadataPropertySettings;

/// A metadata property definition, used both to validate record metadata at
/// ingestion time and to validate metadata filter scopes at search time.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "metadata_properties")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dataset_id: i32,
    pub name: String,
    pub title: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub settings: Json,
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
}

impl Related<super::datasets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Datasets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn parsed_settings(&self) -> Result<MetadataPropertySettings, serde_json::Error> {
        serde_json::from_value(self.settings.clone())
    }
}
