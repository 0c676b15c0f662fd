use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::FieldSettings;

/// A record field definition. Field types are immutable once created; there
/// is no type-change operation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fields")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dataset_id: i32,
    pub name: String,
    pub title: String,
    pub required: bool,
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
    pub fn parsed_settings(&self) -> Result<FieldSettings, serde_json::Error> {
        serde_json::from_value(self.settings.clone())
    }
}
