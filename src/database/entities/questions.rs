use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::QuestionSettings;

/// An annotation question. The `settings` column stores the typed variant
/// (text/rating/label_selection/multi_label_selection/ranking/span) as a
/// tagged JSON object; `parsed_settings` is the single place it is resolved.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub dataset_id: i32,
    pub name: String,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
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
    #[sea_orm(has_many = "super::suggestions::Entity")]
    Suggestions,
}

impl Related<super::datasets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Datasets.def()
    }
}

impl Related<super::suggestions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Suggestions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn parsed_settings(&self) -> Result<QuestionSettings, serde_json::Error> {
        serde_json::from_value(self.settings.clone())
    }
}
