use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::common_types::SuggestionKind;

/// A model (or human pre-annotation) suggestion for one question on one
/// record. Unique per (record, question); repeat bulk calls overwrite.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "suggestions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub record_id: i32,
    pub question_id: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub value: Json,
    pub score: Option<f64>,
    pub agent: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>, // 'model', 'human'
    pub inserted_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::records::Entity",
        from = "Column::RecordId",
        to = "super::records::Column::Id"
    )]
    Records,
    #[sea_orm(
        belongs_to = "super::questions::Entity",
        from = "Column::QuestionId",
        to = "super::questions::Column::Id"
    )]
    Questions,
}

impl Related<super::records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn get_kind(&self) -> Option<SuggestionKind> {
        self.kind.as_deref().and_then(|kind| kind.parse().ok())
    }
}
