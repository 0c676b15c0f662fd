use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::common_types::ResponseStatus;

/// A user's answers for one record. Unique per (record, user); the upsert
/// key for bulk ingestion and the single-response endpoint alike.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "responses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub record_id: i32,
    pub user_id: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub values: Json,
    pub status: String, // 'draft', 'submitted', 'discarded'
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
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn get_status(&self) -> Option<ResponseStatus> {
        self.status.parse().ok()
    }

    pub fn is_submitted(&self) -> bool {
        self.get_status() == Some(ResponseStatus::Submitted)
    }
}
