use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A record's embedding for one vector-settings slot. Unique per
/// (record, vector_settings); the stored array length always equals the
/// settings' dimensions.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vectors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub record_id: i32,
    pub vector_settings_id: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub value: Json,
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
        belongs_to = "super::vector_settings::Entity",
        from = "Column::VectorSettingsId",
        to = "super::vector_settings::Column::Id"
    )]
    VectorSettings,
}

impl Related<super::records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl Related<super::vector_settings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VectorSettings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Decode the stored JSON array into floats.
    pub fn as_floats(&self) -> Vec<f64> {
        self.value
            .as_array()
            .map(|values| values.iter().filter_map(|v| v.as_f64()).collect())
            .unwrap_or_default()
    }
}
