use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create workspaces table
        manager
            .create_table(
                Table::create()
                    .table(Workspaces::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Workspaces::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Workspaces::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Workspaces::InsertedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Workspaces::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::InsertedAt).timestamp().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Create datasets table
        manager
            .create_table(
                Table::create()
                    .table(Datasets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Datasets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Datasets::WorkspaceId).integer().not_null())
                    .col(ColumnDef::new(Datasets::Name).string().not_null())
                    .col(ColumnDef::new(Datasets::Guidelines).text())
                    .col(
                        ColumnDef::new(Datasets::AllowExtraMetadata)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Datasets::Status)
                            .string()
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(Datasets::InsertedAt).timestamp().not_null())
                    .col(ColumnDef::new(Datasets::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_datasets_workspace_id")
                            .from(Datasets::Table, Datasets::WorkspaceId)
                            .to(Workspaces::Table, Workspaces::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_datasets_workspace_id_name")
                    .table(Datasets::Table)
                    .col(Datasets::WorkspaceId)
                    .col(Datasets::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create fields table
        manager
            .create_table(
                Table::create()
                    .table(Fields::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Fields::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Fields::DatasetId).integer().not_null())
                    .col(ColumnDef::new(Fields::Name).string().not_null())
                    .col(ColumnDef::new(Fields::Title).string().not_null())
                    .col(
                        ColumnDef::new(Fields::Required)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Fields::Settings).json_binary().not_null())
                    .col(ColumnDef::new(Fields::InsertedAt).timestamp().not_null())
                    .col(ColumnDef::new(Fields::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fields_dataset_id")
                            .from(Fields::Table, Fields::DatasetId)
                            .to(Datasets::Table, Datasets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_fields_dataset_id_name")
                    .table(Fields::Table)
                    .col(Fields::DatasetId)
                    .col(Fields::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create questions table
        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Questions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Questions::DatasetId).integer().not_null())
                    .col(ColumnDef::new(Questions::Name).string().not_null())
                    .col(ColumnDef::new(Questions::Title).string().not_null())
                    .col(ColumnDef::new(Questions::Description).text())
                    .col(
                        ColumnDef::new(Questions::Required)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Questions::Settings).json_binary().not_null())
                    .col(ColumnDef::new(Questions::InsertedAt).timestamp().not_null())
                    .col(ColumnDef::new(Questions::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_questions_dataset_id")
                            .from(Questions::Table, Questions::DatasetId)
                            .to(Datasets::Table, Datasets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_questions_dataset_id_name")
                    .table(Questions::Table)
                    .col(Questions::DatasetId)
                    .col(Questions::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create metadata_properties table
        manager
            .create_table(
                Table::create()
                    .table(MetadataProperties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MetadataProperties::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MetadataProperties::DatasetId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MetadataProperties::Name).string().not_null())
                    .col(
                        ColumnDef::new(MetadataProperties::Title)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MetadataProperties::Settings)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MetadataProperties::InsertedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MetadataProperties::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_metadata_properties_dataset_id")
                            .from(MetadataProperties::Table, MetadataProperties::DatasetId)
                            .to(Datasets::Table, Datasets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_metadata_properties_dataset_id_name")
                    .table(MetadataProperties::Table)
                    .col(MetadataProperties::DatasetId)
                    .col(MetadataProperties::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create vector_settings table
        manager
            .create_table(
                Table::create()
                    .table(VectorSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VectorSettings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VectorSettings::DatasetId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(VectorSettings::Name).string().not_null())
                    .col(ColumnDef::new(VectorSettings::Title).string().not_null())
                    .col(
                        ColumnDef::new(VectorSettings::Dimensions)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VectorSettings::InsertedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(VectorSettings::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vector_settings_dataset_id")
                            .from(VectorSettings::Table, VectorSettings::DatasetId)
                            .to(Datasets::Table, Datasets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_vector_settings_dataset_id_name")
                    .table(VectorSettings::Table)
                    .col(VectorSettings::DatasetId)
                    .col(VectorSettings::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create records table
        manager
            .create_table(
                Table::create()
                    .table(Records::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Records::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Records::DatasetId).integer().not_null())
                    .col(ColumnDef::new(Records::Fields).json_binary().not_null())
                    .col(ColumnDef::new(Records::Metadata).json_binary())
                    .col(ColumnDef::new(Records::ExternalId).string())
                    .col(
                        ColumnDef::new(Records::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Records::InsertedAt).timestamp().not_null())
                    .col(ColumnDef::new(Records::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_records_dataset_id")
                            .from(Records::Table, Records::DatasetId)
                            .to(Datasets::Table, Datasets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_records_dataset_id_external_id")
                    .table(Records::Table)
                    .col(Records::DatasetId)
                    .col(Records::ExternalId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create responses table
        manager
            .create_table(
                Table::create()
                    .table(Responses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Responses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Responses::RecordId).integer().not_null())
                    .col(ColumnDef::new(Responses::UserId).integer().not_null())
                    .col(ColumnDef::new(Responses::Values).json_binary().not_null())
                    .col(ColumnDef::new(Responses::Status).string().not_null())
                    .col(ColumnDef::new(Responses::InsertedAt).timestamp().not_null())
                    .col(ColumnDef::new(Responses::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_responses_record_id")
                            .from(Responses::Table, Responses::RecordId)
                            .to(Records::Table, Records::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_responses_user_id")
                            .from(Responses::Table, Responses::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_responses_record_id_user_id")
                    .table(Responses::Table)
                    .col(Responses::RecordId)
                    .col(Responses::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create suggestions table
        manager
            .create_table(
                Table::create()
                    .table(Suggestions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Suggestions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Suggestions::RecordId).integer().not_null())
                    .col(ColumnDef::new(Suggestions::QuestionId).integer().not_null())
                    .col(ColumnDef::new(Suggestions::Value).json_binary().not_null())
                    .col(ColumnDef::new(Suggestions::Score).double())
                    .col(ColumnDef::new(Suggestions::Agent).string())
                    .col(ColumnDef::new(Suggestions::Kind).string())
                    .col(
                        ColumnDef::new(Suggestions::InsertedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Suggestions::UpdatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_suggestions_record_id")
                            .from(Suggestions::Table, Suggestions::RecordId)
                            .to(Records::Table, Records::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_suggestions_question_id")
                            .from(Suggestions::Table, Suggestions::QuestionId)
                            .to(Questions::Table, Questions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_suggestions_record_id_question_id")
                    .table(Suggestions::Table)
                    .col(Suggestions::RecordId)
                    .col(Suggestions::QuestionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create vectors table
        manager
            .create_table(
                Table::create()
                    .table(Vectors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vectors::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Vectors::RecordId).integer().not_null())
                    .col(
                        ColumnDef::new(Vectors::VectorSettingsId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Vectors::Value).json_binary().not_null())
                    .col(ColumnDef::new(Vectors::InsertedAt).timestamp().not_null())
                    .col(ColumnDef::new(Vectors::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vectors_record_id")
                            .from(Vectors::Table, Vectors::RecordId)
                            .to(Records::Table, Records::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vectors_vector_settings_id")
                            .from(Vectors::Table, Vectors::VectorSettingsId)
                            .to(VectorSettings::Table, VectorSettings::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_vectors_record_id_vector_settings_id")
                    .table(Vectors::Table)
                    .col(Vectors::RecordId)
                    .col(Vectors::VectorSettingsId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Vectors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Suggestions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Responses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Records::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(VectorSettings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MetadataProperties::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Fields::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Datasets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Workspaces::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Workspaces {
    Table,
    Id,
    Name,
    InsertedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    InsertedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Datasets {
    Table,
    Id,
    WorkspaceId,
    Name,
    Guidelines,
    AllowExtraMetadata,
    Status,
    InsertedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Fields {
    Table,
    Id,
    DatasetId,
    Name,
    Title,
    Required,
    Settings,
    InsertedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
    DatasetId,
    Name,
    Title,
    Description,
    Required,
    Settings,
    InsertedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MetadataProperties {
    Table,
    Id,
    DatasetId,
    Name,
    Title,
    Settings,
    InsertedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VectorSettings {
    Table,
    Id,
    DatasetId,
    Name,
    Title,
    Dimensions,
    InsertedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Records {
    Table,
    Id,
    DatasetId,
    Fields,
    Metadata,
    ExternalId,
    Status,
    InsertedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Responses {
    Table,
    Id,
    RecordId,
    UserId,
    Values,
    Status,
    InsertedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Suggestions {
    Table,
    Id,
    RecordId,
    QuestionId,
    Value,
    Score,
    Agent,
    Kind,
    InsertedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Vectors {
    Table,
    Id,
    RecordId,
    VectorSettingsId,
    Value,
    InsertedAt,
    UpdatedAt,
}
