use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentTypes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DocumentTypes::DocumentName).text().not_null())
                    .col(
                        ColumnDef::new(DocumentTypes::DocumentBackendKey)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(DocumentTypes::Features).text())
                    .col(
                        ColumnDef::new(DocumentTypes::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(DocumentTypes::CreatedAt).text().not_null())
                    .col(ColumnDef::new(DocumentTypes::UpdatedAt).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Templates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Templates::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Templates::DocumentTypeId).integer().not_null())
                    .col(ColumnDef::new(Templates::TemplateName).text())
                    .col(ColumnDef::new(Templates::Description).text())
                    .col(ColumnDef::new(Templates::DescribeDocument).text())
                    .col(ColumnDef::new(Templates::Keywords).text())
                    .col(
                        ColumnDef::new(Templates::Version)
                            .text()
                            .not_null()
                            .default("1.0"),
                    )
                    .col(
                        ColumnDef::new(Templates::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Templates::CreatedAt).text().not_null())
                    .col(ColumnDef::new(Templates::UpdatedAt).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_templates_document_type_id")
                            .from(Templates::Table, Templates::DocumentTypeId)
                            .to(DocumentTypes::Table, DocumentTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Entities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Entities::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Entities::TemplateId).integer().not_null())
                    .col(ColumnDef::new(Entities::EntityName).text().not_null())
                    .col(ColumnDef::new(Entities::EntityNameForDms).text())
                    .col(
                        ColumnDef::new(Entities::EntityKeyCustomerType)
                            .text()
                            .not_null()
                            .default("Individual"),
                    )
                    .col(
                        ColumnDef::new(Entities::EntityKeyRpType)
                            .text()
                            .not_null()
                            .default("Individual-RP"),
                    )
                    .col(
                        ColumnDef::new(Entities::EntityDataType)
                            .text()
                            .not_null()
                            .default("AlphaNumeric"),
                    )
                    .col(ColumnDef::new(Entities::BackendEntityKey).text().not_null())
                    .col(ColumnDef::new(Entities::EntityDescription).text())
                    .col(ColumnDef::new(Entities::ExampleValue).text())
                    .col(
                        ColumnDef::new(Entities::IsRequired)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Entities::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Entities::CreatedAt).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entities_template_id")
                            .from(Entities::Table, Entities::TemplateId)
                            .to(Templates::Table, Templates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Folders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Folders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Folders::Name).text().not_null())
                    .col(ColumnDef::new(Folders::DocumentTypeId).integer())
                    .col(
                        ColumnDef::new(Folders::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Folders::CreatedAt).text().not_null())
                    .col(ColumnDef::new(Folders::UpdatedAt).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_folders_document_type_id")
                            .from(Folders::Table, Folders::DocumentTypeId)
                            .to(DocumentTypes::Table, DocumentTypes::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Files::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Files::FolderId).integer().not_null())
                    .col(ColumnDef::new(Files::OriginalFilename).text().not_null())
                    .col(ColumnDef::new(Files::FileType).text().not_null())
                    .col(ColumnDef::new(Files::StorageKey).text().not_null().unique_key())
                    .col(ColumnDef::new(Files::FileSize).big_integer().not_null())
                    .col(ColumnDef::new(Files::CreatedAt).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_files_folder_id")
                            .from(Files::Table, Files::FolderId)
                            .to(Folders::Table, Folders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProcessingResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProcessingResults::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProcessingResults::FolderId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ProcessingResults::RunId).text().not_null())
                    .col(ColumnDef::new(ProcessingResults::Payload).text().not_null())
                    .col(ColumnDef::new(ProcessingResults::CreatedAt).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_processing_results_folder_id")
                            .from(ProcessingResults::Table, ProcessingResults::FolderId)
                            .to(Folders::Table, Folders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_templates_document_type_id")
                    .table(Templates::Table)
                    .col(Templates::DocumentTypeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_entities_template_id")
                    .table(Entities::Table)
                    .col(Entities::TemplateId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_files_folder_id")
                    .table(Files::Table)
                    .col(Files::FolderId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProcessingResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Files::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Folders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Templates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DocumentTypes::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum DocumentTypes {
    Table,
    Id,
    DocumentName,
    DocumentBackendKey,
    Features,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Templates {
    Table,
    Id,
    DocumentTypeId,
    TemplateName,
    Description,
    DescribeDocument,
    Keywords,
    Version,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Entities {
    Table,
    Id,
    TemplateId,
    EntityName,
    EntityNameForDms,
    EntityKeyCustomerType,
    EntityKeyRpType,
    EntityDataType,
    BackendEntityKey,
    EntityDescription,
    ExampleValue,
    IsRequired,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Folders {
    Table,
    Id,
    Name,
    DocumentTypeId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
    FolderId,
    OriginalFilename,
    FileType,
    StorageKey,
    FileSize,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProcessingResults {
    Table,
    Id,
    FolderId,
    RunId,
    Payload,
    CreatedAt,
}
