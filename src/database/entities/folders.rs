use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "folders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub document_type_id: Option<i32>,
    pub status: String,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::document_types::Entity",
        from = "Column::DocumentTypeId",
        to = "super::document_types::Column::Id"
    )]
    DocumentTypes,
    #[sea_orm(has_many = "super::files::Entity")]
    Files,
}

impl Related<super::document_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DocumentTypes.def()
    }
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Folder processing lifecycle. Transitions are totally ordered per folder:
/// pending -> processing -> {completed, failed}; terminal states may re-enter
/// processing on a re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FolderStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl FolderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderStatus::Pending => "pending",
            FolderStatus::Processing => "processing",
            FolderStatus::Completed => "completed",
            FolderStatus::Failed => "failed",
        }
    }

    /// Legal edges of the lifecycle state machine.
    pub fn can_transition_to(&self, next: FolderStatus) -> bool {
        matches!(
            (self, next),
            (FolderStatus::Pending, FolderStatus::Processing)
                | (FolderStatus::Processing, FolderStatus::Completed)
                | (FolderStatus::Processing, FolderStatus::Failed)
                | (FolderStatus::Completed, FolderStatus::Processing)
                | (FolderStatus::Failed, FolderStatus::Processing)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FolderStatus::Completed | FolderStatus::Failed)
    }
}

impl From<FolderStatus> for String {
    fn from(status: FolderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl From<String> for FolderStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "processing" => FolderStatus::Processing,
            "completed" => FolderStatus::Completed,
            "failed" => FolderStatus::Failed,
            _ => FolderStatus::Pending,
        }
    }
}

impl Model {
    pub fn get_status(&self) -> FolderStatus {
        FolderStatus::from(self.status.clone())
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.get_status(), FolderStatus::Processing)
    }
}
