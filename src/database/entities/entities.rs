use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "entities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub template_id: i32,
    pub entity_name: String,
    pub entity_name_for_dms: Option<String>,
    pub entity_key_customer_type: String,
    pub entity_key_rp_type: String,
    pub entity_data_type: String,
    /// Unique within the owning template.
    pub backend_entity_key: String,
    /// Prompt text instructing the backend how to extract this field.
    pub entity_description: Option<String>,
    pub example_value: Option<String>,
    pub is_required: bool,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::templates::Entity",
        from = "Column::TemplateId",
        to = "super::templates::Column::Id"
    )]
    Templates,
}

impl Related<super::templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Templates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityDataType {
    Alphabet,
    AlphaNumeric,
    Numeric,
    Date,
    Boolean,
    Text,
}

impl EntityDataType {
    /// Strict parse used at create/update validation time.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Alphabet" => Some(EntityDataType::Alphabet),
            "AlphaNumeric" => Some(EntityDataType::AlphaNumeric),
            "Numeric" => Some(EntityDataType::Numeric),
            "Date" => Some(EntityDataType::Date),
            "Boolean" => Some(EntityDataType::Boolean),
            "Text" => Some(EntityDataType::Text),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityDataType::Alphabet => "Alphabet",
            EntityDataType::AlphaNumeric => "AlphaNumeric",
            EntityDataType::Numeric => "Numeric",
            EntityDataType::Date => "Date",
            EntityDataType::Boolean => "Boolean",
            EntityDataType::Text => "Text",
        }
    }
}

impl From<EntityDataType> for String {
    fn from(value: EntityDataType) -> Self {
        value.as_str().to_string()
    }
}
