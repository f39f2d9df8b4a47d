use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::entities::{document_types, entities, templates};
use crate::errors::{CoreError, CoreResult};

/// Entity record as exposed in the composed extraction contract. These are
/// the exact fields the backend prompt is built from; nothing else leaks in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntity {
    pub entity_name: String,
    pub entity_name_for_dms: String,
    pub backend_entity_key: String,
    pub entity_data_type: String,
    pub entity_description: String,
    pub example_value: String,
    pub is_required: bool,
    pub entity_key_customer_type: String,
    pub entity_key_rp_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaTemplate {
    pub template_id: i32,
    pub template_name: String,
    pub describe_document: String,
    pub keywords: String,
    pub version: String,
    pub entities: Vec<SchemaEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocumentType {
    pub id: i32,
    pub document_name: String,
    pub document_backend_key: String,
    pub features: String,
    pub templates: Vec<SchemaTemplate>,
}

/// Compose the extraction schema from the active configuration.
///
/// With `document_type_id` set, only that subtree is returned; a missing or
/// inactive type is NotFound, because the composed contract only ever
/// carries active configuration. Ordering is ascending id at every level,
/// so two calls against unchanged state serialize byte-identically.
pub async fn compose_schema(
    db: &DatabaseConnection,
    document_type_id: Option<i32>,
) -> CoreResult<Vec<SchemaDocumentType>> {
    let doc_types = match document_type_id {
        Some(id) => {
            let doc_type = document_types::Entity::find_by_id(id)
                .one(db)
                .await?
                .filter(|dt| dt.is_active)
                .ok_or_else(|| CoreError::NotFound(format!("document type {}", id)))?;
            vec![doc_type]
        }
        None => {
            document_types::Entity::find()
                .filter(document_types::Column::IsActive.eq(true))
                .order_by_asc(document_types::Column::Id)
                .all(db)
                .await?
        }
    };

    let mut composed = Vec::with_capacity(doc_types.len());
    for doc_type in doc_types {
        let template_rows = templates::Entity::find()
            .filter(templates::Column::DocumentTypeId.eq(doc_type.id))
            .filter(templates::Column::IsActive.eq(true))
            .order_by_asc(templates::Column::Id)
            .all(db)
            .await?;

        let mut template_docs = Vec::with_capacity(template_rows.len());
        for template in template_rows {
            let entity_rows = entities::Entity::find()
                .filter(entities::Column::TemplateId.eq(template.id))
                .filter(entities::Column::IsActive.eq(true))
                .order_by_asc(entities::Column::Id)
                .all(db)
                .await?;

            template_docs.push(SchemaTemplate {
                template_id: template.id,
                template_name: template.template_name.unwrap_or_default(),
                describe_document: template.describe_document.unwrap_or_default(),
                keywords: template.keywords.unwrap_or_default(),
                version: template.version,
                entities: entity_rows.into_iter().map(schema_entity).collect(),
            });
        }

        composed.push(SchemaDocumentType {
            id: doc_type.id,
            document_name: doc_type.document_name,
            document_backend_key: doc_type.document_backend_key,
            features: doc_type.features.unwrap_or_default(),
            templates: template_docs,
        });
    }

    Ok(composed)
}

/// The composed schema as the literal JSON value sent to the backend. The
/// preview endpoint and the orchestrator both go through here, so what the
/// console shows is the payload that ships.
pub async fn compose_schema_value(
    db: &DatabaseConnection,
    document_type_id: Option<i32>,
) -> CoreResult<Value> {
    let composed = compose_schema(db, document_type_id).await?;
    serde_json::to_value(&composed)
        .map_err(|e| CoreError::Validation(format!("schema serialization failed: {}", e)))
}

fn schema_entity(model: entities::Model) -> SchemaEntity {
    SchemaEntity {
        entity_name_for_dms: model
            .entity_name_for_dms
            .unwrap_or_else(|| model.entity_name.clone()),
        entity_name: model.entity_name,
        backend_entity_key: model.backend_entity_key,
        entity_data_type: model.entity_data_type,
        entity_description: model.entity_description.unwrap_or_default(),
        example_value: model.example_value.unwrap_or_default(),
        is_required: model.is_required,
        entity_key_customer_type: model.entity_key_customer_type,
        entity_key_rp_type: model.entity_key_rp_type,
    }
}
