use chrono::Utc;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::entities::{
    document_types, entities, entities::EntityDataType, templates,
};
use crate::errors::{CoreError, CoreResult};

#[derive(Debug, Deserialize)]
pub struct CreateDocumentTypeRequest {
    pub document_name: String,
    pub document_backend_key: String,
    pub features: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentTypeRequest {
    pub document_name: Option<String>,
    pub features: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub template_name: Option<String>,
    pub description: Option<String>,
    pub describe_document: Option<String>,
    pub keywords: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTemplateRequest {
    pub template_name: Option<String>,
    pub description: Option<String>,
    pub describe_document: Option<String>,
    pub keywords: Option<String>,
    pub version: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntityRequest {
    pub entity_name: String,
    pub entity_name_for_dms: Option<String>,
    #[serde(default = "default_customer_type")]
    pub entity_key_customer_type: String,
    #[serde(default = "default_rp_type")]
    pub entity_key_rp_type: String,
    #[serde(default = "default_data_type")]
    pub entity_data_type: String,
    pub backend_entity_key: String,
    pub entity_description: Option<String>,
    pub example_value: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEntityRequest {
    pub entity_name: Option<String>,
    pub entity_name_for_dms: Option<String>,
    pub entity_data_type: Option<String>,
    pub backend_entity_key: Option<String>,
    pub entity_description: Option<String>,
    pub example_value: Option<String>,
    pub is_required: Option<bool>,
    pub is_active: Option<bool>,
}

/// DocumentType with its full subtree; inactive children are included here
/// even though schema composition excludes them.
#[derive(Debug, Serialize)]
pub struct DocumentTypeDetail {
    #[serde(flatten)]
    pub document_type: document_types::Model,
    pub templates: Vec<TemplateDetail>,
}

#[derive(Debug, Serialize)]
pub struct TemplateDetail {
    #[serde(flatten)]
    pub template: templates::Model,
    pub entities: Vec<entities::Model>,
}

fn default_true() -> bool {
    true
}
fn default_version() -> String {
    "1.0".to_string()
}
fn default_customer_type() -> String {
    "Individual".to_string()
}
fn default_rp_type() -> String {
    "Individual-RP".to_string()
}
fn default_data_type() -> String {
    EntityDataType::AlphaNumeric.as_str().to_string()
}

pub async fn list_document_types(db: &DatabaseConnection) -> CoreResult<Vec<DocumentTypeDetail>> {
    let rows = document_types::Entity::find()
        .order_by_asc(document_types::Column::Id)
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        result.push(document_type_detail(db, row).await?);
    }
    Ok(result)
}

pub async fn create_document_type(
    db: &DatabaseConnection,
    request: CreateDocumentTypeRequest,
) -> CoreResult<document_types::Model> {
    if request.document_name.trim().is_empty() {
        return Err(CoreError::Validation("document_name must not be empty".into()));
    }
    if request.document_backend_key.trim().is_empty() {
        return Err(CoreError::Validation(
            "document_backend_key must not be empty".into(),
        ));
    }

    let existing = document_types::Entity::find()
        .filter(document_types::Column::DocumentBackendKey.eq(request.document_backend_key.clone()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(CoreError::Validation(format!(
            "backend key already exists: {}",
            request.document_backend_key
        )));
    }

    let now = Utc::now();
    let model = document_types::ActiveModel {
        document_name: Set(request.document_name),
        document_backend_key: Set(request.document_backend_key),
        features: Set(request.features),
        is_active: Set(request.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn get_document_type(
    db: &DatabaseConnection,
    id: i32,
) -> CoreResult<DocumentTypeDetail> {
    let row = document_types::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("document type {}", id)))?;
    document_type_detail(db, row).await
}

/// Update a document type. `document_backend_key` is immutable after
/// creation; the request shape has no field for it.
pub async fn update_document_type(
    db: &DatabaseConnection,
    id: i32,
    request: UpdateDocumentTypeRequest,
) -> CoreResult<document_types::Model> {
    let row = document_types::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("document type {}", id)))?;

    let mut update: document_types::ActiveModel = row.into();
    if let Some(name) = request.document_name {
        if name.trim().is_empty() {
            return Err(CoreError::Validation("document_name must not be empty".into()));
        }
        update.document_name = Set(name);
    }
    if let Some(features) = request.features {
        update.features = Set(Some(features));
    }
    if let Some(is_active) = request.is_active {
        update.is_active = Set(is_active);
    }
    update.updated_at = Set(Utc::now());
    Ok(update.update(db).await?)
}

/// Delete a document type with all descendant templates and entities in
/// one transaction; readers never observe a partially deleted subtree.
pub async fn delete_document_type(db: &DatabaseConnection, id: i32) -> CoreResult<()> {
    document_types::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("document type {}", id)))?;

    db.transaction::<_, (), CoreError>(move |txn| {
        Box::pin(async move {
            let template_ids: Vec<i32> = templates::Entity::find()
                .filter(templates::Column::DocumentTypeId.eq(id))
                .all(txn)
                .await?
                .into_iter()
                .map(|t| t.id)
                .collect();

            if !template_ids.is_empty() {
                entities::Entity::delete_many()
                    .filter(entities::Column::TemplateId.is_in(template_ids))
                    .exec(txn)
                    .await?;
                templates::Entity::delete_many()
                    .filter(templates::Column::DocumentTypeId.eq(id))
                    .exec(txn)
                    .await?;
            }
            document_types::Entity::delete_by_id(id).exec(txn).await?;
            Ok(())
        })
    })
    .await
    .map_err(unwrap_txn_err)?;

    info!("Deleted document type {} with its templates and entities", id);
    Ok(())
}

pub async fn list_templates(
    db: &DatabaseConnection,
    document_type_id: i32,
) -> CoreResult<Vec<TemplateDetail>> {
    document_types::Entity::find_by_id(document_type_id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("document type {}", document_type_id)))?;

    let rows = templates::Entity::find()
        .filter(templates::Column::DocumentTypeId.eq(document_type_id))
        .order_by_asc(templates::Column::Id)
        .all(db)
        .await?;

    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        result.push(template_detail(db, row).await?);
    }
    Ok(result)
}

pub async fn create_template(
    db: &DatabaseConnection,
    document_type_id: i32,
    request: CreateTemplateRequest,
) -> CoreResult<templates::Model> {
    document_types::Entity::find_by_id(document_type_id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("document type {}", document_type_id)))?;

    let now = Utc::now();
    let model = templates::ActiveModel {
        document_type_id: Set(document_type_id),
        template_name: Set(request.template_name),
        description: Set(request.description),
        describe_document: Set(request.describe_document),
        keywords: Set(request.keywords),
        version: Set(request.version),
        is_active: Set(request.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn get_template(db: &DatabaseConnection, id: i32) -> CoreResult<TemplateDetail> {
    let row = templates::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("template {}", id)))?;
    template_detail(db, row).await
}

pub async fn update_template(
    db: &DatabaseConnection,
    id: i32,
    request: UpdateTemplateRequest,
) -> CoreResult<templates::Model> {
    let row = templates::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("template {}", id)))?;

    let mut update: templates::ActiveModel = row.into();
    if let Some(name) = request.template_name {
        update.template_name = Set(Some(name));
    }
    if let Some(description) = request.description {
        update.description = Set(Some(description));
    }
    if let Some(describe) = request.describe_document {
        update.describe_document = Set(Some(describe));
    }
    if let Some(keywords) = request.keywords {
        update.keywords = Set(Some(keywords));
    }
    if let Some(version) = request.version {
        update.version = Set(version);
    }
    if let Some(is_active) = request.is_active {
        update.is_active = Set(is_active);
    }
    update.updated_at = Set(Utc::now());
    Ok(update.update(db).await?)
}

pub async fn delete_template(db: &DatabaseConnection, id: i32) -> CoreResult<()> {
    templates::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("template {}", id)))?;

    db.transaction::<_, (), CoreError>(move |txn| {
        Box::pin(async move {
            entities::Entity::delete_many()
                .filter(entities::Column::TemplateId.eq(id))
                .exec(txn)
                .await?;
            templates::Entity::delete_by_id(id).exec(txn).await?;
            Ok(())
        })
    })
    .await
    .map_err(unwrap_txn_err)?;
    Ok(())
}

pub async fn list_entities(
    db: &DatabaseConnection,
    template_id: i32,
) -> CoreResult<Vec<entities::Model>> {
    templates::Entity::find_by_id(template_id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("template {}", template_id)))?;

    entities::Entity::find()
        .filter(entities::Column::TemplateId.eq(template_id))
        .order_by_asc(entities::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn create_entity(
    db: &DatabaseConnection,
    template_id: i32,
    request: CreateEntityRequest,
) -> CoreResult<entities::Model> {
    templates::Entity::find_by_id(template_id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("template {}", template_id)))?;

    if request.entity_name.trim().is_empty() {
        return Err(CoreError::Validation("entity_name must not be empty".into()));
    }
    let data_type = EntityDataType::parse(&request.entity_data_type).ok_or_else(|| {
        CoreError::Validation(format!(
            "unknown entity_data_type: {}",
            request.entity_data_type
        ))
    })?;
    ensure_backend_key_free(db, template_id, &request.backend_entity_key, None).await?;

    let model = entities::ActiveModel {
        template_id: Set(template_id),
        entity_name: Set(request.entity_name),
        entity_name_for_dms: Set(request.entity_name_for_dms),
        entity_key_customer_type: Set(request.entity_key_customer_type),
        entity_key_rp_type: Set(request.entity_key_rp_type),
        entity_data_type: Set(data_type.into()),
        backend_entity_key: Set(request.backend_entity_key),
        entity_description: Set(request.entity_description),
        example_value: Set(request.example_value),
        is_required: Set(request.is_required),
        is_active: Set(request.is_active),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

pub async fn update_entity(
    db: &DatabaseConnection,
    id: i32,
    request: UpdateEntityRequest,
) -> CoreResult<entities::Model> {
    let row = entities::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("entity {}", id)))?;
    let template_id = row.template_id;

    let mut update: entities::ActiveModel = row.into();
    if let Some(name) = request.entity_name {
        if name.trim().is_empty() {
            return Err(CoreError::Validation("entity_name must not be empty".into()));
        }
        update.entity_name = Set(name);
    }
    if let Some(dms) = request.entity_name_for_dms {
        update.entity_name_for_dms = Set(Some(dms));
    }
    if let Some(data_type) = request.entity_data_type {
        let parsed = EntityDataType::parse(&data_type).ok_or_else(|| {
            CoreError::Validation(format!("unknown entity_data_type: {}", data_type))
        })?;
        update.entity_data_type = Set(parsed.into());
    }
    if let Some(backend_key) = request.backend_entity_key {
        ensure_backend_key_free(db, template_id, &backend_key, Some(id)).await?;
        update.backend_entity_key = Set(backend_key);
    }
    if let Some(description) = request.entity_description {
        update.entity_description = Set(Some(description));
    }
    if let Some(example) = request.example_value {
        update.example_value = Set(Some(example));
    }
    if let Some(is_required) = request.is_required {
        update.is_required = Set(is_required);
    }
    if let Some(is_active) = request.is_active {
        update.is_active = Set(is_active);
    }
    Ok(update.update(db).await?)
}

pub async fn delete_entity(db: &DatabaseConnection, id: i32) -> CoreResult<()> {
    let result = entities::Entity::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(CoreError::NotFound(format!("entity {}", id)));
    }
    Ok(())
}

async fn ensure_backend_key_free(
    db: &DatabaseConnection,
    template_id: i32,
    backend_key: &str,
    exclude_id: Option<i32>,
) -> CoreResult<()> {
    if backend_key.trim().is_empty() {
        return Err(CoreError::Validation(
            "backend_entity_key must not be empty".into(),
        ));
    }
    let mut query = entities::Entity::find()
        .filter(entities::Column::TemplateId.eq(template_id))
        .filter(entities::Column::BackendEntityKey.eq(backend_key));
    if let Some(id) = exclude_id {
        query = query.filter(entities::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(CoreError::Validation(format!(
            "backend_entity_key already exists in template: {}",
            backend_key
        )));
    }
    Ok(())
}

async fn document_type_detail(
    db: &DatabaseConnection,
    row: document_types::Model,
) -> CoreResult<DocumentTypeDetail> {
    let template_rows = templates::Entity::find()
        .filter(templates::Column::DocumentTypeId.eq(row.id))
        .order_by_asc(templates::Column::Id)
        .all(db)
        .await?;

    let mut template_details = Vec::with_capacity(template_rows.len());
    for template in template_rows {
        template_details.push(template_detail(db, template).await?);
    }

    Ok(DocumentTypeDetail {
        document_type: row,
        templates: template_details,
    })
}

async fn template_detail(
    db: &DatabaseConnection,
    row: templates::Model,
) -> CoreResult<TemplateDetail> {
    let entity_rows = entities::Entity::find()
        .filter(entities::Column::TemplateId.eq(row.id))
        .order_by_asc(entities::Column::Id)
        .all(db)
        .await?;
    Ok(TemplateDetail {
        template: row,
        entities: entity_rows,
    })
}

fn unwrap_txn_err(err: TransactionError<CoreError>) -> CoreError {
    match err {
        TransactionError::Connection(e) => CoreError::Database(e),
        TransactionError::Transaction(e) => e,
    }
}
