//! Schema composition and configuration admin tests.

mod common;

use anyhow::Result;

use common::setup_test_db;
use docintake::database::seed_data::create_example_config;
use docintake::errors::CoreError;
use docintake::schema::{compose_schema, compose_schema_value};
use docintake::services::admin_service::{
    self, CreateDocumentTypeRequest, CreateEntityRequest, CreateTemplateRequest,
    UpdateDocumentTypeRequest, UpdateEntityRequest,
};

fn doc_type_request(name: &str, key: &str) -> CreateDocumentTypeRequest {
    CreateDocumentTypeRequest {
        document_name: name.to_string(),
        document_backend_key: key.to_string(),
        features: None,
        is_active: true,
    }
}

fn template_request(name: &str) -> CreateTemplateRequest {
    CreateTemplateRequest {
        template_name: Some(name.to_string()),
        description: None,
        describe_document: Some("A machine readable travel document".to_string()),
        keywords: Some("passport, MRZ".to_string()),
        version: "1.0".to_string(),
        is_active: true,
    }
}

fn entity_request(name: &str, key: &str, required: bool) -> CreateEntityRequest {
    CreateEntityRequest {
        entity_name: name.to_string(),
        entity_name_for_dms: None,
        entity_key_customer_type: "Individual".to_string(),
        entity_key_rp_type: "Individual-RP".to_string(),
        entity_data_type: "AlphaNumeric".to_string(),
        backend_entity_key: key.to_string(),
        entity_description: None,
        example_value: None,
        is_required: required,
        is_active: true,
    }
}

#[tokio::test]
async fn test_composed_passport_subtree() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;

    let doc_type =
        admin_service::create_document_type(&db, doc_type_request("Passport", "passport")).await?;
    let template =
        admin_service::create_template(&db, doc_type.id, template_request("Standard v1")).await?;
    admin_service::create_entity(
        &db,
        template.id,
        entity_request("Passport Number", "passport_number", true),
    )
    .await?;

    let schema = compose_schema(&db, Some(doc_type.id)).await?;
    assert_eq!(schema.len(), 1);

    let composed = &schema[0];
    assert_eq!(composed.document_name, "Passport");
    assert_eq!(composed.document_backend_key, "passport");
    assert_eq!(composed.templates.len(), 1);

    let composed_template = &composed.templates[0];
    assert_eq!(composed_template.template_name, "Standard v1");
    assert_eq!(composed_template.version, "1.0");
    assert_eq!(composed_template.entities.len(), 1);

    let entity = &composed_template.entities[0];
    assert_eq!(entity.backend_entity_key, "passport_number");
    assert_eq!(entity.entity_data_type, "AlphaNumeric");
    assert!(entity.is_required);
    // entity_name_for_dms falls back to the display name when unset
    assert_eq!(entity.entity_name_for_dms, "Passport Number");

    Ok(())
}

#[tokio::test]
async fn test_composition_is_deterministic() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;
    create_example_config(&db).await?;

    let first = serde_json::to_string(&compose_schema_value(&db, None).await?)?;
    let second = serde_json::to_string(&compose_schema_value(&db, None).await?)?;
    assert_eq!(first, second);

    // ascending id at the top level
    let schema = compose_schema(&db, None).await?;
    assert_eq!(schema.len(), 3);
    let ids: Vec<i32> = schema.iter().map(|dt| dt.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);

    Ok(())
}

#[tokio::test]
async fn test_seed_is_idempotent() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;

    create_example_config(&db).await?;
    create_example_config(&db).await?;

    let types = admin_service::list_document_types(&db).await?;
    assert_eq!(types.len(), 3);

    let passport = types
        .iter()
        .find(|t| t.document_type.document_backend_key == "passport")
        .expect("passport seeded");
    assert_eq!(passport.templates.len(), 1);
    assert_eq!(passport.templates[0].entities.len(), 5);

    Ok(())
}

#[tokio::test]
async fn test_inactive_rows_excluded_from_schema_but_admin_visible() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;

    let doc_type =
        admin_service::create_document_type(&db, doc_type_request("Passport", "passport")).await?;
    let template =
        admin_service::create_template(&db, doc_type.id, template_request("Standard v1")).await?;
    let keep = admin_service::create_entity(
        &db,
        template.id,
        entity_request("Passport Number", "passport_number", true),
    )
    .await?;
    let retire = admin_service::create_entity(
        &db,
        template.id,
        entity_request("Old Field", "old_field", false),
    )
    .await?;

    admin_service::update_entity(
        &db,
        retire.id,
        UpdateEntityRequest {
            entity_name: None,
            entity_name_for_dms: None,
            entity_data_type: None,
            backend_entity_key: None,
            entity_description: None,
            example_value: None,
            is_required: None,
            is_active: Some(false),
        },
    )
    .await?;

    let schema = compose_schema(&db, Some(doc_type.id)).await?;
    let keys: Vec<&str> = schema[0].templates[0]
        .entities
        .iter()
        .map(|e| e.backend_entity_key.as_str())
        .collect();
    assert_eq!(keys, vec![keep.backend_entity_key.as_str()]);

    // still reachable through the admin surface
    let detail = admin_service::get_template(&db, template.id).await?;
    assert_eq!(detail.entities.len(), 2);

    // deactivating the type makes the scoped composition a miss
    admin_service::update_document_type(
        &db,
        doc_type.id,
        UpdateDocumentTypeRequest {
            document_name: None,
            features: None,
            is_active: Some(false),
        },
    )
    .await?;

    let err = compose_schema(&db, Some(doc_type.id)).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
    assert!(compose_schema(&db, None).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_missing_document_type_is_not_found() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;

    let err = compose_schema(&db, Some(404)).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn test_backend_key_uniqueness_enforced() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;

    admin_service::create_document_type(&db, doc_type_request("Passport", "passport")).await?;
    let err = admin_service::create_document_type(&db, doc_type_request("Passport 2", "passport"))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let doc_type =
        admin_service::create_document_type(&db, doc_type_request("Emirates ID", "emirates_id"))
            .await?;
    let template =
        admin_service::create_template(&db, doc_type.id, template_request("Front v1")).await?;
    admin_service::create_entity(&db, template.id, entity_request("ID Number", "id_number", true))
        .await?;
    let err = admin_service::create_entity(
        &db,
        template.id,
        entity_request("ID Number Again", "id_number", false),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn test_entity_data_type_validated() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;

    let doc_type =
        admin_service::create_document_type(&db, doc_type_request("Passport", "passport")).await?;
    let template =
        admin_service::create_template(&db, doc_type.id, template_request("Standard v1")).await?;

    let mut request = entity_request("Issue Date", "issue_date", false);
    request.entity_data_type = "Timestamp".to_string();
    let err = admin_service::create_entity(&db, template.id, request)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let mut request = entity_request("Issue Date", "issue_date", false);
    request.entity_data_type = "Date".to_string();
    let created = admin_service::create_entity(&db, template.id, request).await?;
    assert_eq!(created.entity_data_type, "Date");

    Ok(())
}

#[tokio::test]
async fn test_document_type_delete_cascades() -> Result<()> {
    let (db, _temp) = setup_test_db().await?;
    create_example_config(&db).await?;

    let types = admin_service::list_document_types(&db).await?;
    let passport = types
        .iter()
        .find(|t| t.document_type.document_backend_key == "passport")
        .expect("passport seeded");
    let template_id = passport.templates[0].template.id;

    admin_service::delete_document_type(&db, passport.document_type.id).await?;

    let err = admin_service::get_template(&db, template_id).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
    assert_eq!(admin_service::list_document_types(&db).await?.len(), 2);

    Ok(())
}
