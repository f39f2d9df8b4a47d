use anyhow::Result;
use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::database::entities::{document_types, entities, templates};

/// Seed a demo extraction configuration: three document types with one
/// template each and their entities. Safe to call repeatedly.
pub async fn create_example_config(db: &DatabaseConnection) -> Result<()> {
    let existing = document_types::Entity::find()
        .filter(document_types::Column::DocumentBackendKey.eq("passport"))
        .one(db)
        .await?;

    if existing.is_some() {
        info!("Example configuration already exists, skipping seed data creation");
        return Ok(());
    }

    info!("Creating example extraction configuration");

    let passport_id = create_document_type(
        db,
        "Passport",
        "passport",
        "Feature of passport",
    )
    .await?;
    let passport_template_id = create_template(
        db,
        passport_id,
        "Standard Passport",
        "Government-issued personal identification for travel and citizenship verification.",
        Some(
            "Purpose: Government-issued personal identification for travel and citizenship \
             verification. Key Features: Contains a photo, passport number, name, nationality, \
             issue date, expiration date, and government seals or holograms.",
        ),
        "passport",
    )
    .await?;
    create_entities(
        db,
        passport_template_id,
        &[
            (
                "Expiry date (Passport)",
                "passport_expiry_date",
                "AlphaNumeric",
                "The date on which the passport will expire.",
            ),
            (
                "Place of birth",
                "place_of_birth",
                "AlphaNumeric",
                "The place where the passport holder was born.",
            ),
            (
                "Customer Name (as per Passport)",
                "customer_name_passport",
                "Alphabet",
                "Full name exactly as it appears in the passport.",
            ),
            (
                "Date of Birth",
                "date_of_birth",
                "Date",
                "Date of birth of the passport holder.",
            ),
            (
                "Passport Document (Number)",
                "passport_number",
                "AlphaNumeric",
                "Passport number, alphanumeric, max 9 characters.",
            ),
        ],
    )
    .await?;

    let eid_id = create_document_type(db, "Emirates ID", "emirates_id", "Feature of Emirates ID")
        .await?;
    let eid_template_id = create_template(
        db,
        eid_id,
        "Standard Emirates ID",
        "UAE national identification card used for official verification.",
        None,
        "Identity Card, Resident Identity Card, Gold Card",
    )
    .await?;
    create_entities(
        db,
        eid_template_id,
        &[
            (
                "Emirates ID (Number)",
                "emirates_id_number",
                "Numeric",
                "ID number on the Emirates ID card, max 15 digits.",
            ),
            (
                "Expiry date (EID)",
                "eid_expiry_date",
                "Date",
                "Date when the Emirates ID expires.",
            ),
            (
                "Issuance date (EID)",
                "eid_issuance_date",
                "Date",
                "Date when the Emirates ID was issued.",
            ),
            (
                "Country of Residency",
                "country_of_residency",
                "Alphabet",
                "Cardholder's country of residence.",
            ),
        ],
    )
    .await?;

    let sc_id = create_document_type(
        db,
        "Salary Certificate",
        "salary_certificate",
        "Feature of Salary Certificate",
    )
    .await?;
    let sc_template_id = create_template(
        db,
        sc_id,
        "Standard Salary Certificate",
        "Proof of income issued by an employer.",
        None,
        "SC",
    )
    .await?;
    create_entities(
        db,
        sc_template_id,
        &[
            (
                "Employer Name",
                "employer_name",
                "Alphabet",
                "Name of the employer issuing the certificate.",
            ),
            (
                "Monthly Salary",
                "monthly_salary",
                "Numeric",
                "Gross monthly salary stated on the certificate.",
            ),
            (
                "Employee Name",
                "employee_name",
                "Alphabet",
                "Full name of the employee.",
            ),
        ],
    )
    .await?;

    info!("Successfully created example extraction configuration");
    Ok(())
}

async fn create_document_type(
    db: &DatabaseConnection,
    name: &str,
    backend_key: &str,
    features: &str,
) -> Result<i32> {
    let now = Utc::now();
    let model = document_types::ActiveModel {
        document_name: Set(name.to_string()),
        document_backend_key: Set(backend_key.to_string()),
        features: Set(Some(features.to_string())),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let result = document_types::Entity::insert(model).exec(db).await?;
    Ok(result.last_insert_id)
}

async fn create_template(
    db: &DatabaseConnection,
    document_type_id: i32,
    name: &str,
    description: &str,
    describe_document: Option<&str>,
    keywords: &str,
) -> Result<i32> {
    let now = Utc::now();
    let model = templates::ActiveModel {
        document_type_id: Set(document_type_id),
        template_name: Set(Some(name.to_string())),
        description: Set(Some(description.to_string())),
        describe_document: Set(describe_document.map(|s| s.to_string())),
        keywords: Set(Some(keywords.to_string())),
        version: Set("1.0".to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let result = templates::Entity::insert(model).exec(db).await?;
    Ok(result.last_insert_id)
}

async fn create_entities(
    db: &DatabaseConnection,
    template_id: i32,
    rows: &[(&str, &str, &str, &str)],
) -> Result<()> {
    let now = Utc::now();
    let models: Vec<entities::ActiveModel> = rows
        .iter()
        .map(|(name, backend_key, data_type, description)| entities::ActiveModel {
            template_id: Set(template_id),
            entity_name: Set(name.to_string()),
            entity_name_for_dms: Set(Some(name.to_string())),
            entity_key_customer_type: Set("Individual".to_string()),
            entity_key_rp_type: Set("Individual-RP".to_string()),
            entity_data_type: Set(data_type.to_string()),
            backend_entity_key: Set(backend_key.to_string()),
            entity_description: Set(Some(description.to_string())),
            example_value: Set(None),
            is_required: Set(false),
            is_active: Set(true),
            created_at: Set(now),
            ..Default::default()
        })
        .collect();

    entities::Entity::insert_many(models).exec(db).await?;
    Ok(())
}
