use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::Value;

use crate::errors::CoreError;
use crate::schema::compose_schema_value;
use crate::server::app::AppState;

/// The composed document returned here is byte-identical to the payload the
/// orchestrator sends to the extraction backend.
pub async fn get_full_schema(State(state): State<AppState>) -> Result<Json<Value>, CoreError> {
    let schema = compose_schema_value(&state.db, None).await?;
    Ok(Json(schema))
}

pub async fn get_schema_subtree(
    State(state): State<AppState>,
    Path(document_type_id): Path<i32>,
) -> Result<Json<Value>, CoreError> {
    let schema = compose_schema_value(&state.db, Some(document_type_id)).await?;
    Ok(Json(schema))
}
