//! Read-only view of the declared schema: tables, columns, keys and rules.

use crate::api::AppState;
use crate::schema::Schema;
use axum::{extract::State, Json};

pub async fn get_schema(State(state): State<AppState>) -> Json<Schema> {
    Json(state.schema.as_ref().clone())
}
